//! Projection of session state onto what the terminal shows.

use std::fmt;

use super::state::{ChatRole, Operation, Phase, Session};
use super::timer::{format_elapsed, TimerReading};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub role: ChatRole,
    pub text: String,
    pub pending: bool,
}

/// Everything a surface needs to draw the session. Built only by
/// [`SessionView::project`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub status: String,
    pub api_status: &'static str,
    pub meeting: Option<String>,
    pub candidate: Option<String>,
    pub can_record: bool,
    pub can_stop: bool,
    pub can_upload: bool,
    pub can_generate_notes: bool,
    pub can_chat: bool,
    pub can_download: bool,
    pub notes: Vec<String>,
    pub chat: Vec<ChatLine>,
}

impl SessionView {
    pub fn project(session: &Session, timer: Option<TimerReading>) -> Self {
        let busy = session.busy();
        let interactive = session.is_interactive();
        let creating = busy.contains(Operation::Upload) || busy.contains(Operation::Recording);

        let status = match session.phase() {
            Phase::Idle => "Status: Idle".to_string(),
            Phase::Recording => match timer {
                Some(reading) => format!(
                    "Status: Recording... {} (since {})",
                    format_elapsed(reading.elapsed_seconds),
                    reading.started_label()
                ),
                None => "Status: Recording...".to_string(),
            },
            Phase::UploadingFile => "Status: Uploading & processing...".to_string(),
            Phase::ProcessingRecording => "Status: Processing...".to_string(),
            Phase::Ready => "Status: Ready".to_string(),
            Phase::Failed => format!(
                "Status: {}",
                session.last_error().unwrap_or("Operation failed.")
            ),
        };

        let meeting = session.active_meeting_id().map(|id| match session.meeting_name() {
            Some(name) if !name.trim().is_empty() => format!("{} ({})", name, id),
            _ => id.to_string(),
        });

        let candidate = session.candidate_file().map(|file| {
            format!("{} ({:.1} MB)", file.display_name(), file.size_mb())
        });

        Self {
            status,
            api_status: if interactive { "API: Ready" } else { "API: Waiting" },
            meeting,
            candidate,
            can_record: !session.phase().is_creating() && !busy.contains(Operation::Recording),
            can_stop: session.phase() == Phase::Recording && !busy.contains(Operation::Recording),
            can_upload: session.candidate_file().is_some() && !creating,
            can_generate_notes: interactive && !busy.contains(Operation::Notes),
            can_chat: interactive && !busy.contains(Operation::Chat) && !session.has_pending_chat(),
            can_download: interactive && !busy.contains(Operation::Download),
            notes: session.note_lines().into_iter().map(String::from).collect(),
            chat: session
                .chat_log()
                .iter()
                .map(|entry| ChatLine {
                    role: entry.role,
                    text: entry.text.clone(),
                    pending: entry.pending,
                })
                .collect(),
        }
    }
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} | {}", self.status, self.api_status)?;
        if let Some(meeting) = &self.meeting {
            writeln!(f, "Meeting: {}", meeting)?;
        }
        if let Some(candidate) = &self.candidate {
            writeln!(f, "Selected file: {}", candidate)?;
        }

        if !self.notes.is_empty() {
            writeln!(f, "\n--- Highlights ---")?;
            for line in &self.notes {
                writeln!(f, "{}", line)?;
            }
        }

        if !self.chat.is_empty() {
            writeln!(f, "\n--- Chat ---")?;
            for line in &self.chat {
                let speaker = match line.role {
                    ChatRole::User => "You",
                    ChatRole::Assistant => "Assistant",
                };
                writeln!(f, "{}: {}", speaker, line.text)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MeetingId;
    use crate::session::state::CandidateFile;
    use chrono::{Local, TimeZone, Utc};
    use std::path::PathBuf;

    #[test]
    fn test_idle_view_is_locked() {
        let view = SessionView::project(&Session::default(), None);
        assert_eq!(view.status, "Status: Idle");
        assert_eq!(view.api_status, "API: Waiting");
        assert!(view.can_record);
        assert!(!view.can_stop);
        assert!(!view.can_upload);
        assert!(!view.can_chat);
        assert!(!view.can_generate_notes);
        assert!(!view.can_download);
    }

    #[test]
    fn test_recording_view_shows_elapsed() {
        let mut session = Session::default();
        session.phase = Phase::Recording;

        let started_at = Utc.with_ymd_and_hms(2026, 3, 2, 14, 3, 22).unwrap();
        let reading = TimerReading {
            started_at,
            elapsed_seconds: 65,
        };

        let view = SessionView::project(&session, Some(reading));
        let since = started_at.with_timezone(&Local).format("%H:%M:%S").to_string();
        assert_eq!(view.status, format!("Status: Recording... 01:05 (since {})", since));
        assert!(view.can_stop);
        assert!(!view.can_record);
        assert!(!view.can_chat);
    }

    #[test]
    fn test_ready_view_unlocks_meeting_commands() {
        let mut session = Session::default();
        session.activate(MeetingId::from("m1"), Some("Standup".to_string()));
        session.notes = Some("A\n\nB".to_string());

        let view = SessionView::project(&session, None);
        assert_eq!(view.api_status, "API: Ready");
        assert_eq!(view.meeting.as_deref(), Some("Standup (m1)"));

        session.activate(MeetingId::from("m2"), Some(String::new()));
        let view = SessionView::project(&session, None);
        assert_eq!(view.meeting.as_deref(), Some("m2"));
        assert!(view.can_chat && view.can_generate_notes && view.can_download);
        assert_eq!(view.notes, vec!["A", "B"]);
    }

    #[test]
    fn test_pending_chat_disables_input() {
        let mut session = Session::default();
        session.activate(MeetingId::from("m1"), None);
        session.push_chat(ChatRole::User, "q", false);
        session.push_chat(ChatRole::Assistant, "Thinking...", true);

        let view = SessionView::project(&session, None);
        assert!(!view.can_chat);
        assert!(view.chat[1].pending);
        assert!(view.to_string().contains("Assistant: Thinking..."));
    }

    #[test]
    fn test_upload_allowed_while_recording() {
        let mut session = Session::default();
        session.phase = Phase::Recording;
        session.candidate_file = Some(CandidateFile {
            path: PathBuf::from("/tmp/call.mp3"),
            size_bytes: 2048,
        });
        assert!(SessionView::project(&session, None).can_upload);

        session.busy.acquire(Operation::Recording);
        assert!(!SessionView::project(&session, None).can_upload);
    }

    #[test]
    fn test_failed_view_shows_last_error() {
        let mut session = Session::default();
        session.fail("Upload failed.");

        let view = SessionView::project(&session, None);
        assert_eq!(view.status, "Status: Upload failed.");
        assert_eq!(view.api_status, "API: Waiting");
    }
}
