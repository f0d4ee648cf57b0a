//! Session record and the types it is built from.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::remote::{MeetingId, MeetingSummary};

/// Placeholder text of an assistant entry that is waiting for its answer.
pub const PENDING_ANSWER: &str = "Thinking...";
pub const CHAT_FAILED: &str = "Chat failed.";
pub const NO_ANSWER: &str = "No response.";
pub const NOTES_FAILED: &str = "Failed to generate notes.";
pub const NO_NOTES: &str = "No notes returned.";

/// Stage of the active meeting's lifecycle as tracked by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Recording,
    UploadingFile,
    ProcessingRecording,
    Ready,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::UploadingFile => "uploading_file",
            Self::ProcessingRecording => "processing_recording",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// A meeting is being created; its outcome will replace the active meeting.
    pub fn is_creating(&self) -> bool {
        matches!(
            self,
            Self::Recording | Self::UploadingFile | Self::ProcessingRecording
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations guarded by a busy flag while their remote call is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Recording,
    Upload,
    Notes,
    Chat,
    History,
    Download,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Upload => "upload",
            Self::Notes => "notes generation",
            Self::Chat => "chat",
            Self::History => "history refresh",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BusyFlags {
    active: HashSet<Operation>,
}

impl BusyFlags {
    pub fn contains(&self, op: Operation) -> bool {
        self.active.contains(&op)
    }

    /// Returns false when `op` was already busy.
    pub(super) fn acquire(&mut self, op: Operation) -> bool {
        self.active.insert(op)
    }

    pub(super) fn release(&mut self, op: Operation) {
        self.active.remove(&op);
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub(super) id: u64,
    pub text: String,
    pub role: ChatRole,
    pub pending: bool,
}

/// File chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl CandidateFile {
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }
}

/// The client's view of the current meeting. Owned by one
/// [`SessionController`](super::SessionController); read via snapshots.
#[derive(Debug, Clone)]
pub struct Session {
    pub(super) active_meeting_id: Option<MeetingId>,
    pub(super) phase: Phase,
    pub(super) meeting_name: Option<String>,
    pub(super) chat_log: Vec<ChatEntry>,
    pub(super) notes: Option<String>,
    pub(super) candidate_file: Option<CandidateFile>,
    pub(super) history: Vec<MeetingSummary>,
    pub(super) last_error: Option<String>,
    pub(super) busy: BusyFlags,
    next_entry_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            active_meeting_id: None,
            phase: Phase::Idle,
            meeting_name: None,
            chat_log: Vec::new(),
            notes: None,
            candidate_file: None,
            history: Vec::new(),
            last_error: None,
            busy: BusyFlags::default(),
            next_entry_id: 1,
        }
    }
}

impl Session {
    pub fn active_meeting_id(&self) -> Option<&MeetingId> {
        self.active_meeting_id.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn meeting_name(&self) -> Option<&str> {
        self.meeting_name.as_deref()
    }

    pub fn chat_log(&self) -> &[ChatEntry] {
        &self.chat_log
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Notes split into display units.
    pub fn note_lines(&self) -> Vec<&str> {
        self.notes.as_deref().map(highlight_lines).unwrap_or_default()
    }

    pub fn candidate_file(&self) -> Option<&CandidateFile> {
        self.candidate_file.as_ref()
    }

    pub fn history(&self) -> &[MeetingSummary] {
        &self.history
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn busy(&self) -> &BusyFlags {
        &self.busy
    }

    pub fn has_pending_chat(&self) -> bool {
        self.chat_log.iter().any(|entry| entry.pending)
    }

    /// Ready with an active meeting: notes, chat and download are allowed.
    pub fn is_interactive(&self) -> bool {
        self.phase == Phase::Ready && self.active_meeting_id.is_some()
    }

    pub(super) fn push_chat(&mut self, role: ChatRole, text: impl Into<String>, pending: bool) -> u64 {
        let id = self.next_entry_id;
        self.next_entry_id += 1;
        self.chat_log.push(ChatEntry {
            id,
            text: text.into(),
            role,
            pending,
        });
        id
    }

    /// Replace a pending entry with its resolved text. Returns false when the
    /// entry no longer exists (the log was cleared by a meeting switch).
    pub(super) fn resolve_chat(&mut self, entry_id: u64, text: impl Into<String>) -> bool {
        match self.chat_log.iter_mut().find(|entry| entry.id == entry_id) {
            Some(entry) => {
                entry.text = text.into();
                entry.pending = false;
                true
            }
            None => false,
        }
    }

    /// Make `meeting_id` the active meeting with a fresh conversation.
    pub(super) fn activate(&mut self, meeting_id: MeetingId, name: Option<String>) {
        self.active_meeting_id = Some(meeting_id);
        self.meeting_name = name;
        self.phase = Phase::Ready;
        self.chat_log.clear();
        self.notes = None;
        self.last_error = None;
    }

    pub(super) fn fail(&mut self, message: &str) {
        self.phase = Phase::Failed;
        self.last_error = Some(message.to_string());
    }

    pub(super) fn is_active(&self, meeting_id: &MeetingId) -> bool {
        self.active_meeting_id.as_ref() == Some(meeting_id)
    }
}

/// Split highlight notes into rendering units: one per non-blank line, in order.
pub fn highlight_lines(notes: &str) -> Vec<&str> {
    notes
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Idle.as_str(), "idle");
        assert_eq!(Phase::Recording.as_str(), "recording");
        assert_eq!(Phase::UploadingFile.as_str(), "uploading_file");
        assert_eq!(Phase::ProcessingRecording.as_str(), "processing_recording");
        assert_eq!(Phase::Ready.as_str(), "ready");
        assert_eq!(Phase::Failed.as_str(), "failed");
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&Phase::ProcessingRecording).unwrap();
        assert_eq!(json, "\"processing_recording\"");
        let parsed: Phase = serde_json::from_str("\"ready\"").unwrap();
        assert_eq!(parsed, Phase::Ready);
    }

    #[test]
    fn test_session_default() {
        let session = Session::default();
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.active_meeting_id().is_none());
        assert!(session.chat_log().is_empty());
        assert!(session.notes().is_none());
        assert!(session.busy().is_idle());
        assert!(!session.is_interactive());
    }

    #[test]
    fn test_highlight_lines_drop_blank_lines() {
        assert_eq!(highlight_lines("A\n\nB"), vec!["A", "B"]);
        assert_eq!(
            highlight_lines("- Budget approved\r\n   \n- Ship on Friday\n"),
            vec!["- Budget approved", "- Ship on Friday"]
        );
        assert!(highlight_lines("\n\n").is_empty());
    }

    #[test]
    fn test_chat_entries_resolve_by_id() {
        let mut session = Session::default();
        session.push_chat(ChatRole::User, "q", false);
        let pending = session.push_chat(ChatRole::Assistant, PENDING_ANSWER, true);
        assert!(session.has_pending_chat());

        assert!(session.resolve_chat(pending, "a"));
        assert!(!session.has_pending_chat());
        assert_eq!(session.chat_log()[1].text, "a");

        session.chat_log.clear();
        assert!(!session.resolve_chat(pending, "late"));
    }

    #[test]
    fn test_activate_resets_conversation() {
        let mut session = Session::default();
        session.push_chat(ChatRole::User, "q", false);
        session.notes = Some("old".to_string());
        session.fail("Upload failed.");

        session.activate(MeetingId::from("m2"), Some("Retro".to_string()));
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.active_meeting_id(), Some(&MeetingId::from("m2")));
        assert_eq!(session.meeting_name(), Some("Retro"));
        assert!(session.chat_log().is_empty());
        assert!(session.notes().is_none());
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_busy_flags() {
        let mut busy = BusyFlags::default();
        assert!(busy.acquire(Operation::Chat));
        assert!(!busy.acquire(Operation::Chat));
        assert!(busy.contains(Operation::Chat));
        busy.release(Operation::Chat);
        assert!(busy.is_idle());
    }
}
