//! Wire types for the meeting service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque meeting identifier issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingId(String);

impl MeetingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MeetingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// History entry returned by `GET /meetings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub id: MeetingId,
    #[serde(default)]
    pub name: String,
}

/// `GET /meetings` returns a bare array; older servers wrap it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MeetingListing {
    Bare(Vec<MeetingSummary>),
    Wrapped { meetings: Vec<MeetingSummary> },
}

impl MeetingListing {
    pub(crate) fn into_vec(self) -> Vec<MeetingSummary> {
        match self {
            Self::Bare(meetings) | Self::Wrapped { meetings } => meetings,
        }
    }
}

/// Response of `/upload` and `/stop-recording`.
#[derive(Debug, Deserialize)]
pub(crate) struct MeetingCreated {
    pub meeting_id: MeetingId,
}

#[derive(Debug, Serialize)]
pub(crate) struct SetMeetingNameRequest<'a> {
    pub meeting_id: &'a MeetingId,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct NotesRequest<'a> {
    pub meeting_id: &'a MeetingId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesResponse {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub question: &'a str,
    pub meeting_id: &'a MeetingId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

/// Formats accepted by `/download-notes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadFormat {
    #[default]
    Txt,
    Pdf,
    Docx,
}

impl DownloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            other => Err(format!(
                "Unsupported notes format: {other} (expected txt, pdf or docx)"
            )),
        }
    }
}

/// Body of a notes download plus the server-suggested file name.
#[derive(Debug, Clone)]
pub struct NotesDownload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl NotesDownload {
    /// File name to save under. Only the final path component of the server's
    /// suggestion is used.
    pub fn resolved_file_name(&self, meeting_id: &MeetingId, format: DownloadFormat) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| std::path::Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("notes-{}.{}", meeting_id, format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_accepts_bare_array() {
        let json = r#"[{"id": "a1", "name": "Standup"}, {"id": "b2", "name": "Retro"}]"#;
        let listing: MeetingListing = serde_json::from_str(json).unwrap();
        let meetings = listing.into_vec();
        assert_eq!(meetings.len(), 2);
        assert_eq!(meetings[0].id, MeetingId::from("a1"));
        assert_eq!(meetings[1].name, "Retro");
    }

    #[test]
    fn test_listing_accepts_wrapped_array() {
        let json = r#"{"meetings": [{"id": "a1"}]}"#;
        let listing: MeetingListing = serde_json::from_str(json).unwrap();
        let meetings = listing.into_vec();
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].name, "");
    }

    #[test]
    fn test_meeting_created_ignores_extra_fields() {
        let json = r#"{"message": "meeting processed successfully", "meeting_id": "9f2c"}"#;
        let created: MeetingCreated = serde_json::from_str(json).unwrap();
        assert_eq!(created.meeting_id.as_str(), "9f2c");
    }

    #[test]
    fn test_chat_request_shape() {
        let id = MeetingId::from("m1");
        let body = serde_json::to_value(ChatRequest {
            question: "What was decided?",
            meeting_id: &id,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"question": "What was decided?", "meeting_id": "m1"})
        );
    }

    #[test]
    fn test_missing_answer_is_none() {
        let response: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(response.answer.is_none());
    }

    #[test]
    fn test_download_format_parsing() {
        assert_eq!("PDF".parse::<DownloadFormat>().unwrap(), DownloadFormat::Pdf);
        assert_eq!("text".parse::<DownloadFormat>().unwrap(), DownloadFormat::Txt);
        assert!("odt".parse::<DownloadFormat>().is_err());
    }

    #[test]
    fn test_resolved_file_name() {
        let id = MeetingId::from("m1");
        let download = NotesDownload {
            file_name: None,
            bytes: Vec::new(),
        };
        assert_eq!(download.resolved_file_name(&id, DownloadFormat::Pdf), "notes-m1.pdf");

        let download = NotesDownload {
            file_name: Some("../../etc/standup.txt".to_string()),
            bytes: Vec::new(),
        };
        assert_eq!(download.resolved_file_name(&id, DownloadFormat::Txt), "standup.txt");
    }
}
