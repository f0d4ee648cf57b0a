//! The single failure kind of the remote layer.

use std::fmt;
use thiserror::Error;

/// Endpoints exposed by the meeting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    StartRecording,
    StopRecording,
    Upload,
    SetMeetingName,
    Notes,
    Chat,
    Meetings,
    DownloadNotes,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Health => "/",
            Self::StartRecording => "/start-recording",
            Self::StopRecording => "/stop-recording",
            Self::Upload => "/upload",
            Self::SetMeetingName => "/set-meeting-name",
            Self::Notes => "/notes",
            Self::Chat => "/chat",
            Self::Meetings => "/meetings",
            Self::DownloadNotes => "/download-notes",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health check",
            Self::StartRecording => "start recording",
            Self::StopRecording => "stop recording",
            Self::Upload => "upload",
            Self::SetMeetingName => "set meeting name",
            Self::Notes => "generate notes",
            Self::Chat => "chat",
            Self::Meetings => "list meetings",
            Self::DownloadNotes => "download notes",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote call that failed in transport or returned a non-success status.
///
/// Status codes and server error bodies are not distinguished; `reason` is for
/// logs only.
#[derive(Debug, Clone, Error)]
#[error("{endpoint} failed: {reason}")]
pub struct RemoteOperationFailed {
    pub endpoint: Endpoint,
    pub reason: String,
}

impl RemoteOperationFailed {
    pub fn new(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        Self {
            endpoint,
            reason: reason.into(),
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteOperationFailed>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::StartRecording.path(), "/start-recording");
        assert_eq!(Endpoint::StopRecording.path(), "/stop-recording");
        assert_eq!(Endpoint::SetMeetingName.path(), "/set-meeting-name");
        assert_eq!(Endpoint::DownloadNotes.path(), "/download-notes");
    }

    #[test]
    fn test_error_message() {
        let err = RemoteOperationFailed::new(Endpoint::Upload, "server returned 500");
        assert_eq!(err.to_string(), "upload failed: server returned 500");
    }
}
