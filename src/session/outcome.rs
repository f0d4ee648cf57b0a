use std::path::PathBuf;
use thiserror::Error;

use super::state::{Operation, Phase};
use crate::remote::MeetingId;

/// Why an operation was refused before any remote call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Please select a file first.")]
    NoFileSelected,
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("File is empty: {}", .0.display())]
    EmptyFile(PathBuf),
    #[error("Upload or record a meeting first.")]
    NoActiveMeeting,
    #[error("Meeting is not ready (status: {0})")]
    NotReady(Phase),
    #[error("A recording is already in progress.")]
    AlreadyRecording,
    #[error("No recording in progress.")]
    NotRecording,
    #[error("Finish the current recording or upload first.")]
    MeetingInProgress,
    #[error("Please enter a question.")]
    EmptyQuestion,
    #[error("Still waiting for the previous answer.")]
    ChatPending,
    #[error("{0} is already in progress.")]
    Busy(Operation),
    #[error("Meeting {0} is not in the meeting list.")]
    UnknownMeeting(MeetingId),
}

/// Result of a controller command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    Done(T),
    /// Precondition not met; the session is untouched.
    Rejected(Rejection),
    /// The remote call failed; the session shows the given message.
    Failed(String),
    /// The response arrived after the active meeting changed and was dropped.
    Superseded,
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Short line for the status area. `None` on success.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Done(_) => None,
            Self::Rejected(rejection) => Some(rejection.to_string()),
            Self::Failed(message) => Some(message.clone()),
            Self::Superseded => Some("Meeting changed before the response arrived.".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(Rejection::NoFileSelected.to_string(), "Please select a file first.");
        assert_eq!(
            Rejection::NotReady(Phase::Failed).to_string(),
            "Meeting is not ready (status: failed)"
        );
        assert_eq!(
            Rejection::Busy(Operation::Upload).to_string(),
            "upload is already in progress."
        );
    }

    #[test]
    fn test_outcome_message() {
        let done: Outcome = Outcome::Done(());
        assert!(done.is_done());
        assert!(done.message().is_none());

        let failed: Outcome = Outcome::Failed("Upload failed.".to_string());
        assert_eq!(failed.message().as_deref(), Some("Upload failed."));

        let rejected: Outcome = Outcome::Rejected(Rejection::EmptyQuestion);
        assert_eq!(rejected.message().as_deref(), Some("Please enter a question."));
    }
}
