//! Backend abstraction consumed by the session controller.

use async_trait::async_trait;
use std::path::Path;

use super::error::RemoteResult;
use super::types::{DownloadFormat, MeetingId, MeetingSummary, NotesDownload};

/// The remote operations a session can issue. One method per endpoint.
#[async_trait]
pub trait MeetingBackend: Send + Sync {
    async fn start_recording(&self) -> RemoteResult<()>;

    /// Stops the server-side recording and returns the processed meeting.
    async fn stop_recording(&self) -> RemoteResult<MeetingId>;

    async fn upload(&self, file_path: &Path) -> RemoteResult<MeetingId>;

    async fn set_meeting_name(&self, meeting_id: &MeetingId, name: &str) -> RemoteResult<()>;

    /// `None` when the server answered without a `notes` value.
    async fn generate_notes(&self, meeting_id: &MeetingId) -> RemoteResult<Option<String>>;

    /// `None` when the server answered without an `answer` value.
    async fn chat(&self, meeting_id: &MeetingId, question: &str) -> RemoteResult<Option<String>>;

    async fn list_meetings(&self) -> RemoteResult<Vec<MeetingSummary>>;

    async fn download_notes(
        &self,
        meeting_id: &MeetingId,
        format: DownloadFormat,
    ) -> RemoteResult<NotesDownload>;
}
