//! HTTP access to the meeting service.
//!
//! The session controller only sees the [`MeetingBackend`] trait; the reqwest
//! implementation lives in [`client`].

pub mod backend;
pub mod client;
pub mod error;
pub mod types;

pub use backend::MeetingBackend;
pub use client::{mime_type_for_extension, MeetingApiClient};
pub use error::{Endpoint, RemoteOperationFailed, RemoteResult};
pub use types::{DownloadFormat, MeetingId, MeetingSummary, NotesDownload};
