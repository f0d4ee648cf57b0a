//! HTTP client for the meeting service.
//!
//! Every call follows the same shape: send, check the status, then parse the
//! body. Any failure along the way becomes a [`RemoteOperationFailed`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::backend::MeetingBackend;
use super::error::{Endpoint, RemoteOperationFailed, RemoteResult};
use super::types::{
    ChatRequest, ChatResponse, DownloadFormat, MeetingCreated, MeetingId, MeetingListing,
    MeetingSummary, NotesDownload, NotesRequest, NotesResponse, SetMeetingNameRequest,
};

/// Client for the meeting service REST API.
#[derive(Clone)]
pub struct MeetingApiClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    message: Option<String>,
}

/// MIME type for the media formats the service accepts.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "m4a" => Some("audio/mp4"),
        "flac" => Some("audio/flac"),
        "ogg" => Some("audio/ogg"),
        "mp4" => Some("video/mp4"),
        "mkv" => Some("video/x-matroska"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        _ => None,
    }
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// The RFC 6266 `filename*=UTF-8''...` form wins over plain `filename=`.
fn file_name_from_disposition(value: &str) -> Option<String> {
    let params: Vec<&str> = value.split(';').map(str::trim).collect();

    let extended = params
        .iter()
        .find_map(|part| disposition_param(part, "filename*"))
        .and_then(decode_ext_value);
    let plain = params
        .iter()
        .find_map(|part| disposition_param(part, "filename"))
        .map(|name| name.trim_matches('"').to_string());

    extended.or(plain).filter(|name| !name.is_empty())
}

fn disposition_param<'a>(part: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = part.split_once('=')?;
    name.trim().eq_ignore_ascii_case(key).then(|| value.trim())
}

/// Decode an RFC 5987 `charset'lang'percent-encoded` value. Only UTF-8.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut pieces = value.trim_matches('"').splitn(3, '\'');
    let charset = pieces.next()?;
    let _language = pieces.next()?;
    let encoded = pieces.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }

    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).ok()
}

impl MeetingApiClient {
    /// Create a client for `base_url`. `timeout` bounds every request, including
    /// uploads that wait for server-side processing.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// `GET /`, returns the service banner.
    pub async fn health(&self) -> RemoteResult<String> {
        let endpoint = Endpoint::Health;
        let response = Self::send(endpoint, self.client.get(self.url(endpoint))).await?;
        let health: HealthResponse = Self::read_json(endpoint, response).await?;
        Ok(health.message.unwrap_or_else(|| "ok".to_string()))
    }

    async fn send(endpoint: Endpoint, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteOperationFailed::new(endpoint, format!("request error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("{} returned {}: {}", endpoint, status, body);
            return Err(RemoteOperationFailed::new(
                endpoint,
                format!("server returned {status}"),
            ));
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(endpoint: Endpoint, response: Response) -> RemoteResult<T> {
        let body = response
            .text()
            .await
            .map_err(|e| RemoteOperationFailed::new(endpoint, format!("failed to read body: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| RemoteOperationFailed::new(endpoint, format!("invalid response: {e}")))
    }

    async fn file_part(endpoint: Endpoint, file_path: &Path) -> RemoteResult<Part> {
        let io_error =
            |e: std::io::Error| RemoteOperationFailed::new(endpoint, format!("cannot read file: {e}"));

        let file = File::open(file_path).await.map_err(io_error)?;
        let length = file.metadata().await.map_err(io_error)?.len();

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("meeting")
            .to_string();

        let mime_type = file_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_type_for_extension)
            .unwrap_or("application/octet-stream");

        let body = Body::wrap_stream(ReaderStream::new(file));
        Part::stream_with_length(body, length)
            .file_name(filename)
            .mime_str(mime_type)
            .map_err(|e| RemoteOperationFailed::new(endpoint, format!("invalid mime type: {e}")))
    }
}

#[async_trait]
impl MeetingBackend for MeetingApiClient {
    async fn start_recording(&self) -> RemoteResult<()> {
        let endpoint = Endpoint::StartRecording;
        Self::send(endpoint, self.client.post(self.url(endpoint))).await?;
        Ok(())
    }

    async fn stop_recording(&self) -> RemoteResult<MeetingId> {
        let endpoint = Endpoint::StopRecording;
        let response = Self::send(endpoint, self.client.post(self.url(endpoint))).await?;
        let created: MeetingCreated = Self::read_json(endpoint, response).await?;
        Ok(created.meeting_id)
    }

    async fn upload(&self, file_path: &Path) -> RemoteResult<MeetingId> {
        let endpoint = Endpoint::Upload;
        info!("Uploading {:?}", file_path);

        let form = Form::new().part("file", Self::file_part(endpoint, file_path).await?);
        let response = Self::send(
            endpoint,
            self.client.post(self.url(endpoint)).multipart(form),
        )
        .await?;

        let created: MeetingCreated = Self::read_json(endpoint, response).await?;
        Ok(created.meeting_id)
    }

    async fn set_meeting_name(&self, meeting_id: &MeetingId, name: &str) -> RemoteResult<()> {
        let endpoint = Endpoint::SetMeetingName;
        let request = SetMeetingNameRequest { meeting_id, name };
        Self::send(endpoint, self.client.post(self.url(endpoint)).json(&request)).await?;
        Ok(())
    }

    async fn generate_notes(&self, meeting_id: &MeetingId) -> RemoteResult<Option<String>> {
        let endpoint = Endpoint::Notes;
        let request = NotesRequest { meeting_id };
        let response =
            Self::send(endpoint, self.client.post(self.url(endpoint)).json(&request)).await?;
        let notes: NotesResponse = Self::read_json(endpoint, response).await?;
        Ok(notes.notes)
    }

    async fn chat(&self, meeting_id: &MeetingId, question: &str) -> RemoteResult<Option<String>> {
        let endpoint = Endpoint::Chat;
        let request = ChatRequest {
            question,
            meeting_id,
        };
        let response =
            Self::send(endpoint, self.client.post(self.url(endpoint)).json(&request)).await?;
        let chat: ChatResponse = Self::read_json(endpoint, response).await?;
        Ok(chat.answer)
    }

    async fn list_meetings(&self) -> RemoteResult<Vec<MeetingSummary>> {
        let endpoint = Endpoint::Meetings;
        let response = Self::send(endpoint, self.client.get(self.url(endpoint))).await?;
        let listing: MeetingListing = Self::read_json(endpoint, response).await?;
        Ok(listing.into_vec())
    }

    async fn download_notes(
        &self,
        meeting_id: &MeetingId,
        format: DownloadFormat,
    ) -> RemoteResult<NotesDownload> {
        let endpoint = Endpoint::DownloadNotes;
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("meeting_id", meeting_id.as_str()), ("format", format.as_str())]);
        let response = Self::send(endpoint, request).await?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteOperationFailed::new(endpoint, format!("failed to read body: {e}")))?;

        Ok(NotesDownload {
            file_name,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = MeetingApiClient::new("http://127.0.0.1:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert_eq!(client.url(Endpoint::Chat), "http://127.0.0.1:8000/chat");
        assert_eq!(client.url(Endpoint::Health), "http://127.0.0.1:8000/");
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for_extension("wav"), Some("audio/wav"));
        assert_eq!(mime_type_for_extension("MP3"), Some("audio/mpeg"));
        assert_eq!(mime_type_for_extension("mp4"), Some("video/mp4"));
        assert_eq!(mime_type_for_extension("xyz"), None);
    }

    #[test]
    fn test_file_name_from_disposition() {
        assert_eq!(
            file_name_from_disposition("attachment; filename=\"notes.pdf\""),
            Some("notes.pdf".to_string())
        );
        assert_eq!(
            file_name_from_disposition("attachment;filename=summary.txt"),
            Some("summary.txt".to_string())
        );
        assert_eq!(file_name_from_disposition("inline"), None);
        assert_eq!(file_name_from_disposition("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_file_name_from_extended_disposition() {
        assert_eq!(
            file_name_from_disposition("attachment; filename*=UTF-8''weekly%20sync%20%E2%9C%93.pdf"),
            Some("weekly sync \u{2713}.pdf".to_string())
        );
        assert_eq!(
            file_name_from_disposition(
                "attachment; filename=\"notes.txt\"; filename*=utf-8''r%C3%A9sum%C3%A9.txt"
            ),
            Some("r\u{e9}sum\u{e9}.txt".to_string())
        );
        // Unsupported charset or broken escapes fall back to the plain form.
        assert_eq!(
            file_name_from_disposition("attachment; filename=plain.txt; filename*=ISO-8859-1''x.txt"),
            Some("plain.txt".to_string())
        );
        assert_eq!(
            file_name_from_disposition("attachment; FILENAME=upper.txt; filename*=UTF-8''bad%Z1"),
            Some("upper.txt".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_remote_failure() {
        // Port 9 (discard) is closed on test hosts; connection is refused quickly.
        let client = MeetingApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.list_meetings().await.unwrap_err();
        assert_eq!(err.endpoint, Endpoint::Meetings);
    }
}
