//! Meeting session orchestrator.
//!
//! Owns the [`Session`] and is the only thing that mutates it. Every command
//! follows the same pattern:
//! check preconditions and take the busy flag → remote call → apply the result
//! and release the flag. The session lock is never held across a remote call.
//!
//! All dependencies are injected via constructor so the state machine can be
//! driven without a terminal or a server.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::remote::{DownloadFormat, MeetingBackend, MeetingId};

use super::naming::{resolve_name, MeetingNamer};
use super::outcome::{Outcome, Rejection};
use super::state::{
    CandidateFile, ChatRole, Operation, Phase, Session, CHAT_FAILED, NOTES_FAILED, NO_ANSWER,
    NO_NOTES, PENDING_ANSWER,
};
use super::timer::{RecordingTimer, TimerReading};
use super::view::SessionView;

const RECORDING_FAILED: &str = "Recording failed.";
const PROCESSING_FAILED: &str = "Processing failed.";
const UPLOAD_FAILED: &str = "Upload failed.";
const NAMING_FAILED: &str = "Failed to save meeting name.";
const HISTORY_FAILED: &str = "Failed to load meetings.";
const DOWNLOAD_FAILED: &str = "Download failed.";

pub struct SessionController {
    backend: Arc<dyn MeetingBackend>,
    namer: Box<dyn MeetingNamer>,
    default_name: String,
    session: Mutex<Session>,
    timer: Mutex<Option<RecordingTimer>>,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn MeetingBackend>,
        namer: Box<dyn MeetingNamer>,
        default_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            namer,
            default_name: default_name.into(),
            session: Mutex::new(Session::default()),
            timer: Mutex::new(None),
        }
    }

    /// Copy of the current session state.
    pub async fn snapshot(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Start time and elapsed seconds of the running recording, if any.
    pub async fn recording_timer(&self) -> Option<TimerReading> {
        self.timer.lock().await.as_ref().map(RecordingTimer::reading)
    }

    pub async fn view(&self) -> SessionView {
        let reading = self.recording_timer().await;
        let session = self.session.lock().await;
        SessionView::project(&session, reading)
    }

    // ---- Recording --------------------------------------------------------

    /// Ask the server to start recording.
    pub async fn start_recording(&self) -> Outcome {
        {
            let mut session = self.session.lock().await;
            if session.phase == Phase::Recording {
                return Outcome::Rejected(Rejection::AlreadyRecording);
            }
            if session.busy.contains(Operation::Upload) {
                return Outcome::Rejected(Rejection::MeetingInProgress);
            }
            if !session.busy.acquire(Operation::Recording) {
                return Outcome::Rejected(Rejection::Busy(Operation::Recording));
            }
            session.phase = Phase::Recording;
            session.last_error = None;
        }

        self.replace_timer(Some(RecordingTimer::start())).await;
        info!("Recording requested");

        let result = self.backend.start_recording().await;

        match result {
            Ok(()) => {
                let mut session = self.session.lock().await;
                session.busy.release(Operation::Recording);
                info!("Recording started");
                Outcome::Done(())
            }
            Err(e) => {
                error!("Failed to start recording: {}", e);
                self.replace_timer(None).await;
                let mut session = self.session.lock().await;
                session.fail(RECORDING_FAILED);
                session.busy.release(Operation::Recording);
                Outcome::Failed(RECORDING_FAILED.to_string())
            }
        }
    }

    /// Stop the server-side recording and wait for it to be processed.
    pub async fn stop_recording(&self) -> Outcome<MeetingId> {
        {
            let mut session = self.session.lock().await;
            if session.phase != Phase::Recording {
                return Outcome::Rejected(Rejection::NotRecording);
            }
            if !session.busy.acquire(Operation::Recording) {
                return Outcome::Rejected(Rejection::Busy(Operation::Recording));
            }
            session.phase = Phase::ProcessingRecording;
        }

        if let Some(timer) = self.timer.lock().await.take() {
            info!("Recording stopped after {}s, processing", timer.stop());
        }

        match self.backend.stop_recording().await {
            Ok(meeting_id) => self.adopt_new_meeting(meeting_id, Operation::Recording).await,
            Err(e) => {
                error!("Recording processing failed: {}", e);
                let mut session = self.session.lock().await;
                session.fail(PROCESSING_FAILED);
                session.busy.release(Operation::Recording);
                Outcome::Failed(PROCESSING_FAILED.to_string())
            }
        }
    }

    async fn replace_timer(&self, timer: Option<RecordingTimer>) {
        let previous = std::mem::replace(&mut *self.timer.lock().await, timer);
        if let Some(previous) = previous {
            previous.stop();
        }
    }

    // ---- Upload -----------------------------------------------------------

    /// Choose the file for the next upload. The latest call wins.
    pub async fn select_file(&self, path: impl AsRef<Path>) -> Outcome<CandidateFile> {
        let path = path.as_ref().to_path_buf();

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Outcome::Rejected(Rejection::FileNotFound(path)),
        };
        if metadata.len() == 0 {
            return Outcome::Rejected(Rejection::EmptyFile(path));
        }

        let candidate = CandidateFile {
            path,
            size_bytes: metadata.len(),
        };
        debug!(
            "Selected {} ({:.1} MB)",
            candidate.display_name(),
            candidate.size_mb()
        );

        let mut session = self.session.lock().await;
        session.candidate_file = Some(candidate.clone());
        Outcome::Done(candidate)
    }

    /// Upload the selected file and make the processed meeting active.
    ///
    /// Allowed in any phase unless a recording call is in flight. A running
    /// recording is abandoned locally. A failed upload keeps the previously
    /// active meeting id.
    pub async fn upload(&self) -> Outcome<MeetingId> {
        let (candidate, was_recording) = {
            let mut session = self.session.lock().await;
            let Some(candidate) = session.candidate_file.clone() else {
                return Outcome::Rejected(Rejection::NoFileSelected);
            };
            if session.busy.contains(Operation::Recording) {
                return Outcome::Rejected(Rejection::MeetingInProgress);
            }
            if !session.busy.acquire(Operation::Upload) {
                return Outcome::Rejected(Rejection::Busy(Operation::Upload));
            }
            let was_recording = session.phase == Phase::Recording;
            session.phase = Phase::UploadingFile;
            session.last_error = None;
            (candidate, was_recording)
        };

        if was_recording {
            self.replace_timer(None).await;
            warn!("Recording abandoned for upload of {}", candidate.display_name());
        }
        info!("Uploading {} for processing", candidate.display_name());

        match self.backend.upload(&candidate.path).await {
            Ok(meeting_id) => self.adopt_new_meeting(meeting_id, Operation::Upload).await,
            Err(e) => {
                error!("Upload of {} failed: {}", candidate.display_name(), e);
                let mut session = self.session.lock().await;
                session.fail(UPLOAD_FAILED);
                session.busy.release(Operation::Upload);
                Outcome::Failed(UPLOAD_FAILED.to_string())
            }
        }
    }

    /// Activate a meeting the server just created, then run the naming step.
    async fn adopt_new_meeting(&self, meeting_id: MeetingId, op: Operation) -> Outcome<MeetingId> {
        {
            let mut session = self.session.lock().await;
            session.activate(meeting_id.clone(), None);
            session.busy.release(op);
        }
        info!("Meeting {} is ready", meeting_id);

        self.name_meeting(&meeting_id).await;
        Outcome::Done(meeting_id)
    }

    /// Persist the chosen name remotely, then reflect it locally and refresh the
    /// meeting list.
    async fn name_meeting(&self, meeting_id: &MeetingId) {
        let answer = self.namer.prompt_name(meeting_id).await;
        let name = resolve_name(answer, &self.default_name);

        if let Err(e) = self.backend.set_meeting_name(meeting_id, &name).await {
            warn!("Failed to name meeting {}: {}", meeting_id, e);
            let mut session = self.session.lock().await;
            if session.is_active(meeting_id) {
                session.last_error = Some(NAMING_FAILED.to_string());
            }
            return;
        }

        {
            let mut session = self.session.lock().await;
            if session.is_active(meeting_id) {
                session.meeting_name = Some(name.clone());
            }
        }
        info!("Meeting {} named {:?}", meeting_id, name);

        if let Some(message) = self.refresh_history().await.message() {
            debug!("History refresh after naming: {}", message);
        }
    }

    // ---- Notes ------------------------------------------------------------

    /// Generate highlight notes for the active meeting.
    ///
    /// On failure the previous notes are replaced by the failure marker.
    pub async fn generate_notes(&self) -> Outcome {
        let meeting_id = match self.begin_interactive(Operation::Notes).await {
            Ok(id) => id,
            Err(rejection) => return Outcome::Rejected(rejection),
        };

        let result = self.backend.generate_notes(&meeting_id).await;

        let mut session = self.session.lock().await;
        session.busy.release(Operation::Notes);
        if !session.is_active(&meeting_id) {
            debug!("Discarding notes for inactive meeting {}", meeting_id);
            return Outcome::Superseded;
        }

        match result {
            Ok(notes) => {
                let notes = notes
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| NO_NOTES.to_string());
                info!("Highlights generated for {}: {} chars", meeting_id, notes.len());
                session.notes = Some(notes);
                Outcome::Done(())
            }
            Err(e) => {
                error!("Notes generation failed: {}", e);
                session.notes = Some(NOTES_FAILED.to_string());
                Outcome::Failed(NOTES_FAILED.to_string())
            }
        }
    }

    // ---- Chat -------------------------------------------------------------

    /// Ask a question about the active meeting.
    ///
    /// The question is appended immediately, followed by a pending assistant
    /// entry that is resolved with the answer or a failure marker.
    pub async fn ask(&self, question: &str) -> Outcome {
        let question = question.trim();
        if question.is_empty() {
            return Outcome::Rejected(Rejection::EmptyQuestion);
        }

        let (meeting_id, placeholder) = {
            let mut session = self.session.lock().await;
            let Some(meeting_id) = session.active_meeting_id.clone() else {
                return Outcome::Rejected(Rejection::NoActiveMeeting);
            };
            if session.phase != Phase::Ready {
                return Outcome::Rejected(Rejection::NotReady(session.phase));
            }
            if session.has_pending_chat() || !session.busy.acquire(Operation::Chat) {
                return Outcome::Rejected(Rejection::ChatPending);
            }
            session.push_chat(ChatRole::User, question, false);
            let placeholder = session.push_chat(ChatRole::Assistant, PENDING_ANSWER, true);
            (meeting_id, placeholder)
        };

        debug!("Asking about {}: {:?}", meeting_id, question);
        let result = self.backend.chat(&meeting_id, question).await;

        let mut session = self.session.lock().await;
        session.busy.release(Operation::Chat);

        let (text, outcome) = match result {
            Ok(answer) => (
                answer
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| NO_ANSWER.to_string()),
                Outcome::Done(()),
            ),
            Err(e) => {
                error!("Chat request failed: {}", e);
                (CHAT_FAILED.to_string(), Outcome::Failed(CHAT_FAILED.to_string()))
            }
        };

        if session.resolve_chat(placeholder, text) {
            outcome
        } else {
            debug!("Chat log was cleared before the answer for {} arrived", meeting_id);
            Outcome::Superseded
        }
    }

    // ---- History ----------------------------------------------------------

    /// Replace the meeting list with the server's.
    pub async fn refresh_history(&self) -> Outcome {
        {
            let mut session = self.session.lock().await;
            if !session.busy.acquire(Operation::History) {
                return Outcome::Rejected(Rejection::Busy(Operation::History));
            }
        }

        let result = self.backend.list_meetings().await;

        let mut session = self.session.lock().await;
        session.busy.release(Operation::History);
        match result {
            Ok(meetings) => {
                debug!("Loaded {} meetings", meetings.len());
                session.history = meetings;
                Outcome::Done(())
            }
            Err(e) => {
                warn!("Failed to list meetings: {}", e);
                session.last_error = Some(HISTORY_FAILED.to_string());
                Outcome::Failed(HISTORY_FAILED.to_string())
            }
        }
    }

    /// Make a meeting from the last-fetched list active with a fresh conversation.
    ///
    /// Rejected only while a creation call (upload or recording) is in flight.
    /// A running recording is abandoned locally.
    pub async fn select_meeting(&self, meeting_id: &MeetingId, name: &str) -> Outcome {
        let was_recording = {
            let mut session = self.session.lock().await;
            if !session.history.iter().any(|m| &m.id == meeting_id) {
                return Outcome::Rejected(Rejection::UnknownMeeting(meeting_id.clone()));
            }
            if session.busy.contains(Operation::Upload) || session.busy.contains(Operation::Recording)
            {
                return Outcome::Rejected(Rejection::MeetingInProgress);
            }

            let was_recording = session.phase == Phase::Recording;
            session.activate(meeting_id.clone(), Some(name.to_string()));
            was_recording
        };

        if was_recording {
            self.replace_timer(None).await;
            warn!("Recording abandoned by switching to meeting {}", meeting_id);
        }
        info!("Switched to meeting {} ({})", meeting_id, name);
        Outcome::Done(())
    }

    // ---- Download ---------------------------------------------------------

    /// Download the active meeting's notes into `dir`. Returns the written path.
    pub async fn download_notes(&self, format: DownloadFormat, dir: &Path) -> Outcome<PathBuf> {
        let meeting_id = match self.begin_interactive(Operation::Download).await {
            Ok(id) => id,
            Err(rejection) => return Outcome::Rejected(rejection),
        };

        let result = match self.backend.download_notes(&meeting_id, format).await {
            Ok(download) => {
                let path = dir.join(download.resolved_file_name(&meeting_id, format));
                match write_download(&path, &download.bytes).await {
                    Ok(()) => {
                        info!("Notes saved to {:?} ({} bytes)", path, download.bytes.len());
                        Outcome::Done(path)
                    }
                    Err(e) => {
                        error!("Failed to save notes to {:?}: {}", path, e);
                        Outcome::Failed(DOWNLOAD_FAILED.to_string())
                    }
                }
            }
            Err(e) => {
                error!("Notes download failed: {}", e);
                Outcome::Failed(DOWNLOAD_FAILED.to_string())
            }
        };

        self.session.lock().await.busy.release(Operation::Download);
        result
    }

    /// Shared precondition for notes and download: ready, with an active meeting.
    async fn begin_interactive(&self, op: Operation) -> Result<MeetingId, Rejection> {
        let mut session = self.session.lock().await;
        let Some(meeting_id) = session.active_meeting_id.clone() else {
            return Err(Rejection::NoActiveMeeting);
        };
        if session.phase != Phase::Ready {
            return Err(Rejection::NotReady(session.phase));
        }
        if !session.busy.acquire(op) {
            return Err(Rejection::Busy(op));
        }
        Ok(meeting_id)
    }
}

async fn write_download(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
