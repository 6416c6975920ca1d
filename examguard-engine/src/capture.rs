use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use examguard_core::types::{AttemptNumber, CandidateId, RECORDING_MIME_TYPE};
use examguard_providers::upload::VideoArtifact;
use tokio::task::JoinHandle;

use crate::error::CaptureError;
use crate::traits::{
    MediaConstraints, MediaDevices, MediaRecorder, ProctorBackend, StreamHandle, Surface,
};

/// How the background upload ended. `Failed` is a sentinel, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { message: String },
    Failed,
}

/// The in-flight upload of one finalized recording.
///
/// Not `Clone`, and `settle` consumes it: the outcome can be read once.
#[derive(Debug)]
pub struct UploadTask {
    handle: JoinHandle<UploadOutcome>,
    candidate_id: CandidateId,
    attempt_number: AttemptNumber,
}

impl UploadTask {
    pub fn is_pending(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn candidate_id(&self) -> &CandidateId {
        &self.candidate_id
    }

    pub fn attempt_number(&self) -> AttemptNumber {
        self.attempt_number
    }

    /// Waits for the upload to settle. Returns `None` if `timeout` elapsed first;
    /// the upload keeps running in the background in that case.
    pub async fn settle(self, timeout: Option<Duration>) -> Option<UploadOutcome> {
        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.handle).await {
                Ok(joined) => joined,
                Err(_) => return None,
            },
            None => self.handle.await,
        };

        Some(joined.unwrap_or_else(|e| {
            log::error!("video upload task ended abnormally: {e}");
            UploadOutcome::Failed
        }))
    }
}

struct MediaSession {
    stream: StreamHandle,
    recorder: Option<Box<dyn MediaRecorder>>,
}

#[derive(Default)]
struct CaptureState {
    active: Option<MediaSession>,

    // Set by `finalize`/`release`; a late permission grant must not revive capture.
    closed: bool,
}

/// Owns camera/microphone access and the recording lifecycle.
pub struct CaptureManager {
    devices: Arc<dyn MediaDevices>,
    surface: Arc<dyn Surface>,
    backend: Arc<dyn ProctorBackend>,
    candidate_id: CandidateId,
    attempt_number: AttemptNumber,
    state: Mutex<CaptureState>,
}

impl CaptureManager {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        surface: Arc<dyn Surface>,
        backend: Arc<dyn ProctorBackend>,
        candidate_id: CandidateId,
        attempt_number: AttemptNumber,
    ) -> Self {
        Self {
            devices,
            surface,
            backend,
            candidate_id,
            attempt_number,
            state: Mutex::new(CaptureState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.state().active.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.state()
            .active
            .as_ref()
            .and_then(|s| s.recorder.as_ref())
            .is_some_and(|r| r.is_recording())
    }

    /// Requests camera and microphone, then shows the test and starts recording.
    pub async fn acquire(&self) -> Result<(), CaptureError> {
        if self.is_active() {
            return Ok(());
        }

        let stream = match self
            .devices
            .get_user_media(MediaConstraints::camera_and_microphone())
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("error accessing webcam: {e}");
                self.surface.show_capture_error(&e.user_message());
                return Err(e);
            }
        };

        {
            let mut state = self.state();
            if state.closed {
                drop(state);
                self.devices.stop_tracks(&stream);
                return Err(CaptureError::SessionClosed);
            }
            if state.active.is_some() {
                // Lost a race against another acquire; keep the first stream.
                drop(state);
                self.devices.stop_tracks(&stream);
                return Ok(());
            }

            self.surface.bind_preview(Some(&stream));
            log::info!(
                "webcam stream started for candidate {} (stream {})",
                self.candidate_id,
                stream.id
            );
            let recorder = self.begin_recording(&stream);
            state.active = Some(MediaSession { stream, recorder });
        }

        self.surface.set_permission_prompt_visible(false);
        self.surface.hide_capture_error();
        self.surface.reveal_test();
        Ok(())
    }

    fn begin_recording(&self, stream: &StreamHandle) -> Option<Box<dyn MediaRecorder>> {
        if !self.devices.is_type_supported(RECORDING_MIME_TYPE) {
            log::error!("media recorder: {RECORDING_MIME_TYPE} not supported");
            return None;
        }

        match self.devices.start_recorder(stream, RECORDING_MIME_TYPE) {
            Ok(recorder) => {
                log::info!("video recording started");
                Some(recorder)
            }
            Err(e) => {
                log::error!("failed to start media recorder: {e:#}");
                None
            }
        }
    }

    /// Stops recording and tracks, then starts the single upload of the artifact.
    ///
    /// Returns `None` when nothing was being recorded or capture was already finalized.
    pub async fn finalize(&self) -> Option<UploadTask> {
        let session = {
            let mut state = self.state();
            state.closed = true;
            state.active.take()
        }?;

        let MediaSession { stream, recorder } = session;

        let chunks = match recorder {
            Some(mut rec) if rec.is_recording() => match rec.stop().await {
                Ok(chunks) => Some(chunks),
                Err(e) => {
                    log::error!("failed to stop media recorder: {e:#}");
                    None
                }
            },
            _ => None,
        };

        self.devices.stop_tracks(&stream);
        self.surface.bind_preview(None);

        let chunks = chunks?;
        let artifact = VideoArtifact::from_chunks(
            self.candidate_id.clone(),
            self.attempt_number,
            &chunks,
        );
        log::info!(
            "uploading {} ({} bytes)",
            artifact.file_name(),
            artifact.bytes.len()
        );

        let backend = self.backend.clone();
        let handle = tokio::spawn(async move {
            match backend.upload_video(&artifact).await {
                Ok(message) => {
                    log::info!("video upload response: {message}");
                    UploadOutcome::Uploaded { message }
                }
                Err(e) => {
                    log::error!("error uploading video: {e:#}");
                    UploadOutcome::Failed
                }
            }
        });

        Some(UploadTask {
            handle,
            candidate_id: self.candidate_id.clone(),
            attempt_number: self.attempt_number,
        })
    }

    /// Stops tracks and drops any recording without uploading it.
    pub fn release(&self) {
        let session = {
            let mut state = self.state();
            state.closed = true;
            state.active.take()
        };

        if let Some(session) = session {
            self.devices.stop_tracks(&session.stream);
            self.surface.bind_preview(None);
            log::info!("capture released without upload");
        }
    }
}
