use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::capture::{CaptureManager, UploadOutcome};
use crate::progress::AnswerProgress;
use crate::traits::{ProctorBackend, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    TimerExpired,
    UserRequested,
}

/// What happened to the recording by the time the form went out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadWait {
    NoUpload,
    Settled(UploadOutcome),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Submitted { trigger: SubmitTrigger, upload: UploadWait },
    AlreadySubmitted,
    /// The submit control is not reachable yet (webcam not granted).
    NotReady,
    SubmitFailed { trigger: SubmitTrigger, error: String },
}

impl GateDecision {
    pub fn is_submitted(&self) -> bool {
        matches!(self, GateDecision::Submitted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub hidden_fields: Vec<(String, String)>,
    pub grace_delay: Duration,
    pub upload_wait_timeout: Option<Duration>,
}

/// Sends the form exactly once, after any in-flight upload has settled.
pub struct SubmissionGate {
    submitted: AtomicBool,
    cfg: GateConfig,
    surface: Arc<dyn Surface>,
    backend: Arc<dyn ProctorBackend>,
}

impl SubmissionGate {
    pub fn new(cfg: GateConfig, surface: Arc<dyn Surface>, backend: Arc<dyn ProctorBackend>) -> Self {
        Self {
            submitted: AtomicBool::new(false),
            cfg,
            surface,
            backend,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.load(Ordering::SeqCst)
    }

    // The only mutual-exclusion point. Must run before the first `.await`.
    fn claim(&self) -> bool {
        self.submitted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub async fn submit(
        &self,
        trigger: SubmitTrigger,
        capture: &CaptureManager,
        progress: &AnswerProgress,
    ) -> GateDecision {
        if !self.claim() {
            log::debug!("ignoring {trigger:?} submit: already submitted");
            return GateDecision::AlreadySubmitted;
        }
        log::info!("submission started ({trigger:?})");

        if trigger == SubmitTrigger::TimerExpired {
            self.surface.lock_form();
        }
        self.surface.show_submitted_overlay();

        let upload = capture.finalize().await;
        let payload = progress.capture_payload(&self.cfg.hidden_fields);

        if trigger == SubmitTrigger::TimerExpired {
            // Let the overlay render before the page goes away.
            tokio::time::sleep(self.cfg.grace_delay).await;
        }

        let upload = match upload {
            None => UploadWait::NoUpload,
            Some(task) => {
                if task.is_pending() {
                    log::info!(
                        "deferring submission until the upload for candidate {} (attempt {}) settles",
                        task.candidate_id(),
                        task.attempt_number()
                    );
                }
                match task.settle(self.cfg.upload_wait_timeout).await {
                    Some(outcome) => UploadWait::Settled(outcome),
                    None => {
                        log::warn!("video upload still running after wait limit; submitting anyway");
                        UploadWait::TimedOut
                    }
                }
            }
        };

        match self.backend.submit_form(&payload).await {
            Ok(()) => {
                log::info!(
                    "test submitted with {} answered questions",
                    payload.attended_count
                );
                progress.forget();
                GateDecision::Submitted { trigger, upload }
            }
            Err(e) => {
                // Never resend: the server may already have the form.
                log::error!("form submission failed: {e:#}");
                GateDecision::SubmitFailed {
                    trigger,
                    error: e.to_string(),
                }
            }
        }
    }
}
