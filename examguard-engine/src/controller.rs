use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use examguard_core::config::SessionConfig;
use examguard_core::countdown::Countdown;
use examguard_core::progress::StorageKeys;
use examguard_core::tab_switch::TabSwitchReport;
use examguard_core::types::QuestionId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::capture::CaptureManager;
use crate::error::{CaptureError, EngineError};
use crate::events::{EventPump, HostEvent, SessionEvents};
use crate::gate::{GateConfig, GateDecision, SubmissionGate, SubmitTrigger};
use crate::progress::AnswerProgress;
use crate::session::{SessionSnapshot, UnloadDecision};
use crate::traits::{MediaDevices, ProctorBackend, SessionStorage, Surface};

/// Everything the controller needs from its host.
#[derive(Clone)]
pub struct HostBindings {
    pub devices: Arc<dyn MediaDevices>,
    pub surface: Arc<dyn Surface>,
    pub storage: Arc<dyn SessionStorage>,
    pub backend: Arc<dyn ProctorBackend>,
}

struct Shared {
    cfg: SessionConfig,
    surface: Arc<dyn Surface>,
    backend: Arc<dyn ProctorBackend>,
    capture: CaptureManager,
    progress: AnswerProgress,
    gate: SubmissionGate,
    countdown: Mutex<Countdown>,
    tab_switches: AtomicU32,
}

impl Shared {
    fn countdown(&self) -> MutexGuard<'_, Countdown> {
        self.countdown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn submit(&self, trigger: SubmitTrigger) -> GateDecision {
        self.gate.submit(trigger, &self.capture, &self.progress).await
    }
}

/// Owns all state of one proctored test session.
pub struct ProctorController {
    shared: Arc<Shared>,
    // Set once the test UI has been revealed; the submit control exists only after that.
    revealed: AtomicBool,
    ticker: Mutex<Option<JoinHandle<()>>>,
    auto_submission: Arc<Mutex<Option<JoinHandle<GateDecision>>>>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProctorController {
    pub fn new(cfg: SessionConfig, host: HostBindings) -> Result<Self, EngineError> {
        cfg.validate()?;

        let capture = CaptureManager::new(
            host.devices.clone(),
            host.surface.clone(),
            host.backend.clone(),
            cfg.candidate_id.clone(),
            cfg.attempt_number,
        );
        let progress = AnswerProgress::new(
            cfg.total_questions,
            cfg.progress_mode,
            StorageKeys::for_attempt(&cfg.candidate_id, cfg.attempt_number),
            host.surface.clone(),
            host.storage.clone(),
        );
        let gate = SubmissionGate::new(
            GateConfig {
                hidden_fields: cfg.hidden_fields.clone(),
                grace_delay: cfg.grace_delay(),
                upload_wait_timeout: cfg.upload_wait_timeout(),
            },
            host.surface.clone(),
            host.backend.clone(),
        );

        let shared = Shared {
            countdown: Mutex::new(Countdown::from_config(&cfg)),
            cfg,
            surface: host.surface,
            backend: host.backend,
            capture,
            progress,
            gate,
            tab_switches: AtomicU32::new(0),
        };

        Ok(Self {
            shared: Arc::new(shared),
            revealed: AtomicBool::new(false),
            ticker: Mutex::new(None),
            auto_submission: Arc::new(Mutex::new(None)),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.cfg
    }

    /// Page-load entry point: renders initial progress and begins the webcam flow.
    pub async fn start(&self) -> Result<(), CaptureError> {
        log::info!(
            "starting session for candidate {} (attempt {}, {} min, {} questions)",
            self.shared.cfg.candidate_id,
            self.shared.cfg.attempt_number,
            self.shared.cfg.total_minutes,
            self.shared.cfg.total_questions
        );
        self.shared.progress.start();
        self.shared.surface.set_permission_prompt_visible(true);
        self.acquire().await
    }

    async fn acquire(&self) -> Result<(), CaptureError> {
        self.shared.capture.acquire().await?;
        self.start_countdown();
        Ok(())
    }

    // Started once, on the first successful acquisition.
    fn start_countdown(&self) {
        self.revealed.store(true, Ordering::SeqCst);
        let mut ticker = locked(&self.ticker);
        if ticker.is_some() || self.shared.gate.is_submitted() {
            return;
        }
        let shared = self.shared.clone();
        let auto_submission = self.auto_submission.clone();
        *ticker = Some(tokio::spawn(run_ticker(shared, auto_submission)));
    }

    pub async fn submit(&self, trigger: SubmitTrigger) -> GateDecision {
        if trigger == SubmitTrigger::UserRequested && !self.revealed.load(Ordering::SeqCst) {
            log::warn!("submit requested before the test was shown; ignoring");
            return GateDecision::NotReady;
        }
        self.shared.submit(trigger).await
    }

    /// Waits for the expiry-driven submission, if the countdown has fired one.
    pub async fn auto_submission(&self) -> Option<GateDecision> {
        let handle = locked(&self.auto_submission).take()?;
        match handle.await {
            Ok(decision) => Some(decision),
            Err(e) => {
                log::error!("auto-submit task ended abnormally: {e}");
                None
            }
        }
    }

    /// Re-synchronizes the clock with an externally known remaining time.
    /// The clock only ever moves forward; applied classes stay.
    pub fn resync_clock(&self, remaining_secs: u32) {
        if self.shared.gate.is_submitted() {
            return;
        }
        let display = {
            let mut c = self.shared.countdown();
            c.recompute(remaining_secs);
            examguard_core::countdown::format_clock(c.remaining_secs())
        };
        self.shared.surface.render_timer(&display);
    }

    pub fn is_submitted(&self) -> bool {
        self.shared.gate.is_submitted()
    }

    pub fn before_unload(&self) -> UnloadDecision {
        UnloadDecision::evaluate(
            self.shared.countdown().remaining_secs(),
            self.shared.gate.is_submitted(),
        )
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (remaining, phase, classes) = {
            let c = self.shared.countdown();
            (c.remaining_secs(), c.phase(), c.classes())
        };
        SessionSnapshot {
            time_remaining_seconds: remaining,
            phase,
            timer_classes: classes,
            is_submitted: self.shared.gate.is_submitted(),
            answered_count: self.shared.progress.answered_count(),
            total_questions: self.shared.cfg.total_questions,
            tab_switch_count: self.shared.tab_switches.load(Ordering::SeqCst),
            capture_active: self.shared.capture.is_active(),
        }
    }

    /// Routes host events from `rx` into this controller until teardown.
    pub fn attach_events(self: &Arc<Self>, rx: mpsc::Receiver<HostEvent>) {
        let handle = EventPump::spawn(self.clone(), rx);
        locked(&self.listeners).push(handle);
    }

    /// Single teardown path: stop the clock, the stream and the listeners.
    pub fn teardown(&self) {
        if let Some(handle) = locked(&self.ticker).take() {
            handle.abort();
        }
        self.shared.capture.release();
        for handle in locked(&self.listeners).drain(..) {
            handle.abort();
        }
        log::info!("session torn down");
    }
}

#[async_trait]
impl SessionEvents for ProctorController {
    async fn on_answer_changed(&self, question: QuestionId, value: String) {
        if self.shared.gate.is_submitted() {
            return;
        }
        let update = self.shared.progress.record(question, value);
        log::debug!("progress {}", update.label());
    }

    async fn on_visibility_changed(&self, hidden: bool) {
        if !hidden {
            return;
        }
        let count = self.shared.tab_switches.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("tab switch detected ({count})");

        let report = TabSwitchReport::new(count, Utc::now());
        let backend = self.shared.backend.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.report_tab_switch(&report).await {
                log::debug!("tab-switch report dropped: {e:#}");
            }
        });
    }

    async fn on_submit_requested(&self) -> GateDecision {
        self.submit(SubmitTrigger::UserRequested).await
    }

    async fn on_retry_requested(&self) -> Result<(), CaptureError> {
        self.acquire().await
    }
}

async fn run_ticker(
    shared: Arc<Shared>,
    auto_submission: Arc<Mutex<Option<JoinHandle<GateDecision>>>>,
) {
    let interval = shared.cfg.tick_interval();
    loop {
        let render = shared.countdown().evaluate();
        shared.surface.render_timer(&render.display);
        for class in &render.newly_applied {
            shared.surface.add_timer_class(*class);
        }

        if render.expired_now {
            log::info!("time is up; auto-submitting");
            let submitter = shared.clone();
            // The slot stays locked until the handle is stored.
            let mut slot = locked(&auto_submission);
            *slot = Some(tokio::spawn(async move {
                submitter.submit(SubmitTrigger::TimerExpired).await
            }));
            return;
        }

        if shared.gate.is_submitted() {
            return;
        }
        tokio::time::sleep(interval).await;
        if shared.gate.is_submitted() {
            return;
        }
        shared.countdown().decrement();
    }
}
