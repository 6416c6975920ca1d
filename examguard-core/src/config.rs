use crate::types::{AttemptNumber, CandidateId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TOTAL_MINUTES: u32 = 30;
pub const DEFAULT_WARNING_THRESHOLD_SECS: u32 = 600;
pub const DEFAULT_DANGER_THRESHOLD_SECS: u32 = 300;
pub const DEFAULT_GRACE_DELAY_MS: u64 = 3_000;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_UPLOAD_WAIT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_FORM_ACTION: &str = "/test";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("total_minutes must be greater than zero")]
    ZeroDuration,

    #[error("candidate_id must not be empty")]
    MissingCandidate,

    #[error("danger threshold ({danger}s) must not exceed warning threshold ({warning}s)")]
    ThresholdOrder { warning: u32, danger: u32 },

    #[error("tick_interval_ms must be greater than zero")]
    ZeroTickInterval,

    #[error("backend_url must be an absolute http(s) URL: {0}")]
    BackendUrl(String),
}

/// How answer progress survives a page reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMode {
    /// Persist the answered identifiers and restore them on start.
    #[default]
    Persisted,
    /// Keep progress in memory only; storage receives the count but is never read back.
    Ephemeral,
}

/// Values handed over by the page-rendering layer at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_total_minutes")]
    pub total_minutes: u32,
    pub total_questions: usize,
    pub candidate_id: CandidateId,
    pub attempt_number: AttemptNumber,
    pub backend_url: String,

    #[serde(default = "default_form_action")]
    pub form_action: String,

    // Static hidden inputs rendered into the form (e.g. `current_set`).
    #[serde(default)]
    pub hidden_fields: Vec<(String, String)>,

    #[serde(default = "default_warning_threshold")]
    pub warning_threshold_secs: u32,
    #[serde(default = "default_danger_threshold")]
    pub danger_threshold_secs: u32,
    #[serde(default = "default_grace_delay")]
    pub grace_delay_ms: u64,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    // `None` waits for the upload without a bound.
    #[serde(default = "default_upload_wait_timeout")]
    pub upload_wait_timeout_ms: Option<u64>,

    #[serde(default)]
    pub progress_mode: ProgressMode,
}

impl SessionConfig {
    pub fn new(
        candidate_id: CandidateId,
        attempt_number: AttemptNumber,
        total_questions: usize,
        backend_url: impl Into<String>,
    ) -> Self {
        Self {
            total_minutes: DEFAULT_TOTAL_MINUTES,
            total_questions,
            candidate_id,
            attempt_number,
            backend_url: backend_url.into(),
            form_action: DEFAULT_FORM_ACTION.into(),
            hidden_fields: Vec::new(),
            warning_threshold_secs: DEFAULT_WARNING_THRESHOLD_SECS,
            danger_threshold_secs: DEFAULT_DANGER_THRESHOLD_SECS,
            grace_delay_ms: DEFAULT_GRACE_DELAY_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            upload_wait_timeout_ms: Some(DEFAULT_UPLOAD_WAIT_TIMEOUT_MS),
            progress_mode: ProgressMode::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_minutes == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.candidate_id.as_str().trim().is_empty() {
            return Err(ConfigError::MissingCandidate);
        }
        if self.danger_threshold_secs > self.warning_threshold_secs {
            return Err(ConfigError::ThresholdOrder {
                warning: self.warning_threshold_secs,
                danger: self.danger_threshold_secs,
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::BackendUrl(self.backend_url.clone()));
        }
        Ok(())
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_minutes.saturating_mul(60)
    }

    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn upload_wait_timeout(&self) -> Option<Duration> {
        self.upload_wait_timeout_ms.map(Duration::from_millis)
    }
}

fn default_total_minutes() -> u32 {
    DEFAULT_TOTAL_MINUTES
}

fn default_form_action() -> String {
    DEFAULT_FORM_ACTION.into()
}

fn default_warning_threshold() -> u32 {
    DEFAULT_WARNING_THRESHOLD_SECS
}

fn default_danger_threshold() -> u32 {
    DEFAULT_DANGER_THRESHOLD_SECS
}

fn default_grace_delay() -> u64 {
    DEFAULT_GRACE_DELAY_MS
}

fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_upload_wait_timeout() -> Option<u64> {
    Some(DEFAULT_UPLOAD_WAIT_TIMEOUT_MS)
}
