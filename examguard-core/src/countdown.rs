use crate::config::SessionConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Running,
    Warning,
    Danger,
    Expired,
}

/// Severity class applied to the timer display. Classes only accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerClass {
    Warning,
    Danger,
}

impl TimerClass {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerClass::Warning => "warning",
            TimerClass::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickRender {
    pub display: String,
    pub phase: TimerPhase,
    pub newly_applied: Vec<TimerClass>,

    // True exactly once: on the evaluation that first observes zero.
    pub expired_now: bool,
}

/// Authoritative remaining-time clock for a session.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining_secs: u32,
    warning_at: u32,
    danger_at: u32,
    warning_applied: bool,
    danger_applied: bool,
    expired: bool,
}

impl Countdown {
    pub fn new(total_secs: u32, warning_at: u32, danger_at: u32) -> Self {
        Self {
            remaining_secs: total_secs,
            warning_at,
            danger_at,
            warning_applied: false,
            danger_applied: false,
            expired: false,
        }
    }

    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self::new(
            cfg.total_seconds(),
            cfg.warning_threshold_secs,
            cfg.danger_threshold_secs,
        )
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn phase(&self) -> TimerPhase {
        if self.expired || self.remaining_secs == 0 {
            TimerPhase::Expired
        } else if self.danger_applied {
            TimerPhase::Danger
        } else if self.warning_applied {
            TimerPhase::Warning
        } else {
            TimerPhase::Running
        }
    }

    pub fn classes(&self) -> Vec<TimerClass> {
        let mut out = Vec::with_capacity(2);
        if self.warning_applied {
            out.push(TimerClass::Warning);
        }
        if self.danger_applied {
            out.push(TimerClass::Danger);
        }
        out
    }

    /// Renders the current remaining time and applies any threshold class it crosses.
    pub fn evaluate(&mut self) -> TickRender {
        let mut newly_applied = Vec::new();

        if self.remaining_secs <= self.danger_at {
            if !self.danger_applied {
                self.danger_applied = true;
                newly_applied.push(TimerClass::Danger);
            }
        } else if self.remaining_secs <= self.warning_at && !self.warning_applied {
            self.warning_applied = true;
            newly_applied.push(TimerClass::Warning);
        }

        let expired_now = self.remaining_secs == 0 && !self.expired;
        if expired_now {
            self.expired = true;
        }

        TickRender {
            display: format_clock(self.remaining_secs),
            phase: self.phase(),
            newly_applied,
            expired_now,
        }
    }

    /// One tick of the clock. Never goes below zero.
    pub fn decrement(&mut self) {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
    }

    /// Re-synchronizes the remaining time; the clock never moves backwards.
    pub fn recompute(&mut self, remaining_secs: u32) {
        self.remaining_secs = self.remaining_secs.min(remaining_secs);
    }
}

/// `mm:ss` rendering of a number of seconds.
pub fn format_clock(total_secs: u32) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
