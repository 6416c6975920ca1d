use examguard_core::countdown::{TimerClass, TimerPhase};
use serde::Serialize;

/// Point-in-time view of the whole session, for hosts and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub time_remaining_seconds: u32,
    pub phase: TimerPhase,
    pub timer_classes: Vec<TimerClass>,
    pub is_submitted: bool,
    pub answered_count: usize,
    pub total_questions: usize,
    pub tab_switch_count: u32,
    pub capture_active: bool,
}

/// Answer to the host's page-unload hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnloadDecision {
    /// Show the native "leave this page?" confirmation.
    Prompt,
    Allow,
}

impl UnloadDecision {
    pub fn evaluate(time_remaining_seconds: u32, is_submitted: bool) -> Self {
        if time_remaining_seconds > 0 && !is_submitted {
            UnloadDecision::Prompt
        } else {
            UnloadDecision::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_inert_once_submitted_or_expired() {
        assert_eq!(UnloadDecision::evaluate(120, false), UnloadDecision::Prompt);
        assert_eq!(UnloadDecision::evaluate(120, true), UnloadDecision::Allow);
        assert_eq!(UnloadDecision::evaluate(0, false), UnloadDecision::Allow);
    }
}
