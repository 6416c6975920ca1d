use crate::config::ProgressMode;
use crate::types::{AttemptNumber, CandidateId, QuestionId};
use std::collections::{BTreeMap, BTreeSet};

pub const ATTENDED_COUNT_FIELD: &str = "attended_count";
pub const ANSWERED_QUESTIONS_KEY: &str = "answered_questions";

/// Session-storage keys owned by one candidate attempt.
///
/// Another attempt sharing the same storage never reads these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub attended_count: String,
    pub answered_questions: String,
}

impl StorageKeys {
    pub fn for_attempt(candidate_id: &CandidateId, attempt_number: AttemptNumber) -> Self {
        let scope = format!("candidate{candidate_id}attempt{attempt_number}");
        Self {
            attended_count: format!("{ATTENDED_COUNT_FIELD}:{scope}"),
            answered_questions: format!("{ANSWERED_QUESTIONS_KEY}:{scope}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub answered: usize,
    pub total: usize,
    pub newly_answered: bool,
}

impl ProgressUpdate {
    pub fn label(&self) -> String {
        format!("{}/{}", self.answered, self.total)
    }
}

/// Distinct answered questions plus the latest value chosen for each.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    mode: ProgressMode,
    answered: BTreeSet<QuestionId>,
    answers: BTreeMap<QuestionId, String>,
}

impl ProgressTracker {
    pub fn new(total: usize, mode: ProgressMode) -> Self {
        Self {
            total,
            mode,
            answered: BTreeSet::new(),
            answers: BTreeMap::new(),
        }
    }

    /// Rebuilds a tracker from identifiers persisted by an earlier page load.
    /// Only `ProgressMode::Persisted` reads them back.
    pub fn restore(
        total: usize,
        mode: ProgressMode,
        persisted: impl IntoIterator<Item = QuestionId>,
    ) -> Self {
        let mut tracker = Self::new(total, mode);
        if mode == ProgressMode::Persisted {
            tracker.answered.extend(persisted);
        }
        tracker
    }

    pub fn record(&mut self, question: QuestionId, value: impl Into<String>) -> ProgressUpdate {
        self.answers.insert(question.clone(), value.into());
        let newly_answered = self.answered.insert(question);
        ProgressUpdate {
            answered: self.answered.len(),
            total: self.total,
            newly_answered,
        }
    }

    pub fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            answered: self.answered.len(),
            total: self.total,
            newly_answered: false,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn mode(&self) -> ProgressMode {
        self.mode
    }

    pub fn answered_ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.answered.iter()
    }

    pub fn answers(&self) -> &BTreeMap<QuestionId, String> {
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str) -> QuestionId {
        QuestionId::new(id)
    }

    #[test]
    fn counts_distinct_questions_only() {
        let mut t = ProgressTracker::new(10, ProgressMode::Persisted);
        assert!(t.record(q("q_1"), "a").newly_answered);
        assert!(t.record(q("q_2"), "b").newly_answered);
        let u = t.record(q("q_1"), "c");
        assert!(!u.newly_answered);
        assert_eq!(u.answered, 2);
        assert_eq!(u.label(), "2/10");
        assert_eq!(t.answers().get(&q("q_1")).map(String::as_str), Some("c"));
    }

    #[test]
    fn storage_keys_are_scoped_per_attempt() {
        let first = StorageKeys::for_attempt(&CandidateId::new("42"), AttemptNumber(1));
        assert_eq!(first.attended_count, "attended_count:candidate42attempt1");
        assert_eq!(first.answered_questions, "answered_questions:candidate42attempt1");

        let retake = StorageKeys::for_attempt(&CandidateId::new("42"), AttemptNumber(2));
        let other = StorageKeys::for_attempt(&CandidateId::new("43"), AttemptNumber(1));
        assert_ne!(first, retake);
        assert_ne!(first, other);
    }

    #[test]
    fn restore_depends_on_mode() {
        let ids = vec![q("q_1"), q("q_4"), q("q_1")];
        let t = ProgressTracker::restore(5, ProgressMode::Persisted, ids.clone());
        assert_eq!(t.answered_count(), 2);

        let t = ProgressTracker::restore(5, ProgressMode::Ephemeral, ids);
        assert_eq!(t.answered_count(), 0);
    }
}
