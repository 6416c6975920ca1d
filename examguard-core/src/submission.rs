use crate::progress::{ATTENDED_COUNT_FIELD, ProgressTracker};
use serde::{Deserialize, Serialize};

/// Form state sent with the one and only native submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub hidden_fields: Vec<(String, String)>,
    pub answers: Vec<(String, String)>,
    pub attended_count: usize,
}

impl SubmissionPayload {
    /// Captures the tracker as it is right now, not as it was at answer time.
    pub fn capture(hidden_fields: &[(String, String)], progress: &ProgressTracker) -> Self {
        Self {
            hidden_fields: hidden_fields.to_vec(),
            answers: progress
                .answers()
                .iter()
                .map(|(q, v)| (q.as_str().to_string(), v.clone()))
                .collect(),
            attended_count: progress.answered_count(),
        }
    }

    /// Form fields in document order: static inputs, answers, then the injected count.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.hidden_fields.len() + self.answers.len() + 1);
        out.extend(self.hidden_fields.iter().cloned());
        out.extend(self.answers.iter().cloned());
        out.push((ATTENDED_COUNT_FIELD.into(), self.attended_count.to_string()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProgressMode;
    use crate::types::QuestionId;

    #[test]
    fn count_is_appended_after_answers() {
        let mut t = ProgressTracker::new(3, ProgressMode::Ephemeral);
        t.record(QuestionId::new("q_2"), "B");
        t.record(QuestionId::new("q_1"), "A");

        let p = SubmissionPayload::capture(&[("current_set".into(), "1".into())], &t);
        assert_eq!(p.attended_count, 2);
        assert_eq!(
            p.fields(),
            vec![
                ("current_set".to_string(), "1".to_string()),
                ("q_1".to_string(), "A".to_string()),
                ("q_2".to_string(), "B".to_string()),
                ("attended_count".to_string(), "2".to_string()),
            ]
        );
    }
}
