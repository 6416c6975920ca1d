use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use examguard_core::config::ProgressMode;
use examguard_core::progress::{ATTENDED_COUNT_FIELD, ProgressTracker, ProgressUpdate, StorageKeys};
use examguard_core::submission::SubmissionPayload;
use examguard_core::types::QuestionId;

use crate::traits::{SessionStorage, Surface};

/// Binds the pure tracker to the page: progress label, storage, hidden field.
pub struct AnswerProgress {
    tracker: Mutex<ProgressTracker>,
    keys: StorageKeys,
    surface: Arc<dyn Surface>,
    storage: Arc<dyn SessionStorage>,
}

impl AnswerProgress {
    pub fn new(
        total: usize,
        mode: ProgressMode,
        keys: StorageKeys,
        surface: Arc<dyn Surface>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let restored = match mode {
            ProgressMode::Persisted => load_answered(storage.as_ref(), &keys.answered_questions),
            ProgressMode::Ephemeral => Vec::new(),
        };
        if !restored.is_empty() {
            log::info!("restored {} answered questions from storage", restored.len());
        }

        Self {
            tracker: Mutex::new(ProgressTracker::restore(total, mode, restored)),
            keys,
            surface,
            storage,
        }
    }

    fn tracker(&self) -> MutexGuard<'_, ProgressTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Initial render of the progress label and the hidden count field.
    pub fn start(&self) {
        let (update, mode, ids) = {
            let t = self.tracker();
            (t.snapshot(), t.mode(), answered_json(&t))
        };
        self.publish(update, mode, ids);
    }

    pub fn record(&self, question: QuestionId, value: String) -> ProgressUpdate {
        let (update, mode, ids) = {
            let mut t = self.tracker();
            let update = t.record(question, value);
            (update, t.mode(), answered_json(&t))
        };
        self.publish(update, mode, ids);
        update
    }

    pub fn answered_count(&self) -> usize {
        self.tracker().answered_count()
    }

    /// Mirrors the current count into the form and returns the payload to send.
    pub fn capture_payload(&self, hidden_fields: &[(String, String)]) -> SubmissionPayload {
        let payload = SubmissionPayload::capture(hidden_fields, &self.tracker());
        self.surface.set_hidden_field(
            ATTENDED_COUNT_FIELD,
            &payload.attended_count.to_string(),
        );
        payload
    }

    fn publish(&self, update: ProgressUpdate, mode: ProgressMode, ids: Option<String>) {
        self.surface.render_progress(update.answered, update.total);

        let count = update.answered.to_string();
        if let Err(e) = self.storage.set_item(&self.keys.attended_count, &count) {
            log::warn!("failed to persist attended count: {e:#}");
        }
        if mode == ProgressMode::Persisted {
            if let Some(ids) = ids {
                if let Err(e) = self.storage.set_item(&self.keys.answered_questions, &ids) {
                    log::warn!("failed to persist answered questions: {e:#}");
                }
            }
        }

        self.surface.set_hidden_field(ATTENDED_COUNT_FIELD, &count);
    }

    /// Drops this attempt's stored progress once the server has the form.
    pub fn forget(&self) {
        for key in [&self.keys.attended_count, &self.keys.answered_questions] {
            if let Err(e) = self.storage.remove_item(key) {
                log::warn!("failed to clear {key} from storage: {e:#}");
            }
        }
    }
}

fn answered_json(tracker: &ProgressTracker) -> Option<String> {
    let ids: Vec<&str> = tracker.answered_ids().map(QuestionId::as_str).collect();
    match serde_json::to_string(&ids) {
        Ok(json) => Some(json),
        Err(e) => {
            log::warn!("failed to encode answered questions: {e}");
            None
        }
    }
}

fn load_answered(storage: &dyn SessionStorage, key: &str) -> Vec<QuestionId> {
    let Some(raw) = storage.get_item(key) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => ids.into_iter().map(QuestionId::new).collect(),
        Err(e) => {
            log::warn!("ignoring unreadable answered questions in storage: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examguard_core::countdown::TimerClass;
    use examguard_core::types::{AttemptNumber, CandidateId};
    use std::collections::HashMap;

    use crate::traits::StreamHandle;

    #[derive(Default)]
    struct Page {
        progress: Mutex<Vec<(usize, usize)>>,
        hidden: Mutex<HashMap<String, String>>,
    }

    impl Surface for Page {
        fn bind_preview(&self, _stream: Option<&StreamHandle>) {}
        fn set_permission_prompt_visible(&self, _visible: bool) {}
        fn show_capture_error(&self, _message: &str) {}
        fn hide_capture_error(&self) {}
        fn reveal_test(&self) {}
        fn render_timer(&self, _display: &str) {}
        fn add_timer_class(&self, _class: TimerClass) {}
        fn render_progress(&self, answered: usize, total: usize) {
            self.progress.lock().unwrap().push((answered, total));
        }
        fn set_hidden_field(&self, name: &str, value: &str) {
            self.hidden
                .lock()
                .unwrap()
                .insert(name.to_string(), value.to_string());
        }
        fn lock_form(&self) {}
        fn show_submitted_overlay(&self) {}
    }

    #[derive(Default)]
    struct Store(Mutex<HashMap<String, String>>);

    impl SessionStorage for Store {
        fn get_item(&self, key: &str) -> Option<String> {
            self.0.lock().unwrap().get(key).cloned()
        }

        fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.0
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove_item(&self, key: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn keys(attempt: u32) -> StorageKeys {
        StorageKeys::for_attempt(&CandidateId::new("7"), AttemptNumber(attempt))
    }

    fn progress(total: usize, mode: ProgressMode, attempt: u32, store: &Arc<Store>) -> AnswerProgress {
        AnswerProgress::new(
            total,
            mode,
            keys(attempt),
            Arc::new(Page::default()),
            store.clone(),
        )
    }

    #[test]
    fn start_renders_zero_and_initializes_storage() {
        let page = Arc::new(Page::default());
        let store = Arc::new(Store::default());
        let p = AnswerProgress::new(
            10,
            ProgressMode::Persisted,
            keys(1),
            page.clone(),
            store.clone(),
        );
        p.start();

        assert_eq!(page.progress.lock().unwrap().as_slice(), &[(0, 10)]);
        assert_eq!(store.get_item(&keys(1).attended_count).as_deref(), Some("0"));
        assert_eq!(
            page.hidden.lock().unwrap().get("attended_count").map(String::as_str),
            Some("0")
        );
    }

    #[test]
    fn repeated_answers_do_not_inflate_count() {
        let store = Arc::new(Store::default());
        let p = progress(4, ProgressMode::Persisted, 1, &store);

        p.record(QuestionId::new("q_1"), "A".into());
        p.record(QuestionId::new("q_1"), "B".into());
        let u = p.record(QuestionId::new("q_3"), "C".into());

        assert_eq!(u.answered, 2);
        assert_eq!(store.get_item(&keys(1).attended_count).as_deref(), Some("2"));
        assert_eq!(
            store.get_item(&keys(1).answered_questions).as_deref(),
            Some(r#"["q_1","q_3"]"#)
        );

        let payload = p.capture_payload(&[]);
        assert_eq!(payload.attended_count, 2);
        assert_eq!(payload.answers[0], ("q_1".to_string(), "B".to_string()));
    }

    #[test]
    fn persisted_mode_survives_reload_but_ephemeral_does_not() {
        let store = Arc::new(Store::default());
        store
            .set_item(&keys(1).answered_questions, r#"["q_1","q_2"]"#)
            .unwrap();

        let p = progress(5, ProgressMode::Persisted, 1, &store);
        assert_eq!(p.answered_count(), 2);

        let p = progress(5, ProgressMode::Ephemeral, 1, &store);
        assert_eq!(p.answered_count(), 0);
        p.record(QuestionId::new("q_9"), "x".into());
        assert_eq!(
            store.get_item(&keys(1).answered_questions).as_deref(),
            Some(r#"["q_1","q_2"]"#)
        );
    }

    #[test]
    fn other_attempts_never_see_stored_answers() {
        let store = Arc::new(Store::default());
        let first = progress(5, ProgressMode::Persisted, 1, &store);
        first.record(QuestionId::new("q_1"), "A".into());

        let retake = progress(5, ProgressMode::Persisted, 2, &store);
        assert_eq!(retake.answered_count(), 0);
    }

    #[test]
    fn forget_clears_only_this_attempt() {
        let store = Arc::new(Store::default());
        let first = progress(5, ProgressMode::Persisted, 1, &store);
        let second = progress(5, ProgressMode::Persisted, 2, &store);
        first.record(QuestionId::new("q_1"), "A".into());
        second.record(QuestionId::new("q_2"), "B".into());

        first.forget();
        assert_eq!(store.get_item(&keys(1).attended_count), None);
        assert_eq!(store.get_item(&keys(1).answered_questions), None);
        assert_eq!(store.get_item(&keys(2).attended_count).as_deref(), Some("1"));
        assert_eq!(progress(5, ProgressMode::Persisted, 1, &store).answered_count(), 0);
    }
}
