use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use examguard_core::submission::SubmissionPayload;
use examguard_core::tab_switch::TabSwitchReport;
use examguard_engine::traits::{ProctorBackend, SessionStorage};
use examguard_providers::upload::VideoArtifact;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    TabSwitch(TabSwitchReport),
    UploadStarted { file_name: String, bytes: usize },
    UploadSettled { ok: bool },
    FormSubmitted(SubmissionPayload),
}

/// Backend that records every call with the (tokio) instant it happened.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    upload_delay: Duration,
    fail_uploads: bool,
    fail_submit: bool,
    events: Mutex<Vec<(Instant, BackendEvent)>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    fn push(&self, event: BackendEvent) {
        self.events.lock().unwrap().push((Instant::now(), event));
    }

    pub fn events(&self) -> Vec<(Instant, BackendEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<(Instant, SubmissionPayload)> {
        self.events()
            .into_iter()
            .filter_map(|(at, e)| match e {
                BackendEvent::FormSubmitted(p) => Some((at, p)),
                _ => None,
            })
            .collect()
    }

    pub fn upload_settled_at(&self) -> Option<Instant> {
        self.events()
            .into_iter()
            .find(|(_, e)| matches!(e, BackendEvent::UploadSettled { .. }))
            .map(|(at, _)| at)
    }

    pub fn upload_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|(_, e)| matches!(e, BackendEvent::UploadStarted { .. }))
            .count()
    }

    pub fn tab_switches(&self) -> Vec<TabSwitchReport> {
        self.events()
            .into_iter()
            .filter_map(|(_, e)| match e {
                BackendEvent::TabSwitch(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ProctorBackend for RecordingBackend {
    async fn report_tab_switch(&self, report: &TabSwitchReport) -> anyhow::Result<()> {
        self.push(BackendEvent::TabSwitch(report.clone()));
        Ok(())
    }

    async fn upload_video(&self, artifact: &VideoArtifact) -> anyhow::Result<String> {
        self.push(BackendEvent::UploadStarted {
            file_name: artifact.file_name(),
            bytes: artifact.bytes.len(),
        });
        if !self.upload_delay.is_zero() {
            tokio::time::sleep(self.upload_delay).await;
        }
        self.push(BackendEvent::UploadSettled {
            ok: !self.fail_uploads,
        });
        if self.fail_uploads {
            anyhow::bail!("network error");
        }
        Ok("Video uploaded to S3".into())
    }

    async fn submit_form(&self, payload: &SubmissionPayload) -> anyhow::Result<()> {
        if self.fail_submit {
            anyhow::bail!("server unavailable");
        }
        self.push(BackendEvent::FormSubmitted(payload.clone()));
        Ok(())
    }
}
