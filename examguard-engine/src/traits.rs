use crate::error::CaptureError;
use async_trait::async_trait;
use examguard_core::countdown::TimerClass;
use examguard_core::submission::SubmissionPayload;
use examguard_core::tab_switch::TabSwitchReport;
use examguard_providers::upload::VideoArtifact;

pub type MediaChunk = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl MediaConstraints {
    pub fn camera_and_microphone() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Opaque handle to a live capture stream owned by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    pub id: String,
}

#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<StreamHandle, CaptureError>;

    fn is_type_supported(&self, mime_type: &str) -> bool;

    fn start_recorder(
        &self,
        stream: &StreamHandle,
        mime_type: &str,
    ) -> anyhow::Result<Box<dyn MediaRecorder>>;

    fn stop_tracks(&self, stream: &StreamHandle);
}

#[async_trait]
pub trait MediaRecorder: Send {
    /// Stops capture and yields every segment delivered since start, in order.
    async fn stop(&mut self) -> anyhow::Result<Vec<MediaChunk>>;

    fn is_recording(&self) -> bool;
}

/// Rendering sink for the test page. Implementations must not block.
pub trait Surface: Send + Sync {
    fn bind_preview(&self, stream: Option<&StreamHandle>);
    fn set_permission_prompt_visible(&self, visible: bool);
    fn show_capture_error(&self, message: &str);
    fn hide_capture_error(&self);
    fn reveal_test(&self);
    fn render_timer(&self, display: &str);
    fn add_timer_class(&self, class: TimerClass);
    fn render_progress(&self, answered: usize, total: usize);
    fn set_hidden_field(&self, name: &str, value: &str);

    /// Disables answer inputs and the submit control.
    fn lock_form(&self);
    fn show_submitted_overlay(&self);
}

/// Per-tab key/value storage that survives a reload.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove_item(&self, key: &str) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ProctorBackend: Send + Sync {
    async fn report_tab_switch(&self, report: &TabSwitchReport) -> anyhow::Result<()>;

    /// Returns the server's human-readable message.
    async fn upload_video(&self, artifact: &VideoArtifact) -> anyhow::Result<String>;

    async fn submit_form(&self, payload: &SubmissionPayload) -> anyhow::Result<()>;
}
