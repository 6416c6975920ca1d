use std::collections::HashMap;
use std::sync::Mutex;

use examguard_core::countdown::TimerClass;
use examguard_engine::traits::{StreamHandle, Surface};

/// Visible state of a headless test page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    pub preview: Option<String>,
    pub permission_prompt_visible: bool,
    pub error_banner: Option<String>,
    pub retry_visible: bool,
    pub test_visible: bool,
    pub timer_text: Option<String>,
    pub timer_classes: Vec<TimerClass>,
    pub progress_text: Option<String>,
    pub hidden_fields: HashMap<String, String>,
    pub form_locked: bool,
    pub overlay_visible: bool,
}

/// A `Surface` that keeps the page in memory and logs renders at trace level.
#[derive(Debug)]
pub struct HeadlessPage {
    state: Mutex<PageState>,
}

impl Default for HeadlessPage {
    fn default() -> Self {
        Self {
            state: Mutex::new(PageState {
                permission_prompt_visible: true,
                ..Default::default()
            }),
        }
    }
}

impl HeadlessPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PageState {
        self.state.lock().unwrap().clone()
    }

    pub fn hidden_field(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().hidden_fields.get(name).cloned()
    }

    fn update(&self, f: impl FnOnce(&mut PageState)) {
        f(&mut self.state.lock().unwrap());
    }
}

impl Surface for HeadlessPage {
    fn bind_preview(&self, stream: Option<&StreamHandle>) {
        let id = stream.map(|s| s.id.clone());
        self.update(|s| s.preview = id);
    }

    fn set_permission_prompt_visible(&self, visible: bool) {
        self.update(|s| s.permission_prompt_visible = visible);
    }

    fn show_capture_error(&self, message: &str) {
        self.update(|s| {
            s.error_banner = Some(message.to_string());
            s.retry_visible = true;
        });
    }

    fn hide_capture_error(&self) {
        self.update(|s| {
            s.error_banner = None;
            s.retry_visible = false;
        });
    }

    fn reveal_test(&self) {
        self.update(|s| s.test_visible = true);
    }

    fn render_timer(&self, display: &str) {
        log::trace!("timer {display}");
        self.update(|s| s.timer_text = Some(format!("Time Remaining: {display}")));
    }

    fn add_timer_class(&self, class: TimerClass) {
        self.update(|s| {
            if !s.timer_classes.contains(&class) {
                s.timer_classes.push(class);
            }
        });
    }

    fn render_progress(&self, answered: usize, total: usize) {
        self.update(|s| {
            s.progress_text = Some(format!(
                "Progress: {answered}/{total} questions answered"
            ))
        });
    }

    fn set_hidden_field(&self, name: &str, value: &str) {
        self.update(|s| {
            s.hidden_fields.insert(name.to_string(), value.to_string());
        });
    }

    fn lock_form(&self) {
        self.update(|s| s.form_locked = true);
    }

    fn show_submitted_overlay(&self) {
        self.update(|s| s.overlay_visible = true);
    }
}
