use examguard_core::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid session config: {0}")]
    Config(#[from] ConfigError),
}

/// Failures that keep the candidate from starting the test.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera or microphone permission denied")]
    PermissionDenied,

    #[error("no camera or microphone found")]
    NoDevice,

    #[error("media capture is not supported by this browser")]
    Unsupported,

    #[error("capture session already closed")]
    SessionClosed,

    #[error("media capture failed: {0}")]
    Other(String),
}

impl CaptureError {
    /// Short, actionable text for the error banner. Details go to the log.
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::PermissionDenied => {
                "Webcam error: camera and microphone access was blocked. Allow access and retry."
                    .into()
            }
            CaptureError::NoDevice => {
                "Webcam error: no camera or microphone detected. Connect one and retry.".into()
            }
            CaptureError::Unsupported => {
                "Webcam error: this browser cannot capture video. Use a supported browser.".into()
            }
            CaptureError::SessionClosed => "Webcam error: the test has already ended.".into(),
            CaptureError::Other(msg) => format!("Webcam error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_text_is_prefixed() {
        assert!(CaptureError::NoDevice.user_message().starts_with("Webcam error:"));
        assert_eq!(
            CaptureError::Other("device busy".into()).user_message(),
            "Webcam error: device busy"
        );
    }
}
