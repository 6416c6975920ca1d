use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use examguard_engine::error::CaptureError;
use examguard_engine::traits::{
    MediaChunk, MediaConstraints, MediaDevices, MediaRecorder, StreamHandle,
};

/// Media devices whose permission answers are scripted up front.
///
/// Each `get_user_media` call pops the next scripted failure; once the script
/// is exhausted, access is granted.
#[derive(Debug)]
pub struct ScriptedMediaDevices {
    failures: Mutex<VecDeque<CaptureError>>,
    webm_supported: bool,
    segments: Vec<MediaChunk>,
    next_stream: AtomicU32,
    recorders_started: AtomicUsize,
    stopped_streams: Mutex<Vec<String>>,
}

impl Default for ScriptedMediaDevices {
    fn default() -> Self {
        Self {
            failures: Mutex::new(VecDeque::new()),
            webm_supported: true,
            segments: vec![b"webm-header".to_vec(), b"cluster-1".to_vec()],
            next_stream: AtomicU32::new(1),
            recorders_started: AtomicUsize::new(0),
            stopped_streams: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedMediaDevices {
    pub fn granting() -> Self {
        Self::default()
    }

    pub fn failing_first(failures: impl IntoIterator<Item = CaptureError>) -> Self {
        Self {
            failures: Mutex::new(failures.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn without_webm(mut self) -> Self {
        self.webm_supported = false;
        self
    }

    pub fn with_segments(mut self, segments: Vec<MediaChunk>) -> Self {
        self.segments = segments;
        self
    }

    pub fn recorders_started(&self) -> usize {
        self.recorders_started.load(Ordering::SeqCst)
    }

    pub fn stopped_streams(&self) -> Vec<String> {
        self.stopped_streams.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDevices for ScriptedMediaDevices {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<StreamHandle, CaptureError> {
        if !constraints.video {
            return Err(CaptureError::Other("video track required".into()));
        }
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let n = self.next_stream.fetch_add(1, Ordering::SeqCst);
        Ok(StreamHandle {
            id: format!("stream-{n}"),
        })
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.webm_supported && mime_type == "video/webm"
    }

    fn start_recorder(
        &self,
        _stream: &StreamHandle,
        _mime_type: &str,
    ) -> anyhow::Result<Box<dyn MediaRecorder>> {
        self.recorders_started.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticRecorder {
            segments: self.segments.clone(),
            recording: true,
        }))
    }

    fn stop_tracks(&self, stream: &StreamHandle) {
        self.stopped_streams.lock().unwrap().push(stream.id.clone());
    }
}

/// Delivers a fixed set of segments when stopped.
#[derive(Debug)]
pub struct SyntheticRecorder {
    segments: Vec<MediaChunk>,
    recording: bool,
}

#[async_trait]
impl MediaRecorder for SyntheticRecorder {
    async fn stop(&mut self) -> anyhow::Result<Vec<MediaChunk>> {
        if !self.recording {
            anyhow::bail!("recorder already stopped");
        }
        self.recording = false;
        Ok(std::mem::take(&mut self.segments))
    }

    fn is_recording(&self) -> bool {
        self.recording
    }
}
