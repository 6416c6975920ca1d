use std::sync::Arc;

use async_trait::async_trait;
use examguard_core::types::QuestionId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::CaptureError;
use crate::gate::GateDecision;

/// Discrete events raised by the test page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    AnswerChanged { question: QuestionId, value: String },
    VisibilityChanged { hidden: bool },
    SubmitRequested,
    RetryRequested,
}

#[async_trait]
pub trait SessionEvents: Send + Sync {
    async fn on_answer_changed(&self, question: QuestionId, value: String);
    async fn on_visibility_changed(&self, hidden: bool);
    async fn on_submit_requested(&self) -> GateDecision;
    async fn on_retry_requested(&self) -> Result<(), CaptureError>;
}

/// Drains host events into a `SessionEvents` target until the sender side closes.
pub struct EventPump;

impl EventPump {
    pub fn spawn<T>(target: Arc<T>, mut rx: mpsc::Receiver<HostEvent>) -> JoinHandle<()>
    where
        T: SessionEvents + 'static,
    {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    HostEvent::AnswerChanged { question, value } => {
                        target.on_answer_changed(question, value).await;
                    }
                    HostEvent::VisibilityChanged { hidden } => {
                        target.on_visibility_changed(hidden).await;
                    }
                    // Both may suspend for a long time; keep draining meanwhile.
                    HostEvent::SubmitRequested => {
                        let target = target.clone();
                        tokio::spawn(async move {
                            target.on_submit_requested().await;
                        });
                    }
                    HostEvent::RetryRequested => {
                        let target = target.clone();
                        tokio::spawn(async move {
                            if let Err(e) = target.on_retry_requested().await {
                                log::debug!("webcam retry failed: {e}");
                            }
                        });
                    }
                }
            }
            log::debug!("host event channel closed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Target {
        answers: Mutex<Vec<String>>,
        retries: AtomicUsize,
    }

    #[async_trait]
    impl SessionEvents for Target {
        async fn on_answer_changed(&self, question: QuestionId, _value: String) {
            self.answers.lock().unwrap().push(question.as_str().to_string());
        }

        async fn on_visibility_changed(&self, _hidden: bool) {}

        async fn on_submit_requested(&self) -> GateDecision {
            GateDecision::NotReady
        }

        async fn on_retry_requested(&self) -> Result<(), CaptureError> {
            self.retries.fetch_add(1, Ordering::SeqCst);
            Err(CaptureError::NoDevice)
        }
    }

    #[tokio::test]
    async fn failed_retry_does_not_stop_the_pump() {
        let target = Arc::new(Target::default());
        let (tx, rx) = mpsc::channel(8);
        let pump = EventPump::spawn(target.clone(), rx);

        tx.send(HostEvent::RetryRequested).await.unwrap();
        tx.send(HostEvent::RetryRequested).await.unwrap();
        tx.send(HostEvent::AnswerChanged {
            question: QuestionId::new("q_1"),
            value: "A".into(),
        })
        .await
        .unwrap();
        drop(tx);
        pump.await.unwrap();

        // Retries run on their own tasks; give them a moment to finish.
        for _ in 0..100 {
            if target.retries.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(target.retries.load(Ordering::SeqCst), 2);
        assert_eq!(target.answers.lock().unwrap().as_slice(), &["q_1".to_string()]);
    }
}
