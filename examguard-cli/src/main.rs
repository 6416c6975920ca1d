use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use examguard_core::config::SessionConfig;
use examguard_core::types::{AttemptNumber, CandidateId, QuestionId};
use examguard_engine::controller::{HostBindings, ProctorController};
use examguard_engine::events::{HostEvent, SessionEvents};
use examguard_engine::gate::GateDecision;
use examguard_engine::traits::SessionStorage;
use examguard_platform::media::ScriptedMediaDevices;
use examguard_platform::surface::HeadlessPage;
use examguard_platform::test::MemoryStorage;
use examguard_runtime::{ConfigStore, FileSessionStorage, HttpProctorBackend};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Answer { question: String, value: String },
    Hide,
    Show,
    Submit,
    Retry,
    Status,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let cmd = match parts.next()? {
            "answer" => {
                let question = parts.next()?.to_string();
                let value = parts.collect::<Vec<_>>().join(" ");
                if value.is_empty() {
                    return None;
                }
                Command::Answer { question, value }
            }
            "hide" => Command::Hide,
            "show" => Command::Show,
            "submit" => Command::Submit,
            "retry" => Command::Retry,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            _ => return None,
        };
        Some(cmd)
    }
}

fn load_config() -> anyhow::Result<SessionConfig> {
    let mut cfg = match std::env::var("EXAMGUARD_CONFIG") {
        Ok(path) => ConfigStore::at_path(path).load()?,
        Err(_) => {
            let candidate =
                std::env::var("EXAMGUARD_CANDIDATE_ID").unwrap_or_else(|_| "1".into());
            SessionConfig::new(
                CandidateId::new(candidate),
                AttemptNumber(1),
                10,
                "http://localhost:5000",
            )
        }
    };

    if let Ok(url) = std::env::var("EXAMGUARD_BACKEND_URL") {
        cfg.backend_url = url;
    }
    cfg.validate().context("session config")?;
    Ok(cfg)
}

fn open_storage() -> anyhow::Result<Arc<dyn SessionStorage>> {
    Ok(match std::env::var("EXAMGUARD_STORAGE") {
        Ok(path) => Arc::new(FileSessionStorage::open(path)?),
        Err(_) => Arc::new(MemoryStorage::default()),
    })
}

fn report(decision: &GateDecision) {
    match decision {
        GateDecision::Submitted { trigger, upload } => {
            println!("submitted ({trigger:?}); upload: {upload:?}")
        }
        GateDecision::AlreadySubmitted => println!("already submitted"),
        GateDecision::NotReady => println!("test not shown yet; grant the webcam first"),
        GateDecision::SubmitFailed { error, .. } => println!("submission failed: {error}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cfg = load_config()?;
    let backend = Arc::new(HttpProctorBackend::from_config(&cfg)?);
    let page = Arc::new(HeadlessPage::new());
    let controller = Arc::new(ProctorController::new(
        cfg,
        HostBindings {
            devices: Arc::new(ScriptedMediaDevices::granting()),
            surface: page.clone(),
            storage: open_storage()?,
            backend,
        },
    )?);

    let (tx, rx) = mpsc::channel(64);
    controller.attach_events(rx);

    if let Err(e) = controller.start().await {
        println!("{}", e.user_message());
    }
    println!("commands: answer <question> <value> | hide | show | submit | retry | status | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("read stdin")? else { break };
                match Command::parse(&line) {
                    Some(Command::Answer { question, value }) => {
                        let event = HostEvent::AnswerChanged { question: QuestionId::new(question), value };
                        tx.send(event).await.context("host event channel closed")?;
                    }
                    Some(Command::Hide) => {
                        tx.send(HostEvent::VisibilityChanged { hidden: true }).await?;
                    }
                    Some(Command::Show) => {
                        tx.send(HostEvent::VisibilityChanged { hidden: false }).await?;
                    }
                    Some(Command::Submit) => {
                        let decision = controller.on_submit_requested().await;
                        report(&decision);
                        if decision.is_submitted() {
                            break;
                        }
                    }
                    Some(Command::Retry) => {
                        if let Err(e) = controller.on_retry_requested().await {
                            println!("{}", e.user_message());
                        }
                    }
                    Some(Command::Status) => {
                        let state = page.state();
                        println!("{:?}", controller.snapshot());
                        println!(
                            "{} | {}",
                            state.timer_text.unwrap_or_default(),
                            state.progress_text.unwrap_or_default()
                        );
                    }
                    Some(Command::Quit) => break,
                    None => println!("unrecognized command: {line}"),
                }
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                if controller.is_submitted() {
                    if let Some(decision) = controller.auto_submission().await {
                        report(&decision);
                    }
                    break;
                }
            }
        }
    }

    controller.teardown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_answer_with_spaces_in_value() {
        assert_eq!(
            Command::parse("answer q_3 Paris, France"),
            Some(Command::Answer {
                question: "q_3".into(),
                value: "Paris, France".into()
            })
        );
    }

    #[test]
    fn rejects_incomplete_or_unknown_commands() {
        assert_eq!(Command::parse("answer q_3"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("dance"), None);
        assert_eq!(Command::parse("  submit "), Some(Command::Submit));
    }
}
