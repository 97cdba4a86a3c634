//! `maestro run <objective>`: start one run and follow it to the end.

use maestro_session::{
    ApiClient, ConsoleEvent, NoticeLevel, SessionCommand, SessionConfig, SessionHandle,
};
use tokio::sync::mpsc;

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the stream so no early frame is missed
    Connecting,
    Starting,
    Running,
}

pub async fn run(
    config: SessionConfig,
    api: ApiClient,
    objective: String,
    name: Option<String>,
) -> anyhow::Result<()> {
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let (handle, task) = SessionHandle::spawn(config, api, events_tx);

    let mut phase = Phase::Connecting;
    let mut start = Some(SessionCommand::StartRun {
        objective,
        project_name: name,
    });
    let mut failure: Option<String> = None;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    failure = Some("session stopped unexpectedly".to_string());
                    break;
                };
                if let Some(line) = render::event_line(&event) {
                    println!("{line}");
                }
                match (&event, phase) {
                    (ConsoleEvent::Connection { open: true }, Phase::Connecting) => {
                        if let Some(command) = start.take() {
                            handle.send(command).await;
                        }
                        phase = Phase::Starting;
                    }
                    (ConsoleEvent::ProjectBound { .. }, Phase::Starting) => {
                        phase = Phase::Running;
                    }
                    (ConsoleEvent::Notice(notice), Phase::Starting)
                        if notice.level == NoticeLevel::Error =>
                    {
                        failure = Some(notice.text.clone());
                        break;
                    }
                    (ConsoleEvent::FinalOutput(_), Phase::Running) => break,
                    _ => {}
                }
            }
            _ = &mut ctrl_c => {
                println!("Interrupted; the run continues on the server.");
                break;
            }
        }
    }

    handle.teardown().await;
    task.await?;

    match failure {
        Some(message) => anyhow::bail!(message),
        None => Ok(()),
    }
}
