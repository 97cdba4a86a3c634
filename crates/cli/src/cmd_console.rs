//! `maestro console`: interactive session.
//!
//! Plain lines are guidance for the bound project; lines starting with `/`
//! are console commands.

use std::io::BufRead;

use maestro_session::{ApiClient, ConsoleEvent, SessionCommand, SessionConfig, SessionHandle};
use tokio::sync::mpsc;

use crate::render;

const HELP: &str = "\
Commands:
  <text>               send guidance to the bound project
  /start <objective>   start a new run
  /name <name>         name the next run (no argument clears it)
  /projects            list saved projects
  /open <path>         open a saved project and bind it
  /delete <path>       delete a saved project (asks first)
  /console             back to the console view
  /clear               reset every agent to idle
  /status              connection, project and agent board
  /pull <model>        download an Ollama model
  /help                this text
  /quit                leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Guidance(String),
    Start(String),
    Name(Option<String>),
    Projects,
    Open(String),
    Delete(String),
    Console,
    Clear,
    Status,
    Pull(String),
    Help,
    Quit,
    Empty,
    /// A known command missing its argument
    Usage(&'static str),
    Unknown(String),
}

pub fn parse_line(line: &str) -> ConsoleInput {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ConsoleInput::Guidance(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let required = |usage: &'static str, build: fn(String) -> ConsoleInput| {
        if arg.is_empty() {
            ConsoleInput::Usage(usage)
        } else {
            build(arg.to_string())
        }
    };

    match name.to_ascii_lowercase().as_str() {
        "start" => required("/start <objective>", ConsoleInput::Start),
        "name" => ConsoleInput::Name((!arg.is_empty()).then(|| arg.to_string())),
        "projects" => ConsoleInput::Projects,
        "open" => required("/open <path>", ConsoleInput::Open),
        "delete" => required("/delete <path>", ConsoleInput::Delete),
        "console" => ConsoleInput::Console,
        "clear" => ConsoleInput::Clear,
        "status" => ConsoleInput::Status,
        "pull" => required("/pull <model>", ConsoleInput::Pull),
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" => ConsoleInput::Quit,
        other => ConsoleInput::Unknown(other.to_string()),
    }
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run(config: SessionConfig, api: ApiClient) -> anyhow::Result<()> {
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let (handle, task) = SessionHandle::spawn(config, api, events_tx);
    let mut input = spawn_stdin_reader();

    println!();
    println!("  Maestro console v{}", crate::VERSION);
    println!("  Type /help for commands.");
    println!();

    let mut next_name: Option<String> = None;
    let mut awaiting_delete = false;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if matches!(event, ConsoleEvent::ConfirmDelete { .. }) {
                    awaiting_delete = true;
                }
                if let Some(line) = render::event_line(&event) {
                    println!("{line}");
                }
            }
            line = input.recv() => {
                let Some(line) = line else {
                    break;
                };
                if awaiting_delete {
                    awaiting_delete = false;
                    handle
                        .send(SessionCommand::ConfirmDelete {
                            confirmed: is_yes(&line),
                        })
                        .await;
                    continue;
                }
                if !dispatch(&handle, parse_line(&line), &mut next_name).await {
                    break;
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    handle.teardown().await;
    let exit = task.await?;
    tracing::info!(
        component = "cli",
        event = "cli.console.exit",
        session_id = %handle.id,
        aborted_requests = exit.aborted_requests,
        aborted_polls = exit.aborted_polls,
    );
    Ok(())
}

/// Returns `false` when the console should exit.
async fn dispatch(
    handle: &SessionHandle,
    input: ConsoleInput,
    next_name: &mut Option<String>,
) -> bool {
    let command = match input {
        ConsoleInput::Quit => return false,
        ConsoleInput::Empty => return true,
        ConsoleInput::Help => {
            println!("{HELP}");
            return true;
        }
        ConsoleInput::Status => {
            println!("{}", render::status(&handle.snapshot()));
            return true;
        }
        ConsoleInput::Name(name) => {
            match &name {
                Some(name) => println!("Next run will be named {name}"),
                None => println!("Next run will use the server's default name"),
            }
            *next_name = name;
            return true;
        }
        ConsoleInput::Usage(usage) => {
            println!("Usage: {usage}");
            return true;
        }
        ConsoleInput::Unknown(name) => {
            println!("Unknown command /{name}. Type /help for the list.");
            return true;
        }
        ConsoleInput::Guidance(text) => SessionCommand::Guidance { text },
        ConsoleInput::Start(objective) => SessionCommand::StartRun {
            objective,
            project_name: next_name.take(),
        },
        ConsoleInput::Projects => SessionCommand::ShowProjects,
        ConsoleInput::Open(id) => SessionCommand::OpenProject { id },
        ConsoleInput::Delete(id) => SessionCommand::RequestDelete { id },
        ConsoleInput::Console => SessionCommand::ShowConsole,
        ConsoleInput::Clear => SessionCommand::ClearBoard,
        ConsoleInput::Pull(model) => SessionCommand::PullModel { model },
    };
    handle.send(command).await;
    true
}
