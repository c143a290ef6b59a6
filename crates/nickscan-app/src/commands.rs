use std::io::BufRead;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, bail};
use kanal::AsyncReceiver;
use nickscan_core::DetectionCoordinator;
use nickscan_types::AutoCopyType;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::status::DetectionStatus;

const USAGE: &str = "commands: toggle, on, off, copy [stats|analysis|both], status, quit";

/// Console commands, one per line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Enable,
    Disable,
    Copy(AutoCopyType),
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let line = line.trim().to_lowercase();
        let words: Vec<&str> = line.split_whitespace().collect();

        let command = match words.as_slice() {
            ["toggle"] => Command::Toggle,
            ["on"] => Command::Enable,
            ["off"] => Command::Disable,
            ["copy"] => Command::Copy(AutoCopyType::Both),
            ["copy", "stats"] => Command::Copy(AutoCopyType::Stats),
            ["copy", "analysis"] => Command::Copy(AutoCopyType::Analysis),
            ["copy", "both"] => Command::Copy(AutoCopyType::Both),
            ["status"] => Command::Status,
            ["quit" | "exit"] => Command::Quit,
            _ => bail!("unknown command '{line}'"),
        };
        Ok(command)
    }
}

/// What a command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Active(bool),
    Copied(AutoCopyType),
    NothingToCopy,
    Reported,
    Quit,
}

pub async fn execute(
    coordinator: &DetectionCoordinator,
    status: &RwLock<DetectionStatus>,
    command: Command,
) -> anyhow::Result<Outcome> {
    let outcome = match command {
        Command::Toggle => Outcome::Active(coordinator.toggle()),
        Command::Enable | Command::Disable => {
            let wanted = command == Command::Enable;
            if coordinator.is_active() != wanted {
                coordinator.toggle();
            }
            Outcome::Active(coordinator.is_active())
        }
        Command::Copy(kind) => {
            if coordinator.export_last(kind).await? {
                Outcome::Copied(kind)
            } else {
                Outcome::NothingToCopy
            }
        }
        Command::Status => {
            let status = status.read().await;
            tracing::info!(
                active = coordinator.is_active(),
                started = status.started,
                completed = status.completed,
                failed = status.failed,
                last_nick = status.last_nick.as_deref().unwrap_or("-"),
                "{}",
                status.current_message
            );
            Outcome::Reported
        }
        Command::Quit => Outcome::Quit,
    };

    match outcome {
        Outcome::Active(active) => tracing::info!(active, "Detector {}", on_off(active)),
        Outcome::Copied(kind) => tracing::info!(?kind, "Copied last result to clipboard"),
        Outcome::NothingToCopy => tracing::info!("Nothing detected yet"),
        Outcome::Reported | Outcome::Quit => {}
    }
    Ok(outcome)
}

fn on_off(active: bool) -> &'static str {
    if active { "enabled" } else { "disabled" }
}

/// Lines typed on stdin, read on a detached thread
pub fn spawn_stdin_reader() -> anyhow::Result<AsyncReceiver<String>> {
    let (tx, rx) = kanal::bounded::<String>(16);
    std::thread::Builder::new()
        .name("nickscan-console".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to spawn console thread")?;
    Ok(rx.to_async())
}

/// Runs console commands until `quit` or cancellation.
///
/// Closed input (no console attached) leaves the app running until cancelled.
pub async fn command_loop(
    input: AsyncReceiver<String>,
    coordinator: DetectionCoordinator,
    status: Arc<RwLock<DetectionStatus>>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!("[COMMANDS] {USAGE}");
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            line = input.recv() => line,
        };
        let Ok(line) = line else {
            tracing::debug!("[COMMANDS] Input closed");
            cancel.cancelled().await;
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("{e}; {USAGE}");
                continue;
            }
        };

        match execute(&coordinator, &status, command).await {
            Ok(Outcome::Quit) => {
                tracing::info!("[COMMANDS] Quit requested");
                return Ok(());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("{command:?} failed: {e:#}"),
        }
    }
}
