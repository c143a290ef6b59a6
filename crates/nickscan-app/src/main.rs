use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::Instrument;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

mod commands;
mod controller;
mod events;
mod profile;
mod state;
mod status;

#[cfg(test)]
mod tests;

use self::controller::AppController;
use self::profile::{ProfileStore, default_profiles_dir};
use self::state::AppState;
use self::status::AppStatus;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Poker nick detector: OCR a profile window, fetch stats, get a read"
)]
struct Cli {
    /// Profile to load from the profiles directory
    #[arg(long, default_value = profile::MAIN_PROFILE)]
    profile: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override the profiles directory
    #[arg(long)]
    profiles_dir: Option<PathBuf>,

    /// Enable the detector at launch and remember it in the profile
    #[arg(long)]
    active: bool,

    /// Do not read commands from stdin
    #[arg(long)]
    no_console: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(atty::is(atty::Stream::Stdout)),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; variables may come from the environment
    let dotenv = dotenvy::dotenv();
    init_tracing(cli.json_logs);
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let session = Uuid::new_v4();
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
        }
    };

    run(cli, shutdown)
        .instrument(tracing::info_span!("session", %session))
        .await
}

async fn run(cli: Cli, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
    let dir = match cli.profiles_dir {
        Some(dir) => dir,
        None => default_profiles_dir()?,
    };
    let store = Arc::new(ProfileStore::new(dir, &cli.profile));
    let config = store.load()?;
    tracing::info!(
        profile = store.name(),
        hotkey = %config.hotkey,
        room = %config.room,
        active = config.detector_enabled,
        "Profile loaded"
    );

    let status = Arc::new(AppStatus::new());
    let controller = AppController::new(Arc::clone(&status));
    let state = AppState::build(config, store, controller.observer())?;

    let console = if cli.no_console {
        None
    } else {
        Some(commands::spawn_stdin_reader()?)
    };
    let mut tasks = controller.spawn_tasks(state.coordinator.clone(), console);
    state.start()?;
    if cli.active && !state.coordinator.is_active() {
        state.coordinator.toggle();
    }

    tokio::select! {
        _ = shutdown => {
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::info!("task finished, shutting down"),
                Ok(Err(e)) => tracing::error!("task failed: {e:#}"),
                Err(e) => tracing::error!("task panicked: {e}"),
            }
        }
    }

    if let Err(e) = state.stop() {
        tracing::error!("Failed to stop detector: {e:#}");
    }
    state.coordinator.wait_idle().await;
    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        if let Ok(Err(e)) = result {
            tracing::error!("task failed during shutdown: {e:#}");
        }
    }

    let summary = status.detection.read().await.clone();
    tracing::info!(
        started = summary.started,
        completed = summary.completed,
        failed = summary.failed,
        last_nick = summary.last_nick.as_deref().unwrap_or("-"),
        "Detector shut down"
    );
    Ok(())
}
