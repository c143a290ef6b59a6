use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use nickscan_config::Config;
use nickscan_core::ConfigStore;
use nickscan_types::{AutoCopyType, DetectionRequest};
use tempfile::TempDir;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::Cli;
use crate::commands::{Command, Outcome, command_loop, execute};
use crate::profile::{MAIN_PROFILE, ProfileStore};
use crate::status::DetectionStatus;
use crate::tests::fakes::{self, TABLE};

#[test]
fn test_parse_commands() {
    assert_eq!("toggle".parse::<Command>().unwrap(), Command::Toggle);
    assert_eq!(" ON ".parse::<Command>().unwrap(), Command::Enable);
    assert_eq!("off".parse::<Command>().unwrap(), Command::Disable);
    assert_eq!(
        "copy".parse::<Command>().unwrap(),
        Command::Copy(AutoCopyType::Both)
    );
    assert_eq!(
        " Copy Analysis ".parse::<Command>().unwrap(),
        Command::Copy(AutoCopyType::Analysis)
    );
    assert_eq!(
        "copy  stats".parse::<Command>().unwrap(),
        Command::Copy(AutoCopyType::Stats)
    );
    assert_eq!("status".parse::<Command>().unwrap(), Command::Status);
    assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
}

#[test]
fn test_cli_launch_flags() {
    let cli = Cli::try_parse_from(["nickscan", "--active", "--no-console"]).unwrap();
    assert!(cli.active);
    assert!(cli.no_console);

    let cli = Cli::try_parse_from(["nickscan"]).unwrap();
    assert!(!cli.active);
    assert!(!cli.no_console);
}

#[test]
fn test_unknown_commands_are_rejected() {
    for line in ["copy everything", "dance", "toggle now", ""] {
        assert!(line.parse::<Command>().is_err(), "{line:?} parsed");
    }
}

#[tokio::test]
async fn test_toggle_persists_to_profile() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ProfileStore::new(dir.path(), MAIN_PROFILE));
    store.init().unwrap();
    let (coordinator, _) = fakes::coordinator(
        Config::default(),
        Some(store.clone() as Arc<dyn ConfigStore>),
    );
    let status = RwLock::new(DetectionStatus::default());

    let outcome = execute(&coordinator, &status, Command::Toggle).await.unwrap();

    assert_eq!(outcome, Outcome::Active(true));
    assert!(coordinator.is_active());
    assert!(store.load().unwrap().detector_enabled);
}

#[tokio::test]
async fn test_on_and_off_are_idempotent() {
    let (coordinator, _) = fakes::coordinator(Config::default(), None);
    let status = RwLock::new(DetectionStatus::default());

    for _ in 0..2 {
        let outcome = execute(&coordinator, &status, Command::Enable).await.unwrap();
        assert_eq!(outcome, Outcome::Active(true));
    }
    assert!(coordinator.config().detector_enabled);

    for _ in 0..2 {
        let outcome = execute(&coordinator, &status, Command::Disable).await.unwrap();
        assert_eq!(outcome, Outcome::Active(false));
    }
    assert!(!coordinator.config().detector_enabled);
}

#[tokio::test]
async fn test_copy_before_any_detection() {
    let (coordinator, clipboard) = fakes::coordinator(Config::default(), None);
    let status = RwLock::new(DetectionStatus::default());

    let outcome = execute(&coordinator, &status, Command::Copy(AutoCopyType::Both))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::NothingToCopy);
    assert!(clipboard.writes.lock().is_empty());
}

#[tokio::test]
async fn test_copy_exports_last_result() {
    let (coordinator, clipboard) = fakes::coordinator(Config::default(), None);
    let status = RwLock::new(DetectionStatus::default());
    coordinator
        .run_detection(DetectionRequest::from_hotkey(TABLE, "Profile: Alice"))
        .await
        .unwrap();

    let outcome = execute(&coordinator, &status, Command::Copy(AutoCopyType::Analysis))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Copied(AutoCopyType::Analysis));
    assert_eq!(
        clipboard.writes.lock().last().map(String::as_str),
        Some("Alice plays tight-aggressive.")
    );
}

#[tokio::test]
async fn test_command_loop_runs_until_quit() {
    let (coordinator, clipboard) = fakes::coordinator(Config::default(), None);
    coordinator
        .run_detection(DetectionRequest::from_hotkey(TABLE, "Profile: Alice"))
        .await
        .unwrap();
    let writes_before = clipboard.writes.lock().len();

    let (tx, rx) = kanal::bounded_async::<String>(8);
    for line in ["on", "", "dance", "copy analysis", "quit", "off"] {
        tx.send(line.to_string()).await.unwrap();
    }

    let status = Arc::new(RwLock::new(DetectionStatus::default()));
    let result = timeout(
        Duration::from_secs(2),
        command_loop(rx, coordinator.clone(), status, CancellationToken::new()),
    )
    .await
    .expect("command loop did not stop on quit");

    assert!(result.is_ok());
    assert!(coordinator.is_active());
    let writes = clipboard.writes.lock();
    assert_eq!(writes.len(), writes_before + 1);
    assert_eq!(writes.last().map(String::as_str), Some("Alice plays tight-aggressive."));
}

#[tokio::test]
async fn test_closed_input_waits_for_cancellation() {
    let (coordinator, _) = fakes::coordinator(Config::default(), None);
    let (tx, rx) = kanal::bounded_async::<String>(1);
    drop(tx);
    let cancel = CancellationToken::new();
    let status = Arc::new(RwLock::new(DetectionStatus::default()));

    let mut task = tokio::spawn(command_loop(rx, coordinator, status, cancel.clone()));

    assert!(
        timeout(Duration::from_millis(50), &mut task).await.is_err(),
        "loop exited before cancellation"
    );

    cancel.cancel();
    let result = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert!(result.is_ok());
}
