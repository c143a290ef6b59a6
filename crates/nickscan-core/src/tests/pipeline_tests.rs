use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

use nickscan_config::Config;
use nickscan_types::{
    AnalysisResult, AutoCopyType, DetectionRequest, OcrRegion, PlayerStats, Point, StatValue,
    WindowHandle, WindowRect,
};

use super::fakes::{Harness, active_config};
use crate::coordinator::DetectionCoordinator;
use crate::error::ErrorKind;
use crate::services::RemoteError;
use crate::state::DetectorPhase;

const ALICE: WindowHandle = WindowHandle(42);

fn coordinator(harness: &Harness, config: Config) -> DetectionCoordinator {
    DetectionCoordinator::new(config, harness.services(), harness.hooks())
}

fn hotkey_request(handle: WindowHandle) -> DetectionRequest {
    DetectionRequest::from_hotkey(handle, "Profile: Alice")
}

#[tokio::test]
async fn test_successful_detection_caches_and_notifies_in_order() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    harness.windows.rects.lock().insert(
        ALICE,
        WindowRect {
            x: 0,
            y: 0,
            width: 1000,
            height: 500,
        },
    );
    let detector = coordinator(&harness, active_config());

    let result = detector.run_detection(hotkey_request(ALICE)).await.unwrap();

    let expected = AnalysisResult {
        nick: "Alice".into(),
        stats: PlayerStats {
            nick: "Alice".into(),
            vpip: Some(StatValue::Int(24)),
            pfr: Some(StatValue::Int(18)),
            three_bet: Some(StatValue::Int(8)),
            fold_to_3bet: Some(StatValue::Int(55)),
            wtsd: Some(StatValue::Int(28)),
            wsd: Some(StatValue::Int(52)),
            total_hands: Some(StatValue::Int(1200)),
            extra: BTreeMap::new(),
        },
        analysis: "Alice plays tight-aggressive.".into(),
    };
    assert_eq!(result, expected);
    assert_eq!(detector.last_result(), Some(expected));
    assert_eq!(
        harness.observer.calls(),
        vec!["start", "nick:Alice", "stats:Alice", "analysis:Alice"]
    );
    assert_eq!(
        *harness.stats.requests.lock(),
        vec![("Alice".to_string(), "XPK".to_string())]
    );
    assert_eq!(
        *harness.patterns.regions.lock(),
        vec![OcrRegion {
            x: 300,
            y: 100,
            w: 400,
            h: 50
        }]
    );
    assert_eq!(detector.phase(), DetectorPhase::Idle);
}

#[tokio::test]
async fn test_window_without_header_is_rejected() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    harness.patterns.header.store(false, Ordering::SeqCst);
    let detector = coordinator(&harness, active_config());

    let err = detector.run_detection(hotkey_request(ALICE)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert!(harness.stats.requests.lock().is_empty());
    assert!(harness.patterns.regions.lock().is_empty());
    assert!(detector.last_result().is_none());

    let calls = harness.observer.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], "start");
    assert!(calls[1].starts_with("error:"));
}

#[tokio::test]
async fn test_both_heuristics_must_pass() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    harness.patterns.avatar.store(false, Ordering::SeqCst);
    let detector = coordinator(&harness, active_config());

    let err = detector.run_detection(hotkey_request(ALICE)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
}

#[tokio::test]
async fn test_capture_failure_counts_as_not_a_profile() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    harness.windows.fail_capture.store(true, Ordering::SeqCst);
    let detector = coordinator(&harness, active_config());

    let err = detector.run_detection(hotkey_request(ALICE)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
}

#[tokio::test]
async fn test_ocr_failure_is_extraction_error() {
    let harness = Harness::new();
    let detector = coordinator(&harness, active_config());

    let err = detector.run_detection(hotkey_request(ALICE)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
    assert!(harness.stats.requests.lock().is_empty());
}

#[tokio::test]
async fn test_blank_or_sentinel_ocr_text_is_rejected() {
    for text in ["   ", "NoText", "ErrorOCR\n"] {
        let harness = Harness::new();
        harness.patterns.nicks.lock().insert(ALICE, text.to_string());
        let detector = coordinator(&harness, active_config());

        let err = detector.run_detection(hotkey_request(ALICE)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure, "text {text:?}");
    }
}

#[tokio::test]
async fn test_nick_is_trimmed_before_lookup() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    harness
        .patterns
        .nicks
        .lock()
        .insert(ALICE, "  Alice  \nLevel 12".to_string());
    let detector = coordinator(&harness, active_config());

    let result = detector.run_detection(hotkey_request(ALICE)).await.unwrap();
    assert_eq!(result.nick, "Alice");
}

#[tokio::test]
async fn test_unknown_player_is_not_found() {
    let harness = Harness::new();
    harness.patterns.nicks.lock().insert(ALICE, "Ghost".to_string());
    let detector = coordinator(&harness, active_config());

    let err = detector.run_detection(hotkey_request(ALICE)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        harness.observer.calls(),
        vec!["start", "error:stats: player 'Ghost' not found"]
    );
}

#[tokio::test]
async fn test_failed_detection_keeps_previous_result() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    let detector = coordinator(&harness, active_config());

    let first = detector.run_detection(hotkey_request(ALICE)).await.unwrap();
    let commit = detector.last_commit();

    *harness.analysis.failure.lock() = Some(RemoteError::Rejected {
        status: 429,
        message: "rate limited".into(),
    });
    let err = detector.run_detection(hotkey_request(ALICE)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert_eq!(detector.last_result(), Some(first));
    assert_eq!(detector.last_commit(), commit);
}

#[tokio::test]
async fn test_stats_network_failure_skips_analysis() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    *harness.stats.failure.lock() = Some(RemoteError::Network("connection refused".into()));
    let detector = coordinator(&harness, active_config());

    let err = detector.run_detection(hotkey_request(ALICE)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert!(!harness.observer.calls().iter().any(|c| c.starts_with("nick:")));
}

#[tokio::test]
async fn test_auto_copy_writes_both_sections() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    let config = Config {
        auto_copy: true,
        auto_copy_type: AutoCopyType::Both,
        ..active_config()
    };
    let detector = coordinator(&harness, config);

    detector.run_detection(hotkey_request(ALICE)).await.unwrap();

    assert_eq!(
        *harness.clipboard.writes.lock(),
        vec!["VPIP:24 PFR:18 3B:8 F3B:55 WTSD:28 WSD:52\n\nAlice plays tight-aggressive."]
    );
}

#[tokio::test]
async fn test_clipboard_failure_does_not_fail_detection() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    harness.clipboard.fail.store(true, Ordering::SeqCst);
    let config = Config {
        auto_copy: true,
        ..active_config()
    };
    let detector = coordinator(&harness, config);

    let result = detector.run_detection(hotkey_request(ALICE)).await.unwrap();

    assert_eq!(detector.last_result(), Some(result));
    let calls = harness.observer.calls();
    assert_eq!(calls[..4], ["start", "nick:Alice", "stats:Alice", "analysis:Alice"]);
    assert!(calls[4].starts_with("error:clipboard write failed"));
}

#[tokio::test]
async fn test_no_auto_copy_when_disabled() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    let detector = coordinator(&harness, active_config());

    detector.run_detection(hotkey_request(ALICE)).await.unwrap();
    assert!(harness.clipboard.writes.lock().is_empty());
}

#[tokio::test]
async fn test_trigger_while_inactive_does_nothing() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    let detector = coordinator(&harness, Config::default());

    let outcome = detector.handle_trigger(hotkey_request(ALICE)).await;

    assert!(outcome.is_none());
    assert!(harness.observer.calls().is_empty());
    assert!(harness.patterns.regions.lock().is_empty());
}

#[tokio::test]
async fn test_trigger_samples_activation_at_call_time() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    let detector = coordinator(&harness, active_config());

    let pending = detector.handle_trigger(hotkey_request(ALICE));
    detector.toggle();

    assert!(pending.await.is_some());
}

#[tokio::test]
async fn test_click_region_surrounds_click() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    let detector = coordinator(&harness, active_config());
    let request = DetectionRequest {
        handle: ALICE,
        click: Some(Point { x: 100, y: 100 }),
        title: "Profile".into(),
    };

    detector.run_detection(request).await.unwrap();

    assert_eq!(
        *harness.patterns.regions.lock(),
        vec![OcrRegion {
            x: 50,
            y: 80,
            w: 200,
            h: 40
        }]
    );
}

#[tokio::test]
async fn test_missing_geometry_uses_fallback_region() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    let detector = coordinator(&harness, active_config());

    detector.run_detection(hotkey_request(ALICE)).await.unwrap();

    assert_eq!(
        *harness.patterns.regions.lock(),
        vec![OcrRegion {
            x: 95,
            y: 110,
            w: 95,
            h: 22
        }]
    );
}

#[tokio::test]
async fn test_export_last_result() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    let detector = coordinator(&harness, active_config());

    assert!(!detector.export_last(AutoCopyType::Stats).await.unwrap());
    assert!(harness.clipboard.writes.lock().is_empty());

    detector.run_detection(hotkey_request(ALICE)).await.unwrap();
    assert!(detector.export_last(AutoCopyType::Analysis).await.unwrap());

    assert_eq!(
        *harness.clipboard.writes.lock(),
        vec!["Alice plays tight-aggressive."]
    );
}

#[tokio::test]
async fn test_export_last_reports_clipboard_failure() {
    let harness = Harness::new().with_player(ALICE, "Alice");
    let detector = coordinator(&harness, active_config());
    detector.run_detection(hotkey_request(ALICE)).await.unwrap();

    harness.clipboard.fail.store(true, Ordering::SeqCst);
    let err = detector.export_last(AutoCopyType::Both).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ClipboardFailure);
    assert!(detector.last_result().is_some());
}
