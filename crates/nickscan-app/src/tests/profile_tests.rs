use std::fs;

use nickscan_config::Config;
use nickscan_core::ConfigStore;
use tempfile::TempDir;

use crate::profile::{MAIN_PROFILE, Profile, ProfileStore};

#[test]
fn test_first_load_creates_main_profile() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::new(dir.path(), MAIN_PROFILE);

    let config = store.load().unwrap();

    let main = dir.path().join("main.json");
    assert!(main.exists());
    let profile: Profile = serde_json::from_str(&fs::read_to_string(main).unwrap()).unwrap();
    assert_eq!(profile.name, "main");
    assert_eq!(profile.value.hotkey, config.hotkey);
}

#[test]
fn test_missing_profile_falls_back_to_main() {
    let dir = TempDir::new().unwrap();
    let main = ProfileStore::new(dir.path(), MAIN_PROFILE);
    let config = Config {
        room: "GG".into(),
        ..Config::default()
    };
    main.init().unwrap();
    main.save(&config).unwrap();

    let loaded = ProfileStore::new(dir.path(), "tournament").load().unwrap();

    assert_eq!(loaded.room, "GG");
    assert!(!dir.path().join("tournament.json").exists());
}

#[test]
fn test_save_writes_selected_profile_only() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::new(dir.path(), "cash");
    store.load().unwrap();

    let config = Config {
        detector_enabled: true,
        ..Config::default()
    };
    store.save(&config).unwrap();

    assert!(store.load().unwrap().detector_enabled);
    assert!(!ProfileStore::new(dir.path(), MAIN_PROFILE).load().unwrap().detector_enabled);
    assert!(!dir.path().join("cash.json.tmp").exists());
}

#[test]
fn test_corrupt_profile_is_backed_up_and_reset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("main.json");
    fs::write(&path, "{ not json").unwrap();

    let config = ProfileStore::new(dir.path(), MAIN_PROFILE).load().unwrap();

    assert_eq!(config.ocr_fallback_coords, Config::default().ocr_fallback_coords);
    assert_eq!(
        fs::read_to_string(dir.path().join("main.json.bak")).unwrap(),
        "{ not json"
    );
    let profile: Profile = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(profile.name, "main");
}

#[test]
fn test_partial_profile_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.json"),
        r#"{"name": "main", "value": {"auto_copy": true, "hotkey": "ctrl+shift+d"}}"#,
    )
    .unwrap();

    let config = ProfileStore::new(dir.path(), MAIN_PROFILE).load().unwrap();

    assert!(config.auto_copy);
    assert_eq!(config.hotkey, "ctrl+shift+d");
    assert_eq!(config.selected_stats, Config::default().selected_stats);
}
