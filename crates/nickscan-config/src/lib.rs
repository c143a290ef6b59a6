use std::env;

use indexmap::IndexMap;
use nickscan_types::{AutoCopyType, OcrRegion};
use serde::{Deserialize, Serialize};

use self::analysis::AnalysisConfig;
use self::network::NetworkConfig;
use self::ocr::OcrConfig;
use self::validator::ValidatorConfig;

pub mod analysis;
pub mod network;
pub mod ocr;
pub mod validator;

/// Stats enabled out of the box, in display order
const DEFAULT_SELECTED: &[&str] = &[
    "vpip",
    "pfr",
    "three_bet",
    "fold_to_3bet",
    "wtsd",
    "wsd",
    "cbet_flop",
    "cbet_turn",
];

/// Known but disabled by default
const DEFAULT_UNSELECTED: &[&str] = &[
    "fold_to_flop_cbet_pct",
    "fold_to_turn_cbet_pct",
    "limp_pct",
    "limp_raise_pct",
    "four_bet_preflop_pct",
    "fold_to_4bet_pct",
    "wwsf",
    "total_hands",
    "bb_100",
    "win_usd",
];

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("vpip", "VPIP:{value}"),
    ("pfr", "PFR:{value}"),
    ("three_bet", "3B:{value}"),
    ("fold_to_3bet", "F3B:{value}"),
    ("wtsd", "WTSD:{value}"),
    ("wsd", "WSD:{value}"),
    ("cbet_flop", "CF:{value}"),
    ("cbet_turn", "CT:{value}"),
];

fn default_hotkey() -> String {
    "alt+q".to_string()
}

fn default_room() -> String {
    "XPK".to_string()
}

fn default_fallback_coords() -> OcrRegion {
    OcrRegion {
        x: 95,
        y: 110,
        w: 95,
        h: 22,
    }
}

fn default_selected_stats() -> IndexMap<String, bool> {
    DEFAULT_SELECTED
        .iter()
        .map(|k| (k.to_string(), true))
        .chain(DEFAULT_UNSELECTED.iter().map(|k| (k.to_string(), false)))
        .collect()
}

fn default_templates() -> IndexMap<String, String> {
    DEFAULT_TEMPLATES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Detector configuration snapshot.
///
/// The coordinator never mutates a snapshot in place; updates replace it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global key combination, e.g. `alt+q`
    #[serde(default = "default_hotkey")]
    pub hotkey: String,
    pub auto_copy: bool,
    pub auto_copy_type: AutoCopyType,
    /// Iteration order is the export order
    #[serde(default = "default_selected_stats")]
    pub selected_stats: IndexMap<String, bool>,
    /// Templates with a single `{value}` placeholder
    #[serde(default = "default_templates")]
    pub stats_format_templates: IndexMap<String, String>,
    /// Used verbatim when the window geometry cannot be read
    #[serde(default = "default_fallback_coords")]
    pub ocr_fallback_coords: OcrRegion,
    /// Stats provider dataset identifier
    #[serde(default = "default_room")]
    pub room: String,
    /// Persisted activation preference
    pub detector_enabled: bool,

    pub network: NetworkConfig,
    pub analysis: AnalysisConfig,
    pub ocr: OcrConfig,
    pub validator: ValidatorConfig,
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn new() -> Self {
        let hotkey = env::var("NICKSCAN_HOTKEY").unwrap_or_else(|_| default_hotkey());
        let room = env::var("NICKSCAN_ROOM").unwrap_or_else(|_| default_room());

        Config {
            hotkey,
            room,
            network: NetworkConfig::new(),
            analysis: AnalysisConfig::new(),
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: default_hotkey(),
            auto_copy: false,
            auto_copy_type: AutoCopyType::default(),
            selected_stats: default_selected_stats(),
            stats_format_templates: default_templates(),
            ocr_fallback_coords: default_fallback_coords(),
            room: default_room(),
            detector_enabled: false,
            network: NetworkConfig::default(),
            analysis: AnalysisConfig::default(),
            ocr: OcrConfig::default(),
            validator: ValidatorConfig::default(),
        }
    }
}
