use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque OS window identifier (HWND on Windows, xcap window id elsewhere)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Window-relative rectangle handed to the OCR engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrRegion {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// Window geometry in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Raw RGBA8 pixels of a captured window region
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl CapturedImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let px = self.data.get(idx..idx + 3)?;
        Some(Rgb::new(px[0], px[1], px[2]))
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// One detection attempt, created per trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRequest {
    pub handle: WindowHandle,
    pub click: Option<Point>,
    pub title: String,
}

impl DetectionRequest {
    pub fn from_hotkey(handle: WindowHandle, title: impl Into<String>) -> Self {
        Self {
            handle,
            click: None,
            title: title.into(),
        }
    }
}

/// Payload of a captured right-click on a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEvent {
    pub handle: WindowHandle,
    pub x: i32,
    pub y: i32,
    pub title: String,
}

impl From<WindowEvent> for DetectionRequest {
    fn from(event: WindowEvent) -> Self {
        Self {
            handle: event.handle,
            click: Some(Point {
                x: event.x,
                y: event.y,
            }),
            title: event.title,
        }
    }
}

/// A single statistic as delivered by the stats provider.
///
/// Providers send numbers or pre-formatted strings, so both are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl StatValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatValue::Int(v) => Some(*v as f64),
            StatValue::Float(v) => Some(*v),
            StatValue::Text(s) => s.trim().trim_end_matches('%').parse().ok(),
        }
    }

    fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(StatValue::Int)
                .or_else(|| n.as_f64().map(StatValue::Float)),
            serde_json::Value::String(s) => Some(StatValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Int(v) => write!(f, "{v}"),
            StatValue::Float(v) => write!(f, "{v}"),
            StatValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for StatValue {
    fn from(value: i64) -> Self {
        StatValue::Int(value)
    }
}

impl From<i32> for StatValue {
    fn from(value: i32) -> Self {
        StatValue::Int(i64::from(value))
    }
}

impl From<f64> for StatValue {
    fn from(value: f64) -> Self {
        StatValue::Float(value)
    }
}

impl From<&str> for StatValue {
    fn from(value: &str) -> Self {
        StatValue::Text(value.to_string())
    }
}

/// Player statistics, immutable once fetched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default, alias = "player_name")]
    pub nick: String,
    #[serde(default)]
    pub vpip: Option<StatValue>,
    #[serde(default)]
    pub pfr: Option<StatValue>,
    #[serde(default, alias = "threeBet")]
    pub three_bet: Option<StatValue>,
    #[serde(default, alias = "foldTo3Bet", alias = "fold_to_3bet_pct")]
    pub fold_to_3bet: Option<StatValue>,
    #[serde(default)]
    pub wtsd: Option<StatValue>,
    #[serde(default)]
    pub wsd: Option<StatValue>,
    #[serde(default, alias = "totalHands", alias = "total_manos")]
    pub total_hands: Option<StatValue>,
    /// Everything else the provider sent
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PlayerStats {
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            ..Default::default()
        }
    }

    /// Look up a stat by key, accepting snake_case and camelCase spellings
    /// of the canonical fields.
    pub fn get(&self, key: &str) -> Option<StatValue> {
        let field = match key {
            "vpip" => &self.vpip,
            "pfr" => &self.pfr,
            "three_bet" | "threeBet" => &self.three_bet,
            "fold_to_3bet" | "foldTo3Bet" | "fold_to_3bet_pct" => &self.fold_to_3bet,
            "wtsd" => &self.wtsd,
            "wsd" => &self.wsd,
            "total_hands" | "totalHands" | "total_manos" => &self.total_hands,
            _ => return self.extra.get(key).and_then(StatValue::from_json),
        };
        field.clone()
    }

    /// Builder-style setter used by providers and tests
    pub fn with(mut self, key: &str, value: impl Into<StatValue>) -> Self {
        let value = Some(value.into());
        match key {
            "vpip" => self.vpip = value,
            "pfr" => self.pfr = value,
            "three_bet" | "threeBet" => self.three_bet = value,
            "fold_to_3bet" | "foldTo3Bet" | "fold_to_3bet_pct" => self.fold_to_3bet = value,
            "wtsd" => self.wtsd = value,
            "wsd" => self.wsd = value,
            "total_hands" | "totalHands" | "total_manos" => self.total_hands = value,
            other => {
                let json = match value {
                    Some(StatValue::Int(v)) => serde_json::Value::from(v),
                    Some(StatValue::Float(v)) => serde_json::Value::from(v),
                    Some(StatValue::Text(s)) => serde_json::Value::from(s),
                    None => serde_json::Value::Null,
                };
                self.extra.insert(other.to_string(), json);
            }
        }
        self
    }
}

/// Completed detection: produced atomically on pipeline success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub nick: String,
    pub stats: PlayerStats,
    pub analysis: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoCopyType {
    Stats,
    Analysis,
    #[default]
    Both,
}

/// Observer notifications forwarded to the app's event loop
#[derive(Debug, Clone)]
pub enum DetectionEvent {
    Started,
    NickExtracted(String),
    StatsReceived(PlayerStats),
    AnalysisComplete(AnalysisResult),
    Error(String),
}
