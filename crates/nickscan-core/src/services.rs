//! Contracts for the external collaborators the detector drives.
//!
//! Everything OS- or network-facing sits behind these traits so the pipeline
//! can run against fakes in tests.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nickscan_types::{
    CapturedImage, OcrRegion, PlayerStats, Rgb, WindowEvent, WindowHandle, WindowRect,
};

/// Called on the OS hotkey thread; must not block
pub type HotkeyHandler = Arc<dyn Fn() + Send + Sync>;

/// Called by the event source for every published event
pub type EventHandler = Arc<dyn Fn(WindowEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

#[async_trait]
pub trait WindowSystem: Send + Sync {
    /// Resolve the window currently under the pointer.
    ///
    /// Synchronous so hotkey handlers can call it at the moment of the keypress.
    fn window_under_pointer(&self) -> Option<(WindowHandle, String)>;

    async fn window_rect(&self, handle: WindowHandle) -> anyhow::Result<WindowRect>;

    async fn capture_region(
        &self,
        handle: WindowHandle,
        region: OcrRegion,
    ) -> anyhow::Result<CapturedImage>;
}

#[async_trait]
pub trait PatternService: Send + Sync {
    async fn color_match(
        &self,
        image: &CapturedImage,
        reference: Rgb,
        tolerance: u8,
        min_pixels: u32,
    ) -> anyhow::Result<bool>;

    async fn detect_circular_avatar(&self, image: &CapturedImage) -> anyhow::Result<bool>;

    async fn extract_text(&self, handle: WindowHandle, region: OcrRegion) -> anyhow::Result<String>;
}

/// Failure of a remote stats/analysis call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}

#[async_trait]
pub trait StatsService: Send + Sync {
    async fn fetch(&self, nick: &str, room: &str) -> Result<PlayerStats, RemoteError>;
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, stats: &PlayerStats) -> Result<String, RemoteError>;
}

#[async_trait]
pub trait ClipboardService: Send + Sync {
    async fn write(&self, text: &str) -> anyhow::Result<()>;
}

pub trait HotkeyService: Send + Sync {
    fn register(&self, combo: &str, handler: HotkeyHandler) -> anyhow::Result<()>;

    fn unregister(&self, combo: &str) -> anyhow::Result<()>;
}

pub trait EventSubscriptionService: Send + Sync {
    fn subscribe(&self, event_name: &str, handler: EventHandler) -> anyhow::Result<SubscriptionId>;

    fn unsubscribe(&self, id: SubscriptionId) -> anyhow::Result<()>;
}
