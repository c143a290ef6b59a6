pub mod client;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod format;
pub mod hotkey;
pub mod listener;
pub mod observer;
pub mod region;
pub mod services;
pub mod state;
pub mod validator;

pub use client::StatsAnalysisClient;
pub use coordinator::{DetectionCoordinator, Hooks, Services};
pub use error::{DetectionError, ErrorKind, LifecycleError};
pub use export::ClipboardExporter;
pub use format::ResultFormatter;
pub use hotkey::HotkeyManager;
pub use listener::{RIGHT_CLICK_EVENT, WindowEventListener};
pub use observer::{ActivationListener, ConfigStore, DetectionObserver};
pub use region::{ProportionalRegionLocator, RegionStrategy};
pub use services::{
    AnalysisService, ClipboardService, EventHandler, EventSubscriptionService, HotkeyHandler,
    HotkeyService, PatternService, RemoteError, StatsService, SubscriptionId, WindowSystem,
};
pub use state::{CommitInfo, DetectorPhase, Stage};
pub use validator::ProfileWindowValidator;

#[cfg(test)]
mod tests;
