use nickscan_config::Config;
use nickscan_types::{AnalysisResult, PlayerStats};

/// Lifecycle callbacks of a detection.
///
/// Every method defaults to a no-op, so observers implement only what they need.
/// Each fires at most once per detection.
pub trait DetectionObserver: Send + Sync {
    fn on_detection_start(&self) {}

    fn on_nick_extracted(&self, _nick: &str) {}

    fn on_stats_received(&self, _stats: &PlayerStats) {}

    fn on_analysis_complete(&self, _result: &AnalysisResult) {}

    fn on_error(&self, _message: &str) {}
}

/// Told about every `toggle()` so OS hooks can pause themselves
pub trait ActivationListener: Send + Sync {
    fn set_detector_active(&self, active: bool);
}

/// Persists the config snapshot after the detector changes a preference
pub trait ConfigStore: Send + Sync {
    fn save(&self, config: &Config) -> anyhow::Result<()>;
}
