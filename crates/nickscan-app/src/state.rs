use std::sync::Arc;
use std::time::Duration;

use nickscan_config::Config;
use nickscan_core::{
    ActivationListener, ConfigStore, DetectionCoordinator, DetectionObserver, Hooks,
    RIGHT_CLICK_EVENT, Services,
};
use nickscan_desktop::{DesktopPatterns, GlobalHotkeys, OcrReader, RightClickHook, XcapWindows};
use nickscan_io::{EventBus, SystemClipboard};
use nickscan_stats::{HttpStatsService, OpenAiAnalysisService};

use crate::profile::ProfileStore;

/// Everything the running detector owns
pub struct AppState {
    pub coordinator: DetectionCoordinator,
    pub right_click: Arc<RightClickHook>,
    pub bus: Arc<EventBus>,
}

impl AppState {
    /// Wire the desktop, network and clipboard backends around a coordinator
    pub fn build(
        config: Config,
        store: Arc<ProfileStore>,
        observer: Arc<dyn DetectionObserver>,
    ) -> anyhow::Result<Self> {
        let window = Arc::new(XcapWindows::new());
        let ocr = OcrReader::new(config.ocr.language.clone());
        tracing::debug!(language = ocr.language(), "OCR reader ready");
        let patterns = Arc::new(DesktopPatterns::new(window.clone(), ocr));
        let stats = Arc::new(HttpStatsService::new(config.network.clone())?);
        let analysis = Arc::new(OpenAiAnalysisService::new(
            config.analysis.clone(),
            Duration::from_secs(config.network.timeout_seconds),
        )?);
        let hotkeys = Arc::new(GlobalHotkeys::spawn()?);
        let bus = EventBus::new();
        let right_click = Arc::new(
            RightClickHook::new(config.detector_enabled)
                .with_title_fragments(&config.validator.window_titles),
        );

        let services = Services {
            window,
            patterns,
            stats,
            analysis,
            clipboard: Arc::new(SystemClipboard::new()),
            hotkeys,
            events: bus.clone(),
        };
        let hooks = Hooks {
            observers: vec![observer],
            activation: Some(right_click.clone() as Arc<dyn ActivationListener>),
            store: Some(store as Arc<dyn ConfigStore>),
        };

        Ok(Self {
            coordinator: DetectionCoordinator::new(config, services, hooks),
            right_click,
            bus,
        })
    }

    /// Start the coordinator, then feed right-clicks into the event bus
    pub fn start(&self) -> anyhow::Result<()> {
        self.coordinator.start()?;

        let bus = Arc::downgrade(&self.bus);
        self.right_click.start(move |event| {
            if let Some(bus) = bus.upgrade() {
                bus.publish(RIGHT_CLICK_EVENT, event);
            }
        })?;
        Ok(())
    }

    pub fn stop(&self) -> anyhow::Result<()> {
        self.right_click.stop();
        self.coordinator.stop()?;
        Ok(())
    }
}
