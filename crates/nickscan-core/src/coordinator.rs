use std::future::Future;
use std::sync::Arc;

use nickscan_config::Config;
use nickscan_types::{AnalysisResult, AutoCopyType, DetectionRequest};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::client::StatsAnalysisClient;
use crate::error::{DetectionError, LifecycleError};
use crate::export::ClipboardExporter;
use crate::format::ResultFormatter;
use crate::hotkey::HotkeyManager;
use crate::listener::WindowEventListener;
use crate::observer::{ActivationListener, ConfigStore, DetectionObserver};
use crate::region::{ProportionalRegionLocator, RegionStrategy};
use crate::services::{
    AnalysisService, ClipboardService, EventSubscriptionService, HotkeyService, PatternService,
    StatsService, WindowSystem,
};
use crate::state::{CommitInfo, DetectorPhase, DetectorState, InFlight, Stage};
use crate::validator::ProfileWindowValidator;

/// Text some OCR backends emit instead of failing
const OCR_SENTINELS: &[&str] = &["Error", "ErrorOCR", "NoText"];

/// External collaborators injected into a detector session
#[derive(Clone)]
pub struct Services {
    pub window: Arc<dyn WindowSystem>,
    pub patterns: Arc<dyn PatternService>,
    pub stats: Arc<dyn StatsService>,
    pub analysis: Arc<dyn AnalysisService>,
    pub clipboard: Arc<dyn ClipboardService>,
    pub hotkeys: Arc<dyn HotkeyService>,
    pub events: Arc<dyn EventSubscriptionService>,
}

/// Optional listeners around the pipeline
#[derive(Default, Clone)]
pub struct Hooks {
    pub observers: Vec<Arc<dyn DetectionObserver>>,
    pub activation: Option<Arc<dyn ActivationListener>>,
    pub store: Option<Arc<dyn ConfigStore>>,
}

struct Inner {
    state: DetectorState,
    validator: ProfileWindowValidator,
    locator: Box<dyn RegionStrategy>,
    patterns: Arc<dyn PatternService>,
    client: StatsAnalysisClient,
    exporter: ClipboardExporter,
    hotkeys: HotkeyManager,
    listener: WindowEventListener,
    hooks: Hooks,
    tasks: TaskTracker,
    runtime: Mutex<Option<Handle>>,
}

/// Turns hotkey presses and right-clicks into nick → stats → analysis results.
///
/// Cheap to clone; all clones drive the same session. Triggers are not
/// serialized: concurrent detections each run to completion and the one that
/// finishes last owns the cached result.
#[derive(Clone)]
pub struct DetectionCoordinator {
    inner: Arc<Inner>,
}

impl DetectionCoordinator {
    pub fn new(config: Config, services: Services, hooks: Hooks) -> Self {
        let locator = Box::new(ProportionalRegionLocator::new(Arc::clone(&services.window)));
        Self::with_region_strategy(config, services, hooks, locator)
    }

    pub fn with_region_strategy(
        config: Config,
        services: Services,
        hooks: Hooks,
        locator: Box<dyn RegionStrategy>,
    ) -> Self {
        let state = DetectorState::new(config);
        let listener = WindowEventListener::new(services.events, state.active_flag());

        Self {
            inner: Arc::new(Inner {
                validator: ProfileWindowValidator::new(
                    Arc::clone(&services.window),
                    Arc::clone(&services.patterns),
                ),
                locator,
                patterns: services.patterns,
                client: StatsAnalysisClient::new(services.stats, services.analysis),
                exporter: ClipboardExporter::new(services.clipboard),
                hotkeys: HotkeyManager::new(services.hotkeys, services.window),
                listener,
                state,
                hooks,
                tasks: TaskTracker::new(),
                runtime: Mutex::new(None),
            }),
        }
    }

    /// Acquire the hotkey registration and the right-click subscription.
    ///
    /// Must run inside a tokio runtime; triggered detections are spawned on it.
    /// Activation is re-read from the config snapshot, so a stopped session
    /// comes back in its persisted state.
    /// If the subscription fails the hotkey is released again before returning.
    pub fn start(&self) -> Result<(), LifecycleError> {
        let runtime = Handle::try_current().map_err(|_| LifecycleError::NoRuntime)?;
        *self.inner.runtime.lock() = Some(runtime);

        let config = self.inner.state.config();
        self.inner.state.set_active(config.detector_enabled);
        if let Some(listener) = &self.inner.hooks.activation {
            listener.set_detector_active(config.detector_enabled);
        }

        self.inner
            .hotkeys
            .register(&config.hotkey, self.trigger_sink())
            .map_err(|source| LifecycleError::Hotkey {
                combo: config.hotkey.clone(),
                source,
            })?;

        if let Err(source) = self.inner.listener.subscribe(self.trigger_sink()) {
            if let Err(e) = self.inner.hotkeys.unregister() {
                tracing::warn!("failed to roll back hotkey registration: {e:#}");
            }
            let error = LifecycleError::Subscription(source);
            let message = error.to_string();
            self.emit(|o| o.on_error(&message));
            return Err(error);
        }

        tracing::info!(active = self.is_active(), "detector started");
        Ok(())
    }

    /// Release both OS resources; safe to call repeatedly.
    ///
    /// In-flight detections are not cancelled.
    pub fn stop(&self) -> Result<(), LifecycleError> {
        self.inner.state.set_active(false);
        if let Some(listener) = &self.inner.hooks.activation {
            listener.set_detector_active(false);
        }

        let hotkey = self.inner.hotkeys.unregister();
        let events = self.inner.listener.unsubscribe();

        hotkey.map_err(|source| LifecycleError::Release {
            resource: "hotkey",
            source,
        })?;
        events.map_err(|source| LifecycleError::Release {
            resource: "right-click subscription",
            source,
        })?;

        tracing::info!("detector stopped");
        Ok(())
    }

    /// Flip activation and persist the preference. Returns the new state.
    pub fn toggle(&self) -> bool {
        let mut active = false;
        let config = self.inner.state.modify_config(|config| {
            active = self.inner.state.toggle();
            config.detector_enabled = active;
        });
        tracing::info!(active, "detector toggled");

        if let Some(listener) = &self.inner.hooks.activation {
            listener.set_detector_active(active);
        }

        if let Some(store) = &self.inner.hooks.store
            && let Err(e) = store.save(&config)
        {
            tracing::warn!("failed to persist detector preference: {e:#}");
        }

        active
    }

    /// Replace the config snapshot; detections already running keep the old one.
    ///
    /// A changed hotkey is re-registered if one is currently held. When the new
    /// combo cannot be registered the held one is restored and stays in the
    /// snapshot; every other field of `config` still applies.
    pub fn update_config(&self, mut config: Config) -> Result<(), LifecycleError> {
        let held = match self.inner.hotkeys.combo() {
            Some(held) if held != config.hotkey => held,
            _ => {
                self.inner.state.replace_config(config);
                return Ok(());
            }
        };

        self.inner
            .hotkeys
            .unregister()
            .map_err(|source| LifecycleError::Release {
                resource: "hotkey",
                source,
            })?;

        if let Err(source) = self.inner.hotkeys.register(&config.hotkey, self.trigger_sink()) {
            if let Err(e) = self.inner.hotkeys.register(&held, self.trigger_sink()) {
                tracing::error!("failed to restore hotkey {held}: {e:#}");
            }
            let combo = std::mem::replace(&mut config.hotkey, held);
            self.inner.state.replace_config(config);
            return Err(LifecycleError::Hotkey { combo, source });
        }

        self.inner.state.replace_config(config);
        Ok(())
    }

    /// Entry point for both trigger paths.
    ///
    /// Activation and config are sampled when this is called, not when the
    /// returned future is first polled. Resolves to `None` when inactive or on
    /// any stage failure.
    pub fn handle_trigger(
        &self,
        request: DetectionRequest,
    ) -> impl Future<Output = Option<AnalysisResult>> + Send + 'static {
        let active = self.inner.state.is_active();
        let config = self.inner.state.config();
        let coordinator = self.clone();

        async move {
            if !active {
                tracing::debug!(handle = %request.handle, "detector inactive, trigger ignored");
                return None;
            }
            coordinator.detect(request, config).await.ok()
        }
    }

    /// Run the pipeline regardless of activation, keeping the error
    pub async fn run_detection(
        &self,
        request: DetectionRequest,
    ) -> Result<AnalysisResult, DetectionError> {
        let config = self.inner.state.config();
        self.detect(request, config).await
    }

    /// Copy the cached result; `Ok(false)` when nothing has been detected yet
    pub async fn export_last(&self, kind: AutoCopyType) -> Result<bool, DetectionError> {
        let Some(result) = self.inner.state.last_result() else {
            return Ok(false);
        };
        let config = self.inner.state.config();
        let text = ResultFormatter::from_config(&config).export_text(&result, kind);
        self.inner.exporter.write(&text).await?;
        Ok(true)
    }

    /// Wait until every spawned detection has finished
    pub async fn wait_idle(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.is_active()
    }

    pub fn hotkey_registered(&self) -> bool {
        self.inner.hotkeys.is_registered()
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.listener.is_subscribed()
    }

    pub fn config(&self) -> Arc<Config> {
        self.inner.state.config()
    }

    pub fn last_result(&self) -> Option<AnalysisResult> {
        self.inner.state.last_result()
    }

    pub fn last_commit(&self) -> Option<CommitInfo> {
        self.inner.state.last_commit()
    }

    pub fn phase(&self) -> DetectorPhase {
        self.inner.state.phase()
    }

    /// OS callbacks hold only a weak reference so the session can be dropped
    fn trigger_sink(&self) -> impl Fn(DetectionRequest) + Send + Sync + 'static {
        let weak = Arc::downgrade(&self.inner);
        move |request| {
            if let Some(inner) = weak.upgrade() {
                DetectionCoordinator { inner }.spawn_trigger(request);
            }
        }
    }

    fn spawn_trigger(&self, request: DetectionRequest) {
        let Some(runtime) = self.inner.runtime.lock().clone() else {
            tracing::warn!(handle = %request.handle, "trigger received before start, dropped");
            return;
        };
        let pipeline = self.handle_trigger(request);
        self.inner.tasks.spawn_on(pipeline, &runtime);
    }

    async fn detect(
        &self,
        request: DetectionRequest,
        config: Arc<Config>,
    ) -> Result<AnalysisResult, DetectionError> {
        let id = self.inner.state.next_request_id();
        let span = tracing::info_span!("detection", request = id, handle = %request.handle);

        async move {
            let mut flight = self.inner.state.begin(id);
            tracing::info!(title = %request.title, "detection started");
            self.emit(|o| o.on_detection_start());

            match self.pipeline(id, &request, &config, &mut flight).await {
                Ok(result) => Ok(result),
                Err(e) => {
                    tracing::warn!(kind = ?e.kind(), "detection failed: {e}");
                    let message = e.to_string();
                    self.emit(|o| o.on_error(&message));
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn pipeline(
        &self,
        id: u64,
        request: &DetectionRequest,
        config: &Config,
        flight: &mut InFlight<'_>,
    ) -> Result<AnalysisResult, DetectionError> {
        let inner = &self.inner;
        let handle = request.handle;

        flight.enter(Stage::Validating);
        if !inner
            .validator
            .is_profile_window(handle, &config.validator)
            .await
        {
            return Err(DetectionError::Validation(handle));
        }

        flight.enter(Stage::Locating);
        let region = inner
            .locator
            .locate(handle, request.click, config.ocr_fallback_coords)
            .await;
        tracing::debug!(?region, "nick region located");

        flight.enter(Stage::Extracting);
        let raw = inner
            .patterns
            .extract_text(handle, region)
            .await
            .map_err(|e| DetectionError::Extraction(format!("{e:#}")))?;
        let nick = clean_nick(&raw).ok_or_else(|| {
            DetectionError::Extraction(format!("OCR returned no usable text ({raw:?})"))
        })?;
        tracing::debug!(%nick, "nick extracted");

        flight.enter(Stage::FetchingStats);
        let stats = inner.client.fetch_stats(&nick, &config.room).await?;

        flight.enter(Stage::Analyzing);
        let analysis = inner.client.analyze(&stats).await?;

        let result = AnalysisResult {
            nick,
            stats,
            analysis,
        };
        let commit = inner.state.commit(id, result.clone());
        tracing::debug!(sequence = commit.sequence, "result committed");

        self.emit(|o| o.on_nick_extracted(&result.nick));
        self.emit(|o| o.on_stats_received(&result.stats));
        self.emit(|o| o.on_analysis_complete(&result));

        if config.auto_copy {
            flight.enter(Stage::AutoCopying);
            let text =
                ResultFormatter::from_config(config).export_text(&result, config.auto_copy_type);
            if let Err(e) = inner.exporter.write(&text).await {
                tracing::warn!(kind = ?e.kind(), "auto-copy failed: {e}");
                let message = e.to_string();
                self.emit(|o| o.on_error(&message));
            }
        }

        tracing::info!(nick = %result.nick, "detection complete");
        Ok(result)
    }

    fn emit(&self, notify: impl Fn(&dyn DetectionObserver)) {
        for observer in &self.inner.hooks.observers {
            notify(observer.as_ref());
        }
    }
}

/// First non-empty OCR line, unless it is an engine sentinel
fn clean_nick(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    if OCR_SENTINELS.contains(&line) {
        return None;
    }
    Some(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::clean_nick;

    #[test]
    fn test_clean_nick_takes_first_line() {
        assert_eq!(clean_nick("  Alice \n Level 3"), Some("Alice".into()));
        assert_eq!(clean_nick("\n\n  Bob"), Some("Bob".into()));
    }

    #[test]
    fn test_clean_nick_rejects_blank_and_sentinels() {
        assert_eq!(clean_nick("   \n"), None);
        assert_eq!(clean_nick("NoText"), None);
        assert_eq!(clean_nick("ErrorOCR"), None);
    }
}
