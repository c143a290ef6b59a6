use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use nickscan_config::Config;
use nickscan_types::AnalysisResult;
use parking_lot::{Mutex, RwLock};

/// Pipeline stage of an in-flight detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Locating,
    Extracting,
    FetchingStats,
    Analyzing,
    AutoCopying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    Idle,
    Detecting(Stage),
}

/// Which request wrote the cached result, and when relative to other commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitInfo {
    pub request_id: u64,
    pub sequence: u64,
}

#[derive(Default)]
struct ResultCache {
    result: Option<AnalysisResult>,
    commit: Option<CommitInfo>,
    commits: u64,
}

/// Activation flag, config snapshot and last-result cache.
///
/// Locks here are never held across an `.await`.
pub(crate) struct DetectorState {
    active: Arc<AtomicBool>,
    config: RwLock<Arc<Config>>,
    cache: RwLock<ResultCache>,
    in_flight: Mutex<BTreeMap<u64, Stage>>,
    next_request: AtomicU64,
}

impl DetectorState {
    pub fn new(config: Config) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(config.detector_enabled)),
            config: RwLock::new(Arc::new(config)),
            cache: RwLock::new(ResultCache::default()),
            in_flight: Mutex::new(BTreeMap::new()),
            next_request: AtomicU64::new(1),
        }
    }

    pub fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Flip the flag, returning the new value
    pub fn toggle(&self) -> bool {
        !self.active.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config.read())
    }

    /// Swap in a new snapshot, returning the previous one
    pub fn replace_config(&self, config: Config) -> Arc<Config> {
        std::mem::replace(&mut *self.config.write(), Arc::new(config))
    }

    /// Edit a copy of the snapshot and swap it in, all under one write lock
    pub fn modify_config(&self, edit: impl FnOnce(&mut Config)) -> Arc<Config> {
        let mut slot = self.config.write();
        let mut next = Config::clone(&slot);
        edit(&mut next);
        *slot = Arc::new(next);
        Arc::clone(&slot)
    }

    pub fn next_request_id(&self) -> u64 {
        self.next_request.fetch_add(1, Ordering::Relaxed)
    }

    /// Publish a finished result; later commits overwrite earlier ones
    pub fn commit(&self, request_id: u64, result: AnalysisResult) -> CommitInfo {
        let mut cache = self.cache.write();
        cache.commits += 1;
        let info = CommitInfo {
            request_id,
            sequence: cache.commits,
        };
        cache.result = Some(result);
        cache.commit = Some(info);
        info
    }

    pub fn last_result(&self) -> Option<AnalysisResult> {
        self.cache.read().result.clone()
    }

    pub fn last_commit(&self) -> Option<CommitInfo> {
        self.cache.read().commit
    }

    pub fn begin(&self, request_id: u64) -> InFlight<'_> {
        self.in_flight.lock().insert(request_id, Stage::Validating);
        InFlight {
            state: self,
            request_id,
        }
    }

    /// Stage of the most recently started detection still running
    pub fn phase(&self) -> DetectorPhase {
        self.in_flight
            .lock()
            .last_key_value()
            .map(|(_, stage)| DetectorPhase::Detecting(*stage))
            .unwrap_or(DetectorPhase::Idle)
    }
}

/// Tracks one running detection; dropping it returns the request to idle
pub(crate) struct InFlight<'a> {
    state: &'a DetectorState,
    request_id: u64,
}

impl InFlight<'_> {
    pub fn enter(&mut self, stage: Stage) {
        tracing::debug!(request = self.request_id, ?stage, "entering stage");
        self.state.in_flight.lock().insert(self.request_id, stage);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.in_flight.lock().remove(&self.request_id);
    }
}
