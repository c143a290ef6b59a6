use std::sync::Arc;

use nickscan_types::PlayerStats;

use crate::error::DetectionError;
use crate::services::{AnalysisService, StatsService};

/// Stats lookup followed by analysis generation.
///
/// Each call is attempted once; retry policy belongs to the caller.
pub struct StatsAnalysisClient {
    stats: Arc<dyn StatsService>,
    analysis: Arc<dyn AnalysisService>,
}

impl StatsAnalysisClient {
    pub fn new(stats: Arc<dyn StatsService>, analysis: Arc<dyn AnalysisService>) -> Self {
        Self { stats, analysis }
    }

    pub async fn fetch_stats(&self, nick: &str, room: &str) -> Result<PlayerStats, DetectionError> {
        self.stats
            .fetch(nick, room)
            .await
            .map_err(|e| DetectionError::remote("stats", nick, e))
    }

    pub async fn analyze(&self, stats: &PlayerStats) -> Result<String, DetectionError> {
        self.analysis
            .analyze(stats)
            .await
            .map_err(|e| DetectionError::remote("analysis", &stats.nick, e))
    }
}
