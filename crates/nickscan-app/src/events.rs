use std::sync::Arc;

use kanal::{AsyncReceiver, AsyncSender};
use nickscan_core::DetectionObserver;
use nickscan_types::{AnalysisResult, DetectionEvent, PlayerStats};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::status::DetectionStatus;

/// Forwards coordinator callbacks into the app's event channel.
///
/// Never waits: callbacks run inside detections, so a full channel drops the event.
pub struct ChannelObserver {
    tx: AsyncSender<DetectionEvent>,
}

impl ChannelObserver {
    pub fn new(tx: AsyncSender<DetectionEvent>) -> Self {
        Self { tx }
    }

    fn forward(&self, event: DetectionEvent) {
        match self.tx.try_send(event) {
            Ok(true) => {}
            Ok(false) => tracing::warn!("event channel full, dropping detection event"),
            Err(e) => tracing::debug!("event channel closed: {e}"),
        }
    }
}

impl DetectionObserver for ChannelObserver {
    fn on_detection_start(&self) {
        self.forward(DetectionEvent::Started);
    }

    fn on_nick_extracted(&self, nick: &str) {
        self.forward(DetectionEvent::NickExtracted(nick.to_string()));
    }

    fn on_stats_received(&self, stats: &PlayerStats) {
        self.forward(DetectionEvent::StatsReceived(stats.clone()));
    }

    fn on_analysis_complete(&self, result: &AnalysisResult) {
        self.forward(DetectionEvent::AnalysisComplete(result.clone()));
    }

    fn on_error(&self, message: &str) {
        self.forward(DetectionEvent::Error(message.to_string()));
    }
}

/// App's main loop: drains detection events until cancelled or every sender is gone
pub async fn event_loop(
    rx: AsyncReceiver<DetectionEvent>,
    status: Arc<RwLock<DetectionStatus>>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!("[EVENT_LOOP] Waiting for detection events");
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("[EVENT_LOOP] Cancelled");
                return Ok(());
            }
            received = rx.recv() => match received {
                Ok(event) => event,
                Err(_) => {
                    tracing::debug!("[EVENT_LOOP] Channel closed");
                    return Ok(());
                }
            },
        };

        handle_event(&event);
        status.write().await.apply(&event);
    }
}

fn handle_event(event: &DetectionEvent) {
    match event {
        DetectionEvent::Started => tracing::info!("Detection started"),
        DetectionEvent::NickExtracted(nick) => tracing::info!(%nick, "Nick extracted"),
        DetectionEvent::StatsReceived(stats) => {
            tracing::debug!(nick = %stats.nick, "Stats received");
        }
        DetectionEvent::AnalysisComplete(result) => {
            tracing::info!(nick = %result.nick, "Analysis complete\n{}", result.analysis);
        }
        DetectionEvent::Error(message) => tracing::warn!("Detection failed: {message}"),
    }
}
