use std::sync::Arc;

use kanal::{AsyncReceiver, AsyncSender};
use nickscan_core::DetectionCoordinator;
use nickscan_types::DetectionEvent;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::commands::command_loop;
use crate::events::{ChannelObserver, event_loop};
use crate::status::AppStatus;

/// Detection bursts rarely exceed a handful of events per trigger
const DETECTION_CHANNEL_CAPACITY: usize = 256;

/// Centralized channel management
pub struct ChannelSet {
    pub detection: (AsyncSender<DetectionEvent>, AsyncReceiver<DetectionEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            detection: kanal::bounded_async(DETECTION_CHANNEL_CAPACITY),
        }
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    status: Arc<AppStatus>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(status: Arc<AppStatus>) -> Self {
        Self {
            channels: ChannelSet::new(),
            status,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Observer to hand to the coordinator; its events feed the event loop
    pub fn observer(&self) -> Arc<ChannelObserver> {
        Arc::new(ChannelObserver::new(self.channels.detection.0.clone()))
    }

    /// Event loop, plus the console command loop when `console` is given
    pub fn spawn_tasks(
        &self,
        coordinator: DetectionCoordinator,
        console: Option<AsyncReceiver<String>>,
    ) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        tasks.spawn(event_loop(
            self.channels.detection.1.clone(),
            Arc::clone(&self.status.detection),
            self.cancel_token.child_token(),
        ));

        if let Some(input) = console {
            tasks.spawn(command_loop(
                input,
                coordinator,
                Arc::clone(&self.status.detection),
                self.cancel_token.child_token(),
            ));
        }

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
