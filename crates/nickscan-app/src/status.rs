use std::sync::Arc;
use std::time::SystemTime;

use nickscan_types::DetectionEvent;
use tokio::sync::RwLock;

/// Running tally of detector activity
#[derive(Clone, Debug, Default)]
pub struct DetectionStatus {
    pub detecting: bool,
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub last_nick: Option<String>,
    pub last_update: Option<SystemTime>,
    pub current_message: String,
}

impl DetectionStatus {
    pub fn apply(&mut self, event: &DetectionEvent) {
        match event {
            DetectionEvent::Started => {
                self.started += 1;
                self.detecting = true;
                self.current_message = "Detecting...".into();
            }
            DetectionEvent::NickExtracted(nick) => {
                self.last_nick = Some(nick.clone());
                self.current_message = format!("Found {nick}");
            }
            DetectionEvent::StatsReceived(stats) => {
                self.current_message = format!("Stats received for {}", stats.nick);
            }
            DetectionEvent::AnalysisComplete(result) => {
                self.completed += 1;
                self.detecting = false;
                self.current_message = format!("Analysis ready for {}", result.nick);
            }
            DetectionEvent::Error(message) => {
                self.failed += 1;
                self.detecting = false;
                self.current_message = message.clone();
            }
        }
        self.last_update = Some(SystemTime::now());
    }
}

/// Application status shared between the event loop and shutdown reporting
pub struct AppStatus {
    pub detection: Arc<RwLock<DetectionStatus>>,
}

impl AppStatus {
    pub fn new() -> Self {
        Self {
            detection: Arc::new(RwLock::new(DetectionStatus::default())),
        }
    }
}

impl Default for AppStatus {
    fn default() -> Self {
        Self::new()
    }
}
