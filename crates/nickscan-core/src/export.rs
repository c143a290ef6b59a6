use std::sync::Arc;

use crate::error::DetectionError;
use crate::services::ClipboardService;

/// Best-effort clipboard export; failures never touch cached results
pub struct ClipboardExporter {
    clipboard: Arc<dyn ClipboardService>,
}

impl ClipboardExporter {
    pub fn new(clipboard: Arc<dyn ClipboardService>) -> Self {
        Self { clipboard }
    }

    pub async fn write(&self, text: &str) -> Result<(), DetectionError> {
        self.clipboard
            .write(text)
            .await
            .map_err(|e| DetectionError::Clipboard(format!("{e:#}")))?;
        tracing::debug!("copied {} chars to clipboard", text.len());
        Ok(())
    }
}
