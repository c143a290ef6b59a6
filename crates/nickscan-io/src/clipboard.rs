use anyhow::Context;
use arboard::Clipboard;
use async_trait::async_trait;
use nickscan_core::ClipboardService;

/// System clipboard via arboard.
///
/// A fresh handle is opened per write on a blocking thread; arboard handles are
/// not `Send` on every platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClipboardService for SystemClipboard {
    async fn write(&self, text: &str) -> anyhow::Result<()> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard = Clipboard::new().context("Failed to open clipboard")?;
            clipboard
                .set_text(text)
                .context("Failed to write clipboard text")
        })
        .await?
    }
}
