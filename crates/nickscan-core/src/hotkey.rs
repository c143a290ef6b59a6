use std::sync::Arc;

use nickscan_types::DetectionRequest;
use parking_lot::Mutex;

use crate::services::{HotkeyHandler, HotkeyService, WindowSystem};

/// Holds at most one system-wide hotkey registration.
///
/// The registration is released on `unregister()` or, failing that, on drop.
pub struct HotkeyManager {
    service: Arc<dyn HotkeyService>,
    window: Arc<dyn WindowSystem>,
    registered: Mutex<Option<String>>,
}

impl HotkeyManager {
    pub fn new(service: Arc<dyn HotkeyService>, window: Arc<dyn WindowSystem>) -> Self {
        Self {
            service,
            window,
            registered: Mutex::new(None),
        }
    }

    /// Register `combo`; a no-op while another combo is registered.
    ///
    /// The window under the pointer is resolved inside the OS callback, before
    /// `on_trigger` runs, so later pointer movement cannot change the target.
    pub fn register<F>(&self, combo: &str, on_trigger: F) -> anyhow::Result<()>
    where
        F: Fn(DetectionRequest) + Send + Sync + 'static,
    {
        let mut registered = self.registered.lock();
        if let Some(current) = registered.as_deref() {
            tracing::debug!("hotkey {current} already registered, ignoring {combo}");
            return Ok(());
        }

        let window = Arc::clone(&self.window);
        let handler: HotkeyHandler = Arc::new(move || match window.window_under_pointer() {
            Some((handle, title)) => {
                tracing::info!(%handle, "hotkey pressed over '{title}'");
                on_trigger(DetectionRequest::from_hotkey(handle, title));
            }
            None => tracing::debug!("hotkey pressed but no window under pointer"),
        });

        self.service.register(combo, handler)?;
        *registered = Some(combo.to_string());
        tracing::info!("hotkey registered ({combo})");
        Ok(())
    }

    /// Idempotent; never reaches the OS when nothing is registered
    pub fn unregister(&self) -> anyhow::Result<()> {
        let Some(combo) = self.registered.lock().take() else {
            return Ok(());
        };
        self.service.unregister(&combo)?;
        tracing::info!("hotkey unregistered ({combo})");
        Ok(())
    }

    pub fn is_registered(&self) -> bool {
        self.registered.lock().is_some()
    }

    pub fn combo(&self) -> Option<String> {
        self.registered.lock().clone()
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        if let Some(combo) = self.registered.get_mut().take()
            && let Err(e) = self.service.unregister(&combo)
        {
            tracing::warn!("failed to unregister hotkey {combo} on drop: {e:#}");
        }
    }
}
