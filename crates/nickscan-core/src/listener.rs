use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nickscan_types::DetectionRequest;
use parking_lot::Mutex;

use crate::services::{EventHandler, EventSubscriptionService, SubscriptionId};

/// Event published by the OS right-click hook
pub const RIGHT_CLICK_EVENT: &str = "profile_right_click";

/// Long-lived subscription to right-click captures.
///
/// The subscription survives deactivation; events are dropped while inactive.
/// Every event that passes starts its own detection, nothing is coalesced.
pub struct WindowEventListener {
    service: Arc<dyn EventSubscriptionService>,
    active: Arc<AtomicBool>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl WindowEventListener {
    pub fn new(service: Arc<dyn EventSubscriptionService>, active: Arc<AtomicBool>) -> Self {
        Self {
            service,
            active,
            subscription: Mutex::new(None),
        }
    }

    pub fn subscribe<F>(&self, on_trigger: F) -> anyhow::Result<()>
    where
        F: Fn(DetectionRequest) + Send + Sync + 'static,
    {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return Ok(());
        }

        let active = Arc::clone(&self.active);
        let handler: EventHandler = Arc::new(move |event| {
            if !active.load(Ordering::Acquire) {
                tracing::trace!(handle = %event.handle, "right-click ignored, detector inactive");
                return;
            }
            tracing::info!(
                handle = %event.handle,
                x = event.x,
                y = event.y,
                "right-click on '{}'",
                event.title
            );
            on_trigger(DetectionRequest::from(event));
        });

        let id = self.service.subscribe(RIGHT_CLICK_EVENT, handler)?;
        *subscription = Some(id);
        tracing::info!("subscribed to {RIGHT_CLICK_EVENT} ({id})");
        Ok(())
    }

    pub fn unsubscribe(&self) -> anyhow::Result<()> {
        let Some(id) = self.subscription.lock().take() else {
            return Ok(());
        };
        self.service.unsubscribe(id)?;
        tracing::info!("unsubscribed from {RIGHT_CLICK_EVENT} ({id})");
        Ok(())
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().is_some()
    }
}

impl Drop for WindowEventListener {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get_mut().take()
            && let Err(e) = self.service.unsubscribe(id)
        {
            tracing::warn!("failed to unsubscribe {id} on drop: {e:#}");
        }
    }
}
