use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::bail;
use nickscan_core::{EventHandler, EventSubscriptionService, SubscriptionId};
use nickscan_types::WindowEvent;
use parking_lot::RwLock;

type Subscribers = Vec<(SubscriptionId, EventHandler)>;

/// In-process publish/subscribe for named window events.
///
/// Handlers run synchronously on the publishing thread, outside the lock, so
/// they may subscribe or unsubscribe while being called.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    topics: RwLock<HashMap<String, Subscribers>>,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver `event` to every subscriber of `name`, returning how many got it
    pub fn publish(&self, name: &str, event: WindowEvent) -> usize {
        let handlers: Vec<EventHandler> = match self.topics.read().get(name) {
            Some(subscribers) => subscribers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => Vec::new(),
        };

        if handlers.is_empty() {
            tracing::trace!("no subscribers for {name}");
        }
        for handler in &handlers {
            handler(event.clone());
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.topics.read().get(name).map_or(0, Vec::len)
    }
}

impl EventSubscriptionService for EventBus {
    fn subscribe(&self, event_name: &str, handler: EventHandler) -> anyhow::Result<SubscriptionId> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.topics
            .write()
            .entry(event_name.to_string())
            .or_default()
            .push((id, handler));
        tracing::debug!("{id} subscribed to {event_name}");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> anyhow::Result<()> {
        let mut topics = self.topics.write();
        for subscribers in topics.values_mut() {
            if let Some(pos) = subscribers.iter().position(|(sid, _)| *sid == id) {
                subscribers.remove(pos);
                tracing::debug!("{id} unsubscribed");
                return Ok(());
            }
        }
        bail!("unknown subscription {id}")
    }
}
