//! Broadcast-channel event bus

use crate::{event::Event, topic::Topic};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

/// Default per-topic channel capacity
const DEFAULT_CAPACITY: usize = 1024;

/// In-process event bus
///
/// One broadcast channel per topic, created lazily. Cloning the bus is
/// cheap and all clones share the same channels.
#[derive(Clone)]
pub struct EventBus {
    channels: std::sync::Arc<DashMap<Topic, broadcast::Sender<Event>>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// Create a bus with the given per-topic channel capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: std::sync::Arc::new(DashMap::new()),
            capacity,
        }
    }

    fn sender(&self, topic: Topic) -> broadcast::Sender<Event> {
        self.channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Publish an event
    ///
    /// Never blocks and never fails: with no live subscribers the event is
    /// dropped with a debug log. Returns the published envelope so callers
    /// can log or correlate it.
    pub fn publish(&self, topic: Topic, payload: serde_json::Value) -> Event {
        let event = Event::new(topic, payload);

        match self.sender(topic).send(event.clone()) {
            Ok(receivers) => {
                debug!(topic = %topic, event_id = %event.id, receivers, "Event published");
            }
            Err(_) => {
                debug!(topic = %topic, event_id = %event.id, "Event dropped (no subscribers)");
            }
        }

        event
    }

    /// Subscribe to a topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Number of live subscribers for a topic
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels
            .get(&topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}
