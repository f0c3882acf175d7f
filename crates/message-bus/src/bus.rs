use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{BusError, Event};

/// A subscription to one topic.
///
/// Events arrive in publish order for the topic; the transport may still
/// deliver the same event more than once.
pub struct Subscription {
    topic: String,
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl Subscription {
    pub(crate) fn new(topic: impl Into<String>, receiver: mpsc::UnboundedReceiver<Event>) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    /// Returns the subscribed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receives the next event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

/// Topic-based publish/subscribe transport.
///
/// Implementations provide at-least-once delivery; consumers are expected
/// to be idempotent.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes an event on a topic.
    async fn publish(&self, topic: &str, event: Event) -> Result<(), BusError>;

    /// Subscribes to a topic, receiving every event published after the
    /// subscription is created.
    async fn subscribe(&self, topic: &str) -> Subscription;
}
