use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{BusError, Event, MessageBus, Subscription};

#[derive(Default)]
struct InMemoryBusState {
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<Event>>>,
    log: Vec<(String, Event)>,
}

/// In-memory message bus.
///
/// Keeps a log of every publish so tests can assert on exactly what went
/// out on each topic. Redelivery is exercised by publishing the same
/// event value twice — the bus itself never deduplicates, matching the
/// at-least-once transport contract.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    state: Arc<Mutex<InMemoryBusState>>,
    fail_next_publish: Arc<AtomicBool>,
}

impl InMemoryBus {
    /// Creates a new bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every event published on a topic, in publish order.
    pub fn published(&self, topic: &str) -> Vec<Event> {
        let state = self.state.lock().unwrap();
        state
            .log
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Returns the number of events published on a topic.
    pub fn publish_count(&self, topic: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.log.iter().filter(|(t, _)| t == topic).count()
    }

    /// Makes the next `publish` fail with a transient error.
    pub fn set_fail_next_publish(&self, fail: bool) {
        self.fail_next_publish.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, topic: &str, event: Event) -> Result<(), BusError> {
        if self.fail_next_publish.swap(false, Ordering::SeqCst) {
            return Err(BusError::Unavailable("injected failure".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        state.log.push((topic.to_string(), event.clone()));

        if let Some(senders) = state.subscribers.get_mut(topic) {
            // Drop subscribers whose receiving side has gone away
            senders.retain(|sender| sender.send(event.clone()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap();
        state
            .subscribers
            .entry(topic.to_string())
            .or_default()
            .push(sender);
        Subscription::new(topic, receiver)
    }
}
