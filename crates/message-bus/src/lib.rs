//! Message bus interface and event model.
//!
//! All cross-service interaction in the saga is message-mediated: the
//! orchestrator publishes commands/events on topics and consumes outcome
//! events published by the payment processor and notification dispatcher.
//! The transport guarantees at-least-once delivery with no cross-topic
//! ordering, so every event carries an idempotency key and consumers must
//! tolerate duplicates.

pub mod bus;
pub mod error;
pub mod event;
pub mod memory;
pub mod topics;

pub use bus::{MessageBus, Subscription};
pub use error::BusError;
pub use event::{
    DeliveryStatus, Event, EventPayload, NotificationChannel, OrderLine, PaymentStatus,
};
pub use memory::InMemoryBus;
