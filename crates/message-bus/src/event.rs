//! Events exchanged over the bus.

use chrono::{DateTime, Utc};
use common::{EventId, Money, OrderId, SagaId, UserId};
use serde::{Deserialize, Serialize};

use crate::topics;

/// Outcome of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    Failed,
}

/// Channel a notification is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
    InApp,
}

/// Outcome of a notification delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// A line item as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
}

/// Event payload, tagged by event type on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum EventPayload {
    /// An order was placed and its saga started.
    #[serde(rename = "ORDER_CREATED")]
    OrderCreated {
        order_id: OrderId,
        total_amount: Money,
        items: Vec<OrderLine>,
        shipping_address: String,
    },

    /// The payment processor resolved a payment attempt.
    #[serde(rename = "PAYMENT_PROCESSED")]
    PaymentProcessed {
        payment_id: String,
        order_id: OrderId,
        amount: Money,
        payment_method: String,
        status: PaymentStatus,
        transaction_id: Option<String>,
        failure_reason: Option<String>,
    },

    /// The orchestrator asks the dispatcher to deliver an order
    /// confirmation.
    #[serde(rename = "ORDER_CONFIRMATION")]
    OrderConfirmation {
        recipient: String,
        subject: String,
        message: String,
        channel: NotificationChannel,
        order_id: OrderId,
    },

    /// The orchestrator asks the dispatcher to deliver a cancellation
    /// notice.
    #[serde(rename = "ORDER_CANCELLED")]
    OrderCancelled {
        recipient: String,
        subject: String,
        message: String,
        channel: NotificationChannel,
        order_id: OrderId,
    },

    /// The dispatcher resolved a notification delivery.
    #[serde(rename = "NOTIFICATION_SENT")]
    NotificationSent {
        recipient: String,
        channel: NotificationChannel,
        order_id: OrderId,
        status: DeliveryStatus,
        failure_reason: Option<String>,
    },

    /// The refund compensation asks the payment processor to refund a
    /// captured payment.
    #[serde(rename = "REFUND_REQUESTED")]
    RefundRequested {
        payment_id: String,
        order_id: OrderId,
        amount: Money,
    },
}

impl EventPayload {
    /// Returns the wire event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::OrderCreated { .. } => "ORDER_CREATED",
            EventPayload::PaymentProcessed { .. } => "PAYMENT_PROCESSED",
            EventPayload::OrderConfirmation { .. } => "ORDER_CONFIRMATION",
            EventPayload::OrderCancelled { .. } => "ORDER_CANCELLED",
            EventPayload::NotificationSent { .. } => "NOTIFICATION_SENT",
            EventPayload::RefundRequested { .. } => "REFUND_REQUESTED",
        }
    }

    /// Returns the topic this payload is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            EventPayload::OrderCreated { .. } => topics::ORDER_CREATED,
            EventPayload::PaymentProcessed { .. } => topics::PAYMENT_PROCESSED,
            EventPayload::OrderConfirmation { .. } | EventPayload::OrderCancelled { .. } => {
                topics::NOTIFICATION_REQUESTED
            }
            EventPayload::NotificationSent { .. } => topics::NOTIFICATION_SENT,
            EventPayload::RefundRequested { .. } => topics::PAYMENT_REFUND_REQUESTED,
        }
    }
}

/// An event on the bus.
///
/// `event_id` is the idempotency key: redelivery duplicates the id, and
/// consumers use it (together with the saga's own step state) to drop
/// already-applied events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub timestamp: DateTime<Utc>,
    pub saga_id: SagaId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    /// Wraps a payload in a fresh envelope for the given saga and user.
    pub fn new(saga_id: SagaId, user_id: UserId, payload: EventPayload) -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: Utc::now(),
            saga_id,
            user_id,
            payload,
        }
    }

    /// Returns the wire event type.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    /// Returns the topic this event belongs on.
    pub fn topic(&self) -> &'static str {
        self.payload.topic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment_event(status: PaymentStatus) -> Event {
        Event::new(
            SagaId::new(),
            UserId::new(),
            EventPayload::PaymentProcessed {
                payment_id: "PAY-0001".to_string(),
                order_id: OrderId::new(),
                amount: Money::from_cents(4500),
                payment_method: "CREDIT_CARD".to_string(),
                status,
                transaction_id: Some("TXN-42".to_string()),
                failure_reason: None,
            },
        )
    }

    #[test]
    fn test_event_type_and_topic() {
        let event = payment_event(PaymentStatus::Success);
        assert_eq!(event.event_type(), "PAYMENT_PROCESSED");
        assert_eq!(event.topic(), topics::PAYMENT_PROCESSED);
    }

    #[test]
    fn test_envelope_fields_flattened_on_wire() {
        let event = payment_event(PaymentStatus::Failed);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventType"], "PAYMENT_PROCESSED");
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["saga_id"], event.saga_id.to_string());
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let event = Event::new(
            SagaId::new(),
            UserId::new(),
            EventPayload::OrderCreated {
                order_id: OrderId::new(),
                total_amount: Money::from_cents(10000),
                items: vec![OrderLine {
                    product_id: "SKU-001".to_string(),
                    product_name: "Widget".to_string(),
                    quantity: 2,
                    price: Money::from_cents(5000),
                }],
                shipping_address: "1 Main St".to_string(),
            },
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.event_id, event.event_id);
        assert_eq!(deserialized.event_type(), "ORDER_CREATED");
    }

    #[test]
    fn test_redelivered_event_keeps_id() {
        let event = payment_event(PaymentStatus::Success);
        let redelivered = event.clone();
        assert_eq!(event.event_id, redelivered.event_id);
    }
}
