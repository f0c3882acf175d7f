//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// The saga drives the payment leg:
/// ```text
/// Pending ──► PaymentProcessing ──┬──► PaymentCompleted ──► Shipped ──► Delivered
///                                 └──► PaymentFailed ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been placed but not yet picked up by a saga.
    #[default]
    Pending,

    /// Order confirmed by the user, awaiting processing.
    Confirmed,

    /// Payment has been requested from the payment processor.
    PaymentProcessing,

    /// Payment captured successfully.
    PaymentCompleted,

    /// Payment attempt failed.
    PaymentFailed,

    /// Order handed to the carrier.
    Shipped,

    /// Order delivered (terminal state).
    Delivered,

    /// Order cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the transition to `next` is allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, PaymentProcessing)
                | (Pending, Cancelled)
                | (Confirmed, PaymentProcessing)
                | (Confirmed, Cancelled)
                | (PaymentProcessing, PaymentCompleted)
                | (PaymentProcessing, PaymentFailed)
                | (PaymentProcessing, Cancelled)
                | (PaymentCompleted, Shipped)
                | (PaymentCompleted, Cancelled)
                | (PaymentFailed, Cancelled)
                | (Shipped, Delivered)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::PaymentProcessing => "PAYMENT_PROCESSING",
            OrderStatus::PaymentCompleted => "PAYMENT_COMPLETED",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_payment_outcomes() {
        assert!(OrderStatus::PaymentProcessing.can_transition_to(OrderStatus::PaymentCompleted));
        assert!(OrderStatus::PaymentProcessing.can_transition_to(OrderStatus::PaymentFailed));
        assert!(!OrderStatus::PaymentCompleted.can_transition_to(OrderStatus::PaymentFailed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::PaymentFailed.is_terminal());
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&OrderStatus::PaymentProcessing).unwrap();
        assert_eq!(json, "\"PAYMENT_PROCESSING\"");
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::PaymentFailed.to_string(), "PAYMENT_FAILED");
    }
}
