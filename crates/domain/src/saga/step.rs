//! Saga step names and their declared compensating actions.

use serde::{Deserialize, Serialize};

/// The steps of the order saga plan, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepName {
    /// Order persisted and announced on the bus.
    OrderCreated,

    /// Payment captured by the payment processor.
    PaymentProcessing,

    /// Confirmation notification delivered to the user.
    NotificationSent,
}

impl StepName {
    /// The saga plan in execution order.
    pub const PLAN: [StepName; 3] = [
        StepName::OrderCreated,
        StepName::PaymentProcessing,
        StepName::NotificationSent,
    ];

    /// Returns the compensating action declared for this step.
    pub fn compensation(&self) -> CompensationAction {
        match self {
            StepName::OrderCreated => CompensationAction::CancelOrder,
            StepName::PaymentProcessing => CompensationAction::RefundPayment,
            StepName::NotificationSent => CompensationAction::SendCancellationNotification,
        }
    }

    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::OrderCreated => "ORDER_CREATED",
            StepName::PaymentProcessing => "PAYMENT_PROCESSING",
            StepName::NotificationSent => "NOTIFICATION_SENT",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The compensating actions a step can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompensationAction {
    /// Cancel the order and notify the user.
    CancelOrder,

    /// Request a refund of the captured payment.
    RefundPayment,

    /// Send a cancellation notification superseding the confirmation.
    SendCancellationNotification,
}

impl CompensationAction {
    /// Returns the action name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationAction::CancelOrder => "CANCEL_ORDER",
            CompensationAction::RefundPayment => "REFUND_PAYMENT",
            CompensationAction::SendCancellationNotification => "SEND_CANCELLATION_NOTIFICATION",
        }
    }
}

impl std::fmt::Display for CompensationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
