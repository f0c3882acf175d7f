//! Notification request templates.

use domain::{Order, Saga};
use message_bus::{Event, EventPayload, NotificationChannel};

/// Subject of the order-confirmation notification.
pub const CONFIRMATION_SUBJECT: &str = "Order Confirmation";

/// Body of the order-confirmation notification.
pub const CONFIRMATION_MESSAGE: &str =
    "Your order has been confirmed and payment processed successfully.";

/// Subject of the cancellation notification.
pub const CANCELLATION_SUBJECT: &str = "Order Cancelled";

/// Body of the cancellation notification.
pub const CANCELLATION_MESSAGE: &str = "Your order has been cancelled due to payment failure.";

/// Builds the confirmation request published after a successful payment.
pub fn confirmation(saga: &Saga, order: &Order) -> Event {
    Event::new(
        saga.id(),
        saga.user_id(),
        EventPayload::OrderConfirmation {
            recipient: saga.user_id().to_string(),
            subject: CONFIRMATION_SUBJECT.to_string(),
            message: CONFIRMATION_MESSAGE.to_string(),
            channel: NotificationChannel::Email,
            order_id: order.id(),
        },
    )
}

/// Builds the cancellation request published during compensation.
pub fn cancellation(saga: &Saga) -> Event {
    Event::new(
        saga.id(),
        saga.user_id(),
        EventPayload::OrderCancelled {
            recipient: saga.user_id().to_string(),
            subject: CANCELLATION_SUBJECT.to_string(),
            message: CANCELLATION_MESSAGE.to_string(),
            channel: NotificationChannel::Email,
            order_id: saga.order_id(),
        },
    )
}
