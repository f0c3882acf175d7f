//! Topic names.

/// Order announcements consumed by the payment processor.
pub const ORDER_CREATED: &str = "order.created";

/// Payment outcomes published by the payment processor.
pub const PAYMENT_PROCESSED: &str = "payment.processed";

/// Notification requests consumed by the notification dispatcher.
pub const NOTIFICATION_REQUESTED: &str = "notification.requested";

/// Notification delivery outcomes published by the dispatcher.
pub const NOTIFICATION_SENT: &str = "notification.sent";

/// Refund requests emitted by the refund compensation action.
pub const PAYMENT_REFUND_REQUESTED: &str = "payment.refund.requested";
