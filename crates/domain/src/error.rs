//! Domain error types.

use common::OrderId;
use thiserror::Error;

use crate::order::OrderStatus;
use crate::saga::{SagaStatus, StepName, StepStatus};

/// Errors raised by order and saga state machines.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An order must contain at least one line item.
    #[error("Order has no items")]
    EmptyOrder,

    /// Line item quantity must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The order status transition is not allowed.
    #[error("Invalid order transition: {from} -> {to}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },

    /// The order already belongs to a saga; exactly one active saga is
    /// allowed per order.
    #[error("Order {order_id} already has a saga assigned")]
    SagaAlreadyAssigned { order_id: OrderId },

    /// The saga status transition is not allowed.
    #[error("Invalid saga transition: {from} -> {to}")]
    InvalidSagaTransition { from: SagaStatus, to: SagaStatus },

    /// The step status transition is not allowed.
    #[error("Invalid transition for step {step}: {from} -> {to}")]
    InvalidStepTransition {
        step: StepName,
        from: StepStatus,
        to: StepStatus,
    },

    /// The saga plan has no step with this name.
    #[error("Unknown step: {step}")]
    UnknownStep { step: StepName },
}
