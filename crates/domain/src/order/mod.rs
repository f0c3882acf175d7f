//! Order entity and related types.

mod status;

pub use status::OrderStatus;

use chrono::{DateTime, Utc};
use common::{Money, OrderId, SagaId, UserId};
use serde::{Deserialize, Serialize};
use store::Keyed;

use crate::DomainError;

/// A line item within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price.
    pub price: Money,
    /// Line total (unit price × quantity).
    pub total_price: Money,
}

impl OrderItem {
    /// Creates a line item, computing the line total from the unit price.
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: u32,
        price: Money,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity });
        }
        Ok(Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            price,
            total_price: price.multiply(quantity),
        })
    }
}

/// An order placed by a user.
///
/// At most one saga coordinates an order at a time; `saga_id` links the
/// order to that saga for its whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    total_amount: Money,
    status: OrderStatus,
    shipping_address: String,
    payment_method: String,
    saga_id: Option<SagaId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Places a new order in `Pending` status, computing the total from
    /// the line items.
    pub fn place(
        user_id: UserId,
        items: Vec<OrderItem>,
        shipping_address: impl Into<String>,
        payment_method: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        let total_amount = items.iter().map(|item| item.total_price).sum();
        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            user_id,
            items,
            total_amount,
            status: OrderStatus::Pending,
            shipping_address: shipping_address.into(),
            payment_method: payment_method.into(),
            saga_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the owning user's ID.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the line items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the order total.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    /// Returns the payment method chosen at checkout.
    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    /// Returns the owning saga's ID, if a saga has been started.
    pub fn saga_id(&self) -> Option<SagaId> {
        self.saga_id
    }

    /// Returns when the order was last updated.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Links the order to its saga. Fails if a saga is already assigned.
    pub fn assign_saga(&mut self, saga_id: SagaId) -> Result<(), DomainError> {
        if self.saga_id.is_some() {
            return Err(DomainError::SagaAlreadyAssigned { order_id: self.id });
        }
        self.saga_id = Some(saga_id);
        self.touch();
        Ok(())
    }

    /// Moves the order to a new status, validating the transition.
    pub fn set_status(&mut self, status: OrderStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(status) {
            return Err(DomainError::InvalidOrderTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Keyed for Order {
    type Id = OrderId;
    type Status = OrderStatus;

    fn id(&self) -> OrderId {
        self.id
    }

    fn status(&self) -> OrderStatus {
        self.status
    }
}
