//! Order and saga entities.
//!
//! The saga entity is the audit trail of one distributed order
//! transaction: a fixed plan of steps, each with a declared compensating
//! action, advanced by the orchestrator as outcome events arrive. The
//! order entity carries the user-visible status derived from those same
//! transitions.

mod error;
pub mod order;
pub mod saga;

pub use error::DomainError;
pub use order::{Order, OrderItem, OrderStatus};
pub use saga::{CompensationAction, Saga, SagaStatus, SagaStep, StepName, StepStatus};
