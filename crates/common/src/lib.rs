//! Shared types used across the order saga workspace.

pub mod ids;
pub mod money;

pub use ids::{EventId, OrderId, SagaId, UserId};
pub use money::Money;
