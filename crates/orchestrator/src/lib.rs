//! Saga orchestration for the order checkout transaction.
//!
//! The orchestrator owns the saga state machine: it starts a saga when an
//! order is placed, reacts to payment and notification outcome events,
//! and applies compensating actions in reverse order when a step fails.
//! All waiting is event-driven; delivery is at-least-once, so every
//! handler is idempotent.

pub mod dispatch;
pub mod error;
pub mod monitor;
pub mod notifications;
pub mod orchestrator;
pub mod retry;

pub use dispatch::{Disposition, dispatch, run_consumer};
pub use error::{OrchestratorError, Result};
pub use monitor::{StuckSaga, StuckSagaMonitor};
pub use orchestrator::{HandlerOutcome, SagaOrchestrator};
pub use retry::RetryPolicy;
