//! Orchestrator error taxonomy.
//!
//! The dispatch layer branches on these kinds: business-rule violations
//! are logged and the event dropped (retrying cannot change the outcome),
//! transient infrastructure failures are surfaced to the transport's
//! redelivery mechanism, and compensation failures are flagged for manual
//! remediation.

use common::{OrderId, SagaId};
use domain::{DomainError, StepName};
use message_bus::BusError;
use store::StoreError;
use thiserror::Error;

/// Errors raised while handling saga events.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No saga exists for the event's saga ID. Indicates a bug or an
    /// already-archived saga; the event is dropped.
    #[error("Saga not found: {0}")]
    SagaNotFound(SagaId),

    /// The saga references an order that does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order already has an active saga; exactly one is allowed.
    #[error("Order {0} already has an active saga")]
    SagaAlreadyStarted(OrderId),

    /// A step outcome arrived before the step it depends on completed.
    /// Dropped; the expected event drives progress once it arrives.
    #[error("Out-of-order event for saga {saga_id}: {step} outcome before {expected} completed")]
    OutOfOrderStep {
        saga_id: SagaId,
        step: StepName,
        expected: StepName,
    },

    /// A handler received a payload it does not handle.
    #[error("Unexpected payload {actual} for handler {handler}")]
    UnexpectedPayload {
        handler: &'static str,
        actual: &'static str,
    },

    /// A state-machine rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Bus failure.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The optimistic write loop kept losing version races.
    #[error("Gave up after {attempts} optimistic retries for saga {saga_id}")]
    ConflictRetriesExhausted { saga_id: SagaId, attempts: u32 },

    /// A compensating action failed; the saga stays in `COMPENSATING`
    /// with the failure recorded on the step, awaiting manual remediation.
    #[error("Compensation for step {step} of saga {saga_id} failed: {reason}")]
    CompensationFailed {
        saga_id: SagaId,
        step: StepName,
        reason: String,
    },
}

impl OrchestratorError {
    /// Returns true if redelivering the event may succeed.
    ///
    /// Version conflicts that escape a handler's optimistic loop are
    /// retryable too: handlers are idempotent, so re-running the whole
    /// handler against fresh state is always safe.
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::Store(e) => e.is_transient() || e.is_conflict(),
            OrchestratorError::Bus(e) => e.is_transient(),
            OrchestratorError::ConflictRetriesExhausted { .. } => true,
            _ => false,
        }
    }
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
