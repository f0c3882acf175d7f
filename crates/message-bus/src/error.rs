//! Bus error types.

use thiserror::Error;

/// Errors that can occur when interacting with the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus is temporarily unreachable. Retryable.
    #[error("Bus unavailable: {0}")]
    Unavailable(String),

    /// The event could not be serialized for transport.
    #[error("Event serialization failed: {0}")]
    Serialization(String),
}

impl BusError {
    /// Returns true for transient infrastructure failures that a bounded
    /// retry can reasonably recover from.
    pub fn is_transient(&self) -> bool {
        matches!(self, BusError::Unavailable(_))
    }
}
