//! Store error types.

use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The expected version did not match the stored version.
    ///
    /// Another writer committed first; the caller should re-read the
    /// record and recompute its transition.
    #[error("Version conflict for record {id}: expected version {expected}, found {actual}")]
    VersionConflict {
        id: String,
        expected: Version,
        actual: Version,
    },

    /// The store is temporarily unreachable. Retryable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true for transient infrastructure failures that a bounded
    /// retry can reasonably recover from.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }

    /// Returns true when the write lost an optimistic concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let conflict = StoreError::VersionConflict {
            id: "abc".to_string(),
            expected: Version::first(),
            actual: Version::new(2),
        };
        assert!(conflict.is_conflict());
        assert!(!conflict.is_transient());

        let unavailable = StoreError::Unavailable("connection refused".to_string());
        assert!(unavailable.is_transient());
        assert!(!unavailable.is_conflict());
    }
}
