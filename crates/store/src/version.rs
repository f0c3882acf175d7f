//! Record versions for optimistic concurrency control.

use serde::{Deserialize, Serialize};

/// Version number of a stored record.
///
/// Versions start at 1 for the first write and increment by 1 on each
/// subsequent write. Version 0 means "the record does not exist yet" and
/// is the expected version for an insert.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for a record that does not exist yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1) assigned by the first write.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record paired with the version it was read at.
///
/// The version must be handed back to [`Store::put_if_version`] when
/// writing the record so the store can detect concurrent modification.
///
/// [`Store::put_if_version`]: crate::Store::put_if_version
#[derive(Debug, Clone)]
pub struct Versioned<R> {
    /// The version the record was read at.
    pub version: Version,
    /// The record itself.
    pub record: R,
}

impl<R> Versioned<R> {
    /// Pairs a record with a version.
    pub fn new(version: Version, record: R) -> Self {
        Self { version, record }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_then_next() {
        assert_eq!(Version::initial().next(), Version::first());
        assert_eq!(Version::first().next(), Version::new(2));
    }

    #[test]
    fn test_ordering() {
        assert!(Version::initial() < Version::first());
        assert!(Version::new(3) > Version::new(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::new(7).to_string(), "7");
    }
}
