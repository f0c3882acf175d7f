use std::fmt::Display;
use std::hash::Hash;

use async_trait::async_trait;

use crate::{Result, Version, Versioned};

/// A record type that can live in a [`Store`].
///
/// Records expose a stable key and a status so the store can be scanned
/// for records in a given lifecycle state.
pub trait Keyed: Clone + Send + Sync + 'static {
    /// The record's key type.
    type Id: Copy + Eq + Hash + Display + Send + Sync;
    /// The record's status type.
    type Status: Copy + Eq + Send + Sync;

    /// Returns the record's key.
    fn id(&self) -> Self::Id;

    /// Returns the record's current status.
    fn status(&self) -> Self::Status;
}

/// Keyed storage with optimistic versioning.
///
/// All implementations must be thread-safe; many workers read and write
/// records concurrently and rely on `put_if_version` to serialize updates
/// to the same record.
#[async_trait]
pub trait Store<R: Keyed>: Send + Sync {
    /// Retrieves a record by key, along with the version it was read at.
    ///
    /// Returns `None` if no record exists for the key.
    async fn get(&self, id: R::Id) -> Result<Option<Versioned<R>>>;

    /// Writes a record, conditioned on the stored version matching
    /// `expected`.
    ///
    /// An insert passes [`Version::initial`]. Fails with
    /// [`StoreError::VersionConflict`] if another writer committed since
    /// the record was read. Returns the version assigned to the write.
    ///
    /// [`StoreError::VersionConflict`]: crate::StoreError::VersionConflict
    async fn put_if_version(&self, record: R, expected: Version) -> Result<Version>;

    /// Lists all records currently in the given status.
    ///
    /// Used for operator-visibility scans (e.g. stuck sagas).
    async fn list_by_status(&self, status: R::Status) -> Result<Vec<Versioned<R>>>;
}
