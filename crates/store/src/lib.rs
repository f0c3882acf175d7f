//! Keyed durable storage with optimistic concurrency control.
//!
//! The saga and order records live in an external store reachable only
//! through this interface: `get`, a version-conditioned `put_if_version`,
//! and `list_by_status` for stuck-record scans. Optimistic versioning is
//! what serializes concurrent updates to the same record when many workers
//! process events for the same saga.

pub mod error;
pub mod memory;
pub mod store;
pub mod version;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use store::{Keyed, Store};
pub use version::{Version, Versioned};
