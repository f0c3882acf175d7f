use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Keyed, Result, Store, StoreError, Version, Versioned};

/// In-memory store implementation.
///
/// Backs tests and the demo binary with the same interface a durable
/// external store would provide, including version-conflict behavior.
pub struct InMemoryStore<R: Keyed> {
    records: Arc<RwLock<HashMap<R::Id, (Version, R)>>>,
    fail_next_put: Arc<AtomicBool>,
}

impl<R: Keyed> Clone for InMemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            fail_next_put: Arc::clone(&self.fail_next_put),
        }
    }
}

impl<R: Keyed> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            fail_next_put: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<R: Keyed> InMemoryStore<R> {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Makes the next `put_if_version` fail with a transient error.
    pub fn set_fail_next_put(&self, fail: bool) {
        self.fail_next_put.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl<R: Keyed> Store<R> for InMemoryStore<R> {
    async fn get(&self, id: R::Id) -> Result<Option<Versioned<R>>> {
        let records = self.records.read().await;
        Ok(records
            .get(&id)
            .map(|(version, record)| Versioned::new(*version, record.clone())))
    }

    async fn put_if_version(&self, record: R, expected: Version) -> Result<Version> {
        if self.fail_next_put.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        let mut records = self.records.write().await;
        let id = record.id();
        let current = records
            .get(&id)
            .map(|(version, _)| *version)
            .unwrap_or(Version::initial());

        if current != expected {
            return Err(StoreError::VersionConflict {
                id: id.to_string(),
                expected,
                actual: current,
            });
        }

        let next = current.next();
        records.insert(id, (next, record));
        Ok(next)
    }

    async fn list_by_status(&self, status: R::Status) -> Result<Vec<Versioned<R>>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|(_, record)| record.status() == status)
            .map(|(version, record)| Versioned::new(*version, record.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestRecord {
        id: u64,
        status: char,
    }

    impl Keyed for TestRecord {
        type Id = u64;
        type Status = char;

        fn id(&self) -> u64 {
            self.id
        }

        fn status(&self) -> char {
            self.status
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryStore::new();
        let record = TestRecord { id: 1, status: 'a' };

        let version = store
            .put_if_version(record.clone(), Version::initial())
            .await
            .unwrap();
        assert_eq!(version, Version::first());

        let found = store.get(1).await.unwrap().unwrap();
        assert_eq!(found.version, Version::first());
        assert_eq!(found.record, record);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store: InMemoryStore<TestRecord> = InMemoryStore::new();
        assert!(store.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_conflict_when_record_exists() {
        let store = InMemoryStore::new();
        let record = TestRecord { id: 1, status: 'a' };
        store
            .put_if_version(record.clone(), Version::initial())
            .await
            .unwrap();

        let result = store.put_if_version(record, Version::initial()).await;
        assert!(matches!(
            result,
            Err(StoreError::VersionConflict { expected, actual, .. })
                if expected == Version::initial() && actual == Version::first()
        ));
    }

    #[tokio::test]
    async fn test_update_with_matching_version() {
        let store = InMemoryStore::new();
        let mut record = TestRecord { id: 1, status: 'a' };
        let v1 = store
            .put_if_version(record.clone(), Version::initial())
            .await
            .unwrap();

        record.status = 'b';
        let v2 = store.put_if_version(record, v1).await.unwrap();
        assert_eq!(v2, Version::new(2));

        let found = store.get(1).await.unwrap().unwrap();
        assert_eq!(found.record.status, 'b');
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let store = InMemoryStore::new();
        let mut record = TestRecord { id: 1, status: 'a' };
        let v1 = store
            .put_if_version(record.clone(), Version::initial())
            .await
            .unwrap();

        record.status = 'b';
        store.put_if_version(record.clone(), v1).await.unwrap();

        // Second writer still holds v1
        record.status = 'c';
        let result = store.put_if_version(record, v1).await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let store = InMemoryStore::new();
        for (id, status) in [(1, 'a'), (2, 'b'), (3, 'a')] {
            store
                .put_if_version(TestRecord { id, status }, Version::initial())
                .await
                .unwrap();
        }

        let mut found = store.list_by_status('a').await.unwrap();
        found.sort_by_key(|v| v.record.id);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].record.id, 1);
        assert_eq!(found[1].record.id, 3);

        assert!(store.list_by_status('z').await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_transient_failure() {
        let store = InMemoryStore::new();
        store.set_fail_next_put(true);

        let result = store
            .put_if_version(TestRecord { id: 1, status: 'a' }, Version::initial())
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        // Only the next put fails
        store
            .put_if_version(TestRecord { id: 1, status: 'a' }, Version::initial())
            .await
            .unwrap();
    }
}
