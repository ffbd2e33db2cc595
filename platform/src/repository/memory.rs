//! In-memory repository building blocks.
//!
//! The document store itself is out of scope; every service ships against
//! these `DashMap`-backed stores by default, which is enough to exercise
//! every invariant the domain services enforce. A deployment wires a real
//! document-store-backed `Repository` impl behind the same trait.

use std::hash::Hash;
use std::sync::Mutex;

use dashmap::DashMap;

use super::error::RepositoryError;
use super::traits::{RepositoryResult, TransactionalStore};

/// A generic keyed store. Entity-specific repositories wrap one (or more,
/// for the news cascade) of these and layer the invariant checks the
/// `Repository` impl must enforce (uniqueness, ownership, etc).
#[derive(Debug)]
pub struct InMemoryStore<Id: Eq + Hash, Entity> {
    rows: DashMap<Id, Entity>,
}

impl<Id, Entity> Default for InMemoryStore<Id, Entity>
where
    Id: Eq + Hash,
{
    fn default() -> Self {
        Self { rows: DashMap::new() }
    }
}

impl<Id, Entity> InMemoryStore<Id, Entity>
where
    Id: Eq + Hash + Clone,
    Entity: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Id) -> Option<Entity> {
        self.rows.get(id).map(|r| r.value().clone())
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.rows.contains_key(id)
    }

    pub fn insert(&self, id: Id, entity: Entity) {
        self.rows.insert(id, entity);
    }

    pub fn remove(&self, id: &Id) -> Option<Entity> {
        self.rows.remove(id).map(|(_, v)| v)
    }

    pub fn all(&self) -> Vec<Entity> {
        self.rows.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Coordinates atomic multi-store mutation (the news cascade). A single
/// process-wide mutex stands in for the document store's multi-document
/// transaction (snapshot read / majority write) per the deployment note
/// about the outbox fallback: here, since we own the in-memory store
/// outright, a critical section gives the same all-or-nothing guarantee.
#[derive(Debug, Default)]
pub struct TransactionLock(Mutex<()>);

impl TransactionLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionalStore for TransactionLock {
    async fn run_in_transaction<F, T>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce() -> RepositoryResult<T> + Send,
    {
        let _guard = self
            .0
            .lock()
            .map_err(|_| RepositoryError::new(
                super::error::RepositoryOperation::Transaction,
                super::error::RepositoryErrorKind::Other,
                "transaction",
                "lock poisoned",
            ))?;
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_roundtrip() {
        let store: InMemoryStore<String, i32> = InMemoryStore::new();
        store.insert("a".to_string(), 1);
        assert_eq!(store.get(&"a".to_string()), Some(1));
        assert_eq!(store.get(&"b".to_string()), None);
    }

    #[test]
    fn remove_returns_previous_value() {
        let store: InMemoryStore<String, i32> = InMemoryStore::new();
        store.insert("a".to_string(), 1);
        assert_eq!(store.remove(&"a".to_string()), Some(1));
        assert!(!store.contains(&"a".to_string()));
    }

    #[tokio::test]
    async fn transaction_lock_propagates_failure_from_closure() {
        let lock = TransactionLock::new();
        let result: RepositoryResult<()> =
            lock.run_in_transaction(|| Err(RepositoryError::not_found("thing", "x"))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn transaction_lock_commits_all_effects_on_success() {
        let lock = TransactionLock::new();
        let store: InMemoryStore<String, i32> = InMemoryStore::new();
        let result = lock
            .run_in_transaction(|| {
                store.insert("a".to_string(), 1);
                store.insert("b".to_string(), 2);
                Ok(())
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(store.len(), 2);
    }
}
