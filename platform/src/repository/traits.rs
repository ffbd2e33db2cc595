//! Repository port traits. Domain services depend only on these; no
//! store-specific query syntax crosses the boundary.

use std::future::Future;

use super::error::RepositoryError;
use super::pagination::FilterCondition;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Per-entity CRUD port. `Id` is the opaque identifier type, `Entity` the
/// record shape, `Create`/`Update` the narrower write-side records.
pub trait Repository<Id, Entity, Create, Update>: Send + Sync {
    fn find_by_id(&self, id: &Id) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    fn find_all(
        &self,
        filters: &[FilterCondition],
    ) -> impl Future<Output = RepositoryResult<Vec<Entity>>> + Send;

    fn count(&self, filters: &[FilterCondition]) -> impl Future<Output = RepositoryResult<u64>> + Send;

    fn exists(&self, id: &Id) -> impl Future<Output = RepositoryResult<bool>> + Send;

    fn create(&self, data: Create) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    fn update(&self, id: &Id, data: Update) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    fn delete(&self, id: &Id) -> impl Future<Output = RepositoryResult<()>> + Send;
}

/// A store capable of applying several mutations atomically. The news
/// cascade delete is the only consumer: if the closure returns `Err`, none
/// of its writes are observable; if it returns `Ok`, all are.
pub trait TransactionalStore: Send + Sync {
    fn run_in_transaction<F, T>(&self, f: F) -> impl Future<Output = RepositoryResult<T>> + Send
    where
        F: FnOnce() -> RepositoryResult<T> + Send;
}
