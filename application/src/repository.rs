use crate::ApplicationError;
use async_trait::async_trait;
use domain::{Entity, EntityId, SearchParams, SearchResult};

/// CRUD over records keyed by id.
///
/// Every lookup failure is [`ApplicationError::NotFound`]; a failed update or
/// delete leaves the store untouched.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Appends a record. Uniqueness rules are the caller's business.
    async fn insert(&self, entity: E) -> Result<(), ApplicationError>;
    /// Retrieves a record by its ID.
    async fn find_by_id(&self, id: &EntityId) -> Result<E, ApplicationError>;
    /// Every record, in storage order.
    async fn find_all(&self) -> Result<Vec<E>, ApplicationError>;
    /// Replaces the stored record sharing `entity`'s id.
    async fn update(&self, entity: E) -> Result<(), ApplicationError>;
    /// Removes the record with the given id.
    async fn delete(&self, id: &EntityId) -> Result<(), ApplicationError>;
}

/// A repository that can answer paginated, filtered, sorted page requests.
#[async_trait]
pub trait SearchableRepository<E: Entity>: Repository<E> {
    async fn search(&self, params: &SearchParams) -> Result<SearchResult<E>, ApplicationError>;
}
