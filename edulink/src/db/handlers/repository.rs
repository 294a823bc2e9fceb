//! Base repository trait for database operations.

/// A repository is a data access layer for one table. It wraps a SQLite
/// connection (pool connection or transaction) and provides strongly-typed
/// operations returning domain models from [`crate::db::models`].
use crate::db::errors::Result;

/// Base repository trait providing the operations every stored resource
/// supports. Resource-specific operations (updates, link-table writes,
/// finders) live on the concrete repository types.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities with filtering and pagination
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Delete an entity by ID
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;
}
