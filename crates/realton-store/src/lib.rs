//! Realton Store - Document store abstraction
//!
//! Provides repository traits over the `users`, `properties` and `reviews`
//! collections, with two backends:
//! - SurrealDB (production)
//! - In-process memory (development and tests)
//!
//! Every repository method maps to a single store operation.

use async_trait::async_trait;
use realton_core::{
    DatabaseConfig, DeleteResult, InsertResult, NewProperty, Property, PropertyFilter, Result,
    Review, UpdateResult, User, UserRole,
};
use std::sync::Arc;

pub mod memory;
pub mod surrealdb_store;

pub use memory::MemoryStore;
pub use surrealdb_store::SurrealDbStore;

/// Outcome of registering a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInsert {
    /// A new document was created
    Inserted(InsertResult),
    /// The store already holds a user with this email
    EmailExists,
}

/// Operations on the `users` collection
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users in insertion order
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Look up a user by email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up a user by record id
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Insert a user unless the email is already taken.
    ///
    /// Uniqueness is decided by the store in the same operation as the write.
    async fn insert_user(&self, user: User) -> Result<UserInsert>;

    /// Set the role of a user
    async fn set_user_role(&self, id: &str, role: UserRole) -> Result<UpdateResult>;

    /// Delete a user
    async fn delete_user(&self, id: &str) -> Result<DeleteResult>;
}

/// Operations on the `properties` collection
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Listings matching the filter, in insertion order
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>>;

    /// Look up a listing by record id
    async fn find_property(&self, id: &str) -> Result<Option<Property>>;

    /// Insert a new listing
    async fn insert_property(&self, property: Property) -> Result<InsertResult>;

    /// Mark a listing as accepted
    async fn accept_property(&self, id: &str) -> Result<UpdateResult>;

    /// Replace the editable fields of a listing, creating it if absent
    async fn upsert_property(&self, id: &str, property: NewProperty) -> Result<UpdateResult>;

    /// Delete a listing
    async fn delete_property(&self, id: &str) -> Result<DeleteResult>;
}

/// Operations on the `reviews` collection
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Reviews, optionally restricted to one listing
    async fn list_reviews(&self, property_id: Option<&str>) -> Result<Vec<Review>>;

    /// Insert a new review
    async fn insert_review(&self, review: Review) -> Result<InsertResult>;
}

/// A backend serving all three collections
pub trait DocumentStore: UserRepository + PropertyRepository + ReviewRepository {}

impl<T> DocumentStore for T where T: UserRepository + PropertyRepository + ReviewRepository {}

/// Open the store named by the configuration.
///
/// `mem://` selects the in-process store; anything else is treated as a
/// SurrealDB endpoint. Connection, authentication and schema setup all
/// happen here so that a bad store fails startup.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>> {
    if config.is_memory() {
        tracing::warn!("Using in-memory document store; data is lost on shutdown");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = SurrealDbStore::new(config).await?;
    store.init_schema().await?;
    tracing::info!(
        url = %config.url,
        namespace = %config.namespace,
        database = %config.database,
        "Connected to SurrealDB"
    );
    Ok(Arc::new(store))
}
