//! SurrealDB implementation of the document store
//!
//! Provides connection management and the per-collection operations for
//! users, properties and reviews. Records are keyed by UUID strings and
//! read back with `record::id(id)` so the domain types carry plain ids.

use super::{PropertyRepository, ReviewRepository, UserInsert, UserRepository};
use async_trait::async_trait;
use realton_core::{
    DatabaseConfig, DeleteResult, InsertResult, NewProperty, Property, PropertyFilter,
    PropertyStatus, RealtonError, Result, Review, UpdateResult, User, UserRole,
};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

const USERS: &str = "users";
const PROPERTIES: &str = "properties";
const REVIEWS: &str = "reviews";

/// SurrealDB document store
pub struct SurrealDbStore {
    client: Surreal<Client>,
}

impl SurrealDbStore {
    /// Create a new SurrealDB connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        // Remove ws:// or wss:// prefix if present (surrealdb crate adds it automatically)
        let url = config
            .url
            .strip_prefix("ws://")
            .or_else(|| config.url.strip_prefix("wss://"))
            .unwrap_or(&config.url);

        let client = Surreal::new::<Ws>(url)
            .await
            .map_err(store_error("SurrealDB connection failed"))?;

        // Authenticate
        client
            .signin(Root {
                username: &config.user,
                password: &config.password,
            })
            .await
            .map_err(store_error("SurrealDB auth failed"))?;

        // Select namespace and database
        client
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(store_error("SurrealDB namespace error"))?;

        Ok(Self { client })
    }

    /// Initialize schema (idempotent, run on every startup)
    ///
    /// The unique index on `users.email` is what makes registration
    /// insert-if-absent.
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .query(
                r#"
                DEFINE TABLE IF NOT EXISTS users SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS users_email_unique ON users FIELDS email UNIQUE;
                DEFINE TABLE IF NOT EXISTS properties SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS properties_status ON properties FIELDS status;
                DEFINE INDEX IF NOT EXISTS properties_agent ON properties FIELDS agent_email;
                DEFINE TABLE IF NOT EXISTS reviews SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS reviews_property ON reviews FIELDS property_id;
            "#,
            )
            .await
            .map_err(store_error("Schema init failed"))?
            .check()
            .map_err(store_error("Schema init failed"))?;

        Ok(())
    }

    /// Create a record whose id is the document's `id` field
    async fn create<T: Serialize>(&self, table: &'static str, id: &str, doc: &T) -> Result<()> {
        self.client
            .query("CREATE type::thing($table, $id) CONTENT $content RETURN NONE")
            .bind(("table", table))
            .bind(("id", id.to_string()))
            .bind(("content", content_without_id(doc)?))
            .await
            .map_err(store_error("Create failed"))?
            .check()
            .map_err(store_error("Create failed"))?;
        Ok(())
    }

    /// Select one record by id
    async fn select_one<T>(&self, table: &'static str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut response = self
            .client
            .query("SELECT *, record::id(id) AS id FROM type::thing($table, $id)")
            .bind(("table", table))
            .bind(("id", id.to_string()))
            .await
            .map_err(store_error("Select failed"))?;

        let records: Vec<T> = response
            .take(0)
            .map_err(store_error("Result extraction failed"))?;
        Ok(records.into_iter().next())
    }

    /// Delete one record by id, reporting how many were removed
    async fn delete_one(&self, table: &'static str, id: &str) -> Result<DeleteResult> {
        let mut response = self
            .client
            .query("DELETE type::thing($table, $id) RETURN BEFORE")
            .bind(("table", table))
            .bind(("id", id.to_string()))
            .await
            .map_err(store_error("Delete failed"))?;

        let removed: Vec<IgnoredAny> = response
            .take(0)
            .map_err(store_error("Result extraction failed"))?;
        Ok(DeleteResult::deleted(removed.len() as u64))
    }
}

/// Previous role of an updated user
#[derive(Debug, Deserialize)]
struct RoleRecord {
    #[serde(default)]
    role: UserRole,
}

/// Previous status of an updated listing
#[derive(Debug, Deserialize)]
struct StatusRecord {
    #[serde(default)]
    status: PropertyStatus,
}

fn store_error(context: &'static str) -> impl Fn(surrealdb::Error) -> RealtonError {
    move |e| RealtonError::StoreError(format!("{context}: {e}"))
}

/// Serialize a document for storage, leaving the id to the record key
fn content_without_id<T: Serialize>(doc: &T) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(doc)
        .map_err(|e| RealtonError::StoreError(format!("Serialization failed: {e}")))?;
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    Ok(value)
}

fn is_unique_violation(err: &surrealdb::Error) -> bool {
    match err {
        surrealdb::Error::Db(surrealdb::error::Db::IndexExists { .. }) => true,
        // Remote engines only hand back the server's message
        other => other.to_string().contains("already contains"),
    }
}

#[async_trait]
impl UserRepository for SurrealDbStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.client
            .query("SELECT *, record::id(id) AS id FROM users ORDER BY created_at ASC")
            .await
            .map_err(store_error("Query failed"))?
            .take(0)
            .map_err(store_error("Result extraction failed"))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut response = self
            .client
            .query("SELECT *, record::id(id) AS id FROM users WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await
            .map_err(store_error("Query failed"))?;

        let users: Vec<User> = response
            .take(0)
            .map_err(store_error("Result extraction failed"))?;
        Ok(users.into_iter().next())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.select_one(USERS, id).await
    }

    async fn insert_user(&self, user: User) -> Result<UserInsert> {
        let id = user.id.clone();
        let result = self
            .client
            .query("CREATE type::thing($table, $id) CONTENT $content RETURN NONE")
            .bind(("table", USERS))
            .bind(("id", id.clone()))
            .bind(("content", content_without_id(&user)?))
            .await
            .and_then(|response| response.check());

        match result {
            Ok(_) => Ok(UserInsert::Inserted(InsertResult::inserted(id))),
            Err(e) if is_unique_violation(&e) => Ok(UserInsert::EmailExists),
            Err(e) => Err(store_error("Failed to create user")(e)),
        }
    }

    async fn set_user_role(&self, id: &str, role: UserRole) -> Result<UpdateResult> {
        let mut response = self
            .client
            .query("UPDATE type::thing($table, $id) SET role = $role RETURN BEFORE")
            .bind(("table", USERS))
            .bind(("id", id.to_string()))
            .bind(("role", role.as_str()))
            .await
            .map_err(store_error("Failed to update role"))?;

        let before: Vec<RoleRecord> = response
            .take(0)
            .map_err(store_error("Result extraction failed"))?;

        Ok(match before.first() {
            Some(previous) => UpdateResult::matched(previous.role != role),
            None => UpdateResult::unmatched(),
        })
    }

    async fn delete_user(&self, id: &str) -> Result<DeleteResult> {
        self.delete_one(USERS, id).await
    }
}

#[async_trait]
impl PropertyRepository for SurrealDbStore {
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>> {
        let query = r#"
            SELECT *, record::id(id) AS id FROM properties
            WHERE ($status = NONE OR status = $status)
              AND ($agent_email = NONE OR agent_email = $agent_email)
            ORDER BY created_at ASC
        "#;

        self.client
            .query(query)
            .bind(("status", filter.status))
            .bind(("agent_email", filter.agent_email.clone()))
            .await
            .map_err(store_error("Query failed"))?
            .take(0)
            .map_err(store_error("Result extraction failed"))
    }

    async fn find_property(&self, id: &str) -> Result<Option<Property>> {
        self.select_one(PROPERTIES, id).await
    }

    async fn insert_property(&self, property: Property) -> Result<InsertResult> {
        self.create(PROPERTIES, &property.id, &property).await?;
        Ok(InsertResult::inserted(property.id))
    }

    async fn accept_property(&self, id: &str) -> Result<UpdateResult> {
        let mut response = self
            .client
            .query("UPDATE type::thing($table, $id) SET status = 'accepted' RETURN BEFORE")
            .bind(("table", PROPERTIES))
            .bind(("id", id.to_string()))
            .await
            .map_err(store_error("Failed to update status"))?;

        let before: Vec<StatusRecord> = response
            .take(0)
            .map_err(store_error("Result extraction failed"))?;

        Ok(match before.first() {
            Some(previous) => UpdateResult::matched(previous.status != PropertyStatus::Accepted),
            None => UpdateResult::unmatched(),
        })
    }

    async fn upsert_property(&self, id: &str, new: NewProperty) -> Result<UpdateResult> {
        let Some(mut property) = self.select_one::<Property>(PROPERTIES, id).await? else {
            let property = Property::from_new(id.to_string(), new);
            self.create(PROPERTIES, id, &property).await?;
            return Ok(UpdateResult::upserted(id));
        };

        if !property.apply(new) {
            return Ok(UpdateResult::matched(false));
        }

        self.client
            .query("UPDATE type::thing($table, $id) CONTENT $content RETURN NONE")
            .bind(("table", PROPERTIES))
            .bind(("id", id.to_string()))
            .bind(("content", content_without_id(&property)?))
            .await
            .map_err(store_error("Failed to update property"))?
            .check()
            .map_err(store_error("Failed to update property"))?;

        Ok(UpdateResult::matched(true))
    }

    async fn delete_property(&self, id: &str) -> Result<DeleteResult> {
        self.delete_one(PROPERTIES, id).await
    }
}

#[async_trait]
impl ReviewRepository for SurrealDbStore {
    async fn list_reviews(&self, property_id: Option<&str>) -> Result<Vec<Review>> {
        let query = r#"
            SELECT *, record::id(id) AS id FROM reviews
            WHERE ($property_id = NONE OR property_id = $property_id)
            ORDER BY created_at ASC
        "#;

        self.client
            .query(query)
            .bind(("property_id", property_id.map(str::to_string)))
            .await
            .map_err(store_error("Query failed"))?
            .take(0)
            .map_err(store_error("Result extraction failed"))
    }

    async fn insert_review(&self, review: Review) -> Result<InsertResult> {
        self.create(REVIEWS, &review.id, &review).await?;
        Ok(InsertResult::inserted(review.id))
    }
}
