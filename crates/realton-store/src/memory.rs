//! In-process document store
//!
//! Keeps each collection in a `Vec` behind an async `RwLock`, preserving
//! insertion order. Each operation holds the collection's lock for its whole
//! duration, so check-and-write sequences (such as email uniqueness) are
//! atomic.

use super::{PropertyRepository, ReviewRepository, UserInsert, UserRepository};
use async_trait::async_trait;
use realton_core::{
    DeleteResult, InsertResult, NewProperty, Property, PropertyFilter, PropertyStatus, Result,
    Review, UpdateResult, User, UserRole,
};
use tokio::sync::RwLock;

/// Memory-backed store
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    properties: RwLock<Vec<Property>>,
    reviews: RwLock<Vec<Review>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_user(&self, user: User) -> Result<UserInsert> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Ok(UserInsert::EmailExists);
        }
        let result = InsertResult::inserted(user.id.clone());
        users.push(user);
        Ok(UserInsert::Inserted(result))
    }

    async fn set_user_role(&self, id: &str, role: UserRole) -> Result<UpdateResult> {
        let mut users = self.users.write().await;
        Ok(match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                let modified = user.role != role;
                user.role = role;
                UpdateResult::matched(modified)
            }
            None => UpdateResult::unmatched(),
        })
    }

    async fn delete_user(&self, id: &str) -> Result<DeleteResult> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(DeleteResult::deleted((before - users.len()) as u64))
    }
}

#[async_trait]
impl PropertyRepository for MemoryStore {
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>> {
        let properties = self.properties.read().await;
        Ok(properties
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn find_property(&self, id: &str) -> Result<Option<Property>> {
        let properties = self.properties.read().await;
        Ok(properties.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_property(&self, property: Property) -> Result<InsertResult> {
        let result = InsertResult::inserted(property.id.clone());
        self.properties.write().await.push(property);
        Ok(result)
    }

    async fn accept_property(&self, id: &str) -> Result<UpdateResult> {
        let mut properties = self.properties.write().await;
        Ok(match properties.iter_mut().find(|p| p.id == id) {
            Some(property) => {
                let modified = property.status != PropertyStatus::Accepted;
                property.status = PropertyStatus::Accepted;
                UpdateResult::matched(modified)
            }
            None => UpdateResult::unmatched(),
        })
    }

    async fn upsert_property(&self, id: &str, new: NewProperty) -> Result<UpdateResult> {
        let mut properties = self.properties.write().await;
        if let Some(property) = properties.iter_mut().find(|p| p.id == id) {
            let modified = property.apply(new);
            return Ok(UpdateResult::matched(modified));
        }
        properties.push(Property::from_new(id.to_string(), new));
        Ok(UpdateResult::upserted(id))
    }

    async fn delete_property(&self, id: &str) -> Result<DeleteResult> {
        let mut properties = self.properties.write().await;
        let before = properties.len();
        properties.retain(|p| p.id != id);
        Ok(DeleteResult::deleted((before - properties.len()) as u64))
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn list_reviews(&self, property_id: Option<&str>) -> Result<Vec<Review>> {
        let reviews = self.reviews.read().await;
        Ok(reviews
            .iter()
            .filter(|r| property_id.map_or(true, |id| r.property_id == id))
            .cloned()
            .collect())
    }

    async fn insert_review(&self, review: Review) -> Result<InsertResult> {
        let result = InsertResult::inserted(review.id.clone());
        self.reviews.write().await.push(review);
        Ok(result)
    }
}
