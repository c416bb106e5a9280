//! Domain models for the listing service
//!
//! These map one-to-one onto the three document collections:
//! - `users`: accounts and their role
//! - `properties`: listings submitted by agents
//! - `reviews`: reviews left on listings
//!
//! The write result types mirror what a document driver reports back for
//! insert/update/delete and are returned to clients unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{RealtonError, Result};

/// User role enum
///
/// Defines the access level for a user:
/// - Unset: Regular user (the default, never serialized)
/// - Admin: Manages users and approves listings
/// - Agent: Publishes and maintains listings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Unset,
    Admin,
    Agent,
}

impl UserRole {
    /// Convert role to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Unset => "unset",
            UserRole::Admin => "admin",
            UserRole::Agent => "agent",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, UserRole::Unset)
    }

    /// Whether this role passes a gate requiring any of `required`.
    ///
    /// Admin passes every gate.
    pub fn satisfies(&self, required: &[UserRole]) -> bool {
        *self == UserRole::Admin || required.contains(self)
    }
}

impl std::str::FromStr for UserRole {
    type Err = RealtonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "" | "unset" => Ok(UserRole::Unset),
            "admin" => Ok(UserRole::Admin),
            "agent" => Ok(UserRole::Agent),
            other => Err(RealtonError::ValidationError(format!("unknown role: {other}"))),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User account record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct User {
    /// Record id (UUID v4)
    pub id: String,

    /// Email address (unique)
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    #[serde(default, skip_serializing_if = "UserRole::is_unset")]
    pub role: UserRole,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh record from a registration payload
    pub fn from_new(new: NewUser) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(&new.email),
            name: new.name,
            photo_url: new.photo_url,
            role: UserRole::Unset,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_agent(&self) -> bool {
        self.role == UserRole::Agent
    }
}

/// User registration payload
///
/// Carries no role; only an admin can assign one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewUser {
    #[schema(example = "jane@realton.io")]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        validate_email(&normalize_email(&self.email))
    }
}

/// Listing moderation status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    #[default]
    Pending,
    Accepted,
}

/// Filter for listing queries
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PropertyFilter {
    /// Only listings with this moderation status
    pub status: Option<PropertyStatus>,
    /// Only listings published by this agent
    pub agent_email: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        self.status.map_or(true, |s| property.status == s)
            && self
                .agent_email
                .as_deref()
                .map_or(true, |email| property.agent_email == email)
    }
}

/// Property listing record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub agent_name: String,
    pub agent_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_image: Option<String>,
    pub price_min: f64,
    pub price_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// Build a pending listing under the given id
    pub fn from_new(id: String, new: NewProperty) -> Self {
        Self {
            id,
            title: new.title,
            location: new.location,
            image: new.image,
            agent_name: new.agent_name,
            agent_email: new.agent_email,
            agent_image: new.agent_image,
            price_min: new.price_min,
            price_max: new.price_max,
            description: new.description,
            status: PropertyStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Overwrite every client-editable field, keeping id, status and creation time.
    ///
    /// Returns whether anything changed.
    pub fn apply(&mut self, new: NewProperty) -> bool {
        let before = self.clone();
        self.title = new.title;
        self.location = new.location;
        self.image = new.image;
        self.agent_name = new.agent_name;
        self.agent_email = new.agent_email;
        self.agent_image = new.agent_image;
        self.price_min = new.price_min;
        self.price_max = new.price_max;
        self.description = new.description;
        *self != before
    }
}

/// Listing payload for create and full replace
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewProperty {
    #[schema(example = "Lakeside cottage")]
    pub title: String,
    #[schema(example = "Austin, TX")]
    pub location: String,
    #[serde(default)]
    pub image: Option<String>,
    pub agent_name: String,
    pub agent_email: String,
    #[serde(default)]
    pub agent_image: Option<String>,
    pub price_min: f64,
    pub price_max: f64,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewProperty {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(RealtonError::ValidationError("title is required".into()));
        }
        if self.location.trim().is_empty() {
            return Err(RealtonError::ValidationError("location is required".into()));
        }
        validate_email(&self.agent_email)?;
        if !(self.price_min >= 0.0 && self.price_min <= self.price_max) {
            return Err(RealtonError::ValidationError(
                "price range must satisfy 0 <= price_min <= price_max".into(),
            ));
        }
        Ok(())
    }
}

/// Review record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Review {
    pub id: String,
    pub property_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_title: Option<String>,
    pub reviewer_name: String,
    pub reviewer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn from_new(new: NewReview) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            property_id: new.property_id,
            property_title: new.property_title,
            reviewer_name: new.reviewer_name,
            reviewer_email: new.reviewer_email,
            reviewer_image: new.reviewer_image,
            agent_name: new.agent_name,
            comment: new.comment,
            rating: new.rating,
            created_at: Utc::now(),
        }
    }
}

/// Review payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewReview {
    pub property_id: String,
    #[serde(default)]
    pub property_title: Option<String>,
    pub reviewer_name: String,
    pub reviewer_email: String,
    #[serde(default)]
    pub reviewer_image: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    pub comment: String,
    #[serde(default)]
    pub rating: Option<u8>,
}

impl NewReview {
    pub fn validate(&self) -> Result<()> {
        crate::parse_record_id(&self.property_id)?;
        validate_email(&self.reviewer_email)?;
        if self.comment.trim().is_empty() {
            return Err(RealtonError::ValidationError("comment is required".into()));
        }
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(RealtonError::ValidationError(
                    "rating must be between 1 and 5".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Canonical form of an email address: trimmed and lowercased.
///
/// Stored users and token identities both go through this, so lookups and
/// the uniqueness check compare like with like.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(RealtonError::ValidationError(format!(
            "invalid email address: {email}"
        ))),
    }
}

// ============================================================================
// Write results
// ============================================================================

/// Result of inserting one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Option<String>,
}

impl InsertResult {
    pub fn inserted(id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: Some(id.into()),
        }
    }
}

/// Result of updating (or upserting) one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

impl UpdateResult {
    /// A document matched the filter; `modified` says whether it changed
    pub fn matched(modified: bool) -> Self {
        Self {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_count: 0,
            upserted_id: None,
        }
    }

    /// Nothing matched the filter
    pub fn unmatched() -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 0,
            upserted_id: None,
        }
    }

    /// Nothing matched, so a new document was inserted
    pub fn upserted(id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(id.into()),
        }
    }
}

/// Result of deleting one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn deleted(count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count: count,
        }
    }
}
