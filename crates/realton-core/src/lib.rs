//! Realton Core - Domain models, errors and configuration
//!
//! This crate defines the types shared by the store and API crates:
//! - Listing domain models (users, properties, reviews)
//! - Document write results returned to clients
//! - Common error types
//! - Configuration management

pub mod config;
pub mod models;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};
pub use models::{
    normalize_email, DeleteResult, InsertResult, NewProperty, NewReview, NewUser, Property,
    PropertyFilter, PropertyStatus, Review, UpdateResult, User, UserRole,
};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Realton operations
#[derive(Error, Debug)]
pub enum RealtonError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid record id: {0}")]
    InvalidId(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, RealtonError>;

impl From<ConfigError> for RealtonError {
    fn from(err: ConfigError) -> Self {
        RealtonError::ConfigError(err.to_string())
    }
}

/// Validate a record id supplied by a client.
///
/// Ids are generated as UUID v4 strings; anything else cannot name a record.
pub fn parse_record_id(id: &str) -> Result<uuid::Uuid> {
    uuid::Uuid::parse_str(id).map_err(|_| RealtonError::InvalidId(id.to_string()))
}
