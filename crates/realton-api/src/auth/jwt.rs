//! JWT token issuance and validation
//!
//! Implements bearer credentials with HMAC-SHA256 signing. A token carries
//! the caller-supplied identity claims (at least `email`) plus issuer,
//! issued-at and expiry.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use realton_core::AuthConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use utoipa::ToSchema;

/// Registered claim names owned by the issuer; callers cannot set them.
const RESERVED_CLAIMS: &[&str] = &["iss", "iat", "exp", "nbf", "aud", "email"];

/// Identity payload submitted for a token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct IdentityClaims {
    /// User's email address
    #[schema(example = "jane@realton.io")]
    pub email: String,
    /// Any further claims, embedded as given
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl IdentityClaims {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            extra: Map::new(),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// Identity embedded by the issuer
    #[serde(flatten)]
    pub identity: IdentityClaims,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Signing secret is not configured")]
    MissingSecret,

    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token lifetime of {0} seconds is out of range")]
    ExpirationOutOfRange(u64),

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Access token expiration time in seconds (default: 3600 = 1 hour)
    pub access_expiration_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_expiration_secs: config.access_expiration_secs,
            issuer: config.issuer.clone(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_expiration_secs", &self.access_expiration_secs)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtConfig {
    fn secret(&self) -> Result<&[u8], JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }
        Ok(self.secret.as_bytes())
    }
}

/// Issue a signed access token for an identity
///
/// Reserved claims in `identity.extra` are discarded; the expiry is always
/// `now + access_expiration_secs`.
///
/// # Example
///
/// ```no_run
/// use realton_api::auth::jwt::{issue_access_token, IdentityClaims, JwtConfig};
///
/// let config = JwtConfig {
///     secret: "change-me".to_string(),
///     access_expiration_secs: 3600,
///     issuer: "realton-api".to_string(),
/// };
/// let token = issue_access_token(&config, IdentityClaims::new("jane@realton.io"))
///     .expect("Failed to issue token");
/// ```
pub fn issue_access_token(
    config: &JwtConfig,
    mut identity: IdentityClaims,
) -> Result<String, JwtError> {
    let secret = config.secret()?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    identity
        .extra
        .retain(|key, _| !RESERVED_CLAIMS.contains(&key.as_str()));

    let exp = now
        .checked_add(config.access_expiration_secs)
        .ok_or(JwtError::ExpirationOutOfRange(config.access_expiration_secs))?;

    let claims = Claims {
        iss: config.issuer.clone(),
        iat: now,
        exp,
        identity,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?;

    Ok(token)
}

/// Validate an access token and extract its claims
///
/// Fails on bad signature, expiry, wrong issuer or malformed input.
pub fn validate_access_token(config: &JwtConfig, token: &str) -> Result<Claims, JwtError> {
    let secret = config.secret()?;
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::InvalidToken,
        })?;

    Ok(token_data.claims)
}
