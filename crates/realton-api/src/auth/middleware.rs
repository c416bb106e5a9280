//! Authentication and authorization middleware
//!
//! `require_auth` verifies the bearer token and puts an [`AuthenticatedUser`]
//! into the request extensions. The role gates (`require_admin`,
//! `require_agent`) must be layered after it; they re-read the user's role
//! from the store on every request, so a role change takes effect
//! immediately even for tokens issued before it.
//!
//! ```ignore
//! let delete_user = delete(users::delete_user)
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
//! let admin_routes = Router::new().route("/users/:id", delete_user);
//! ```

use super::jwt::{validate_access_token, Claims, JwtError};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::{ApiError, AppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use realton_core::{RealtonError, UserRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Identity extracted from a verified token
///
/// Handlers behind `require_auth` can take `Extension<AuthenticatedUser>`.
/// The token's claims say nothing about role; use the store for that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// User's email address
    pub email: String,
    /// Issued at timestamp (Unix epoch)
    pub issued_at: u64,
    /// Expiration timestamp (Unix epoch)
    pub expires_at: u64,
}

impl AuthenticatedUser {
    /// Whether the token belongs to the user identified by `email`
    pub fn is_self(&self, email: &str) -> bool {
        self.email == email
    }

    /// Reject access to another user's resources
    pub fn ensure_self(&self, email: &str) -> Result<(), AuthError> {
        if self.is_self(email) {
            Ok(())
        } else {
            audit_log(&AuditEvent::AccessDenied {
                email: Some(self.email.clone()),
                resource: format!("user:{email}"),
                required_role: None,
                ip_address: None,
                user_agent: None,
            });
            Err(AuthError::AccessDenied(email.to_string()))
        }
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            email: claims.identity.email,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Access denied to resource: {0}")]
    AccessDenied(String),

    #[error("Role lookup failed: {0}")]
    Lookup(#[from] RealtonError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions | AuthError::AccessDenied(_) => {
                StatusCode::FORBIDDEN
            }
            AuthError::Lookup(err) => return AppError::from(err).into_response(),
        };

        let body = if status == StatusCode::UNAUTHORIZED {
            ApiError::unauthorized()
        } else {
            ApiError::forbidden()
        };

        (status, Json(body)).into_response()
    }
}

/// Authentication middleware that requires a valid bearer token
///
/// This middleware:
/// 1. Extracts the Authorization header
/// 2. Validates the Bearer token format
/// 3. Validates the JWT signature, issuer and expiration
/// 4. Adds AuthenticatedUser to request extensions
///
/// Any failure short-circuits with 401 before the handler runs.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let ip_address = extract_ip_address(request.headers());
    let user_agent = extract_user_agent(request.headers());

    let token = match bearer_token(&request) {
        Ok(token) => token,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                ip_address,
                user_agent,
                reason: e.to_string(),
            });
            return Err(e);
        }
    };

    let claims = match validate_access_token(&state.jwt, token) {
        Ok(c) => c,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                ip_address,
                user_agent,
                reason: e.to_string(),
            });
            return Err(AuthError::InvalidToken(e));
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(claims));

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request<Body>) -> Result<&str, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    // Auth schemes are case-insensitive
    let (scheme, token) = auth_header
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Role gate admitting admins only
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    enforce_role(&state, &[UserRole::Admin], request, next).await
}

/// Role gate admitting agents (and admins)
pub async fn require_agent(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    enforce_role(&state, &[UserRole::Agent], request, next).await
}

/// Look up the caller's stored role and admit it if it satisfies `required`
///
/// An unknown user is denied like any other role mismatch.
async fn enforce_role(
    state: &AppState,
    required: &[UserRole],
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AuthError::MissingAuthHeader)?
        .clone();

    let role = state
        .store
        .find_user_by_email(&user.email)
        .await?
        .map(|u| u.role)
        .unwrap_or_default();

    if !role.satisfies(required) {
        audit_log(&AuditEvent::AccessDenied {
            email: Some(user.email.clone()),
            resource: format!("{} {}", request.method(), request.uri().path()),
            required_role: Some(
                required
                    .iter()
                    .map(UserRole::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            ip_address: extract_ip_address(request.headers()),
            user_agent: extract_user_agent(request.headers()),
        });

        return Err(AuthError::InsufficientPermissions);
    }

    tracing::debug!(email = %user.email, role = %role, "Role gate passed");
    Ok(next.run(request).await)
}
