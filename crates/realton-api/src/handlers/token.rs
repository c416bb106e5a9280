//! Token issuance handler

use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::jwt::{issue_access_token, IdentityClaims};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use realton_core::normalize_email;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Issued access token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Issue an access token for the submitted identity
///
/// The identity is not checked against the user store; the client has
/// already authenticated it with its identity provider. The email is
/// normalized the same way as registered users; any other claims are
/// embedded unchanged.
#[utoipa::path(
    post,
    path = "/jwt",
    tag = "auth",
    request_body = IdentityClaims,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed identity", body = crate::error::ApiError)
    )
)]
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<IdentityClaims>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(mut identity) = payload?;
    identity.email = normalize_email(&identity.email);
    if identity.email.is_empty() {
        return Err(AppError::BadRequest("email is required".to_string()));
    }

    let email = identity.email.clone();
    let token = issue_access_token(&state.jwt, identity)
        .map_err(|e| AppError::Internal(format!("Failed to issue token: {e}")))?;

    audit_log(&AuditEvent::TokenIssued {
        email,
        ip_address: extract_ip_address(&headers),
        user_agent: extract_user_agent(&headers),
    });

    Ok(Json(TokenResponse { token }))
}
