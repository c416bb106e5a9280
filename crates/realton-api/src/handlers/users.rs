//! User directory handlers

use crate::audit::{audit_log, extract_ip_address, AuditEvent};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Extension, Json,
};
use realton_core::{
    normalize_email, parse_record_id, DeleteResult, NewUser, UpdateResult, User, UserRole,
};
use realton_store::UserInsert;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Body returned when registering an email that is already on file
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExistingUserResponse {
    pub message: String,
    pub inserted_id: Option<String>,
}

impl ExistingUserResponse {
    fn new() -> Self {
        Self {
            message: "User email already exist".to_string(),
            inserted_id: None,
        }
    }
}

/// Admin check result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminStatus {
    pub admin: bool,
}

/// Agent check result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentStatus {
    pub agent: bool,
}

/// List every registered user
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(users))
}

/// Register a user if the email is not yet known
///
/// A repeated email is not an error: the response says so and carries no id.
/// Any `role` in the payload is ignored.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = NewUser,
    responses(
        (status = 200, description = "User inserted; an ExistingUserResponse if the email is taken", body = realton_core::InsertResult),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(new_user) = payload?;
    new_user.validate()?;

    let user = User::from_new(new_user);
    let (user_id, email) = (user.id.clone(), user.email.clone());

    match state.store.insert_user(user).await? {
        UserInsert::Inserted(result) => {
            audit_log(&AuditEvent::UserRegistered {
                user_id,
                email,
                ip_address: extract_ip_address(&headers),
            });
            Ok(Json(result).into_response())
        }
        UserInsert::EmailExists => {
            tracing::debug!(email = %email, "Registration skipped, email exists");
            Ok(Json(ExistingUserResponse::new()).into_response())
        }
    }
}

/// Whether the caller is an admin
///
/// Callers may only ask about their own email.
#[utoipa::path(
    get,
    path = "/users/admin/{email}",
    tag = "users",
    params(("email" = String, Path, description = "Email of the caller")),
    responses(
        (status = 200, description = "Admin status", body = AdminStatus),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Email does not match the token", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_admin(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, AppError> {
    let user = lookup_self(&state, &caller, &email).await?;
    Ok(Json(AdminStatus {
        admin: user.as_ref().is_some_and(User::is_admin),
    }))
}

/// Whether the caller is an agent
#[utoipa::path(
    get,
    path = "/users/agent/{email}",
    tag = "users",
    params(("email" = String, Path, description = "Email of the caller")),
    responses(
        (status = 200, description = "Agent status", body = AgentStatus),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Email does not match the token", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_agent(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(email): Path<String>,
) -> Result<Json<AgentStatus>, AppError> {
    let user = lookup_self(&state, &caller, &email).await?;
    Ok(Json(AgentStatus {
        agent: user.as_ref().is_some_and(User::is_agent),
    }))
}

async fn lookup_self(
    state: &AppState,
    caller: &AuthenticatedUser,
    email: &str,
) -> Result<Option<User>, AppError> {
    let email = normalize_email(email);
    caller.ensure_self(&email).map_err(|_| AppError::Forbidden)?;
    Ok(state.store.find_user_by_email(&email).await?)
}

/// Promote a user to admin
#[utoipa::path(
    patch,
    path = "/users/admin/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Update result", body = UpdateResult),
        (status = 400, description = "Malformed id", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an admin", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn make_admin(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, AppError> {
    assign_role(&state, &caller, &id, UserRole::Admin).await
}

/// Promote a user to agent
#[utoipa::path(
    patch,
    path = "/users/agent/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Update result", body = UpdateResult),
        (status = 400, description = "Malformed id", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an admin", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn make_agent(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, AppError> {
    assign_role(&state, &caller, &id, UserRole::Agent).await
}

async fn assign_role(
    state: &AppState,
    caller: &AuthenticatedUser,
    id: &str,
    role: UserRole,
) -> Result<Json<UpdateResult>, AppError> {
    parse_record_id(id)?;

    let result = state.store.set_user_role(id, role).await?;

    audit_log(&AuditEvent::RoleChanged {
        user_id: id.to_string(),
        role: role.to_string(),
        changed_by: caller.email.clone(),
        modified: result.modified_count > 0,
    });

    Ok(Json(result))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Delete result", body = DeleteResult),
        (status = 400, description = "Malformed id", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an admin", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, AppError> {
    parse_record_id(&id)?;

    let result = state.store.delete_user(&id).await?;

    audit_log(&AuditEvent::UserDeleted {
        user_id: id,
        deleted_by: caller.email,
        deleted: result.deleted_count > 0,
    });

    Ok(Json(result))
}
