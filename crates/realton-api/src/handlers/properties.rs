//! Property listing handlers

use crate::audit::{audit_log, AuditEvent};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use realton_core::{
    parse_record_id, DeleteResult, InsertResult, NewProperty, Property, PropertyFilter,
    UpdateResult,
};
use std::sync::Arc;
use uuid::Uuid;

/// List listings, optionally filtered by status or agent
#[utoipa::path(
    get,
    path = "/properties",
    tag = "properties",
    params(PropertyFilter),
    responses(
        (status = 200, description = "Matching listings", body = Vec<Property>),
        (status = 400, description = "Unknown status value", body = crate::error::ApiError)
    )
)]
pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    filter: Result<Query<PropertyFilter>, QueryRejection>,
) -> Result<Json<Vec<Property>>, AppError> {
    let Query(filter) = filter?;
    let properties = state.store.list_properties(&filter).await?;
    Ok(Json(properties))
}

/// Get one listing
#[utoipa::path(
    get,
    path = "/properties/{id}",
    tag = "properties",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing found", body = Property),
        (status = 400, description = "Malformed id", body = crate::error::ApiError),
        (status = 404, description = "Listing not found", body = crate::error::ApiError)
    )
)]
pub async fn get_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Property>, AppError> {
    parse_record_id(&id)?;

    state
        .store
        .find_property(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Property {id}")))
}

/// Publish a new listing; it starts out pending
#[utoipa::path(
    post,
    path = "/properties",
    tag = "properties",
    request_body = NewProperty,
    responses(
        (status = 200, description = "Listing inserted", body = InsertResult),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an agent", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_property(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewProperty>, JsonRejection>,
) -> Result<Json<InsertResult>, AppError> {
    let Json(new_property) = payload?;
    new_property.validate()?;

    let property = Property::from_new(Uuid::new_v4().to_string(), new_property);
    let result = state.store.insert_property(property).await?;

    tracing::info!(id = ?result.inserted_id, "Property created");
    Ok(Json(result))
}

/// Approve a pending listing
#[utoipa::path(
    patch,
    path = "/properties/{id}",
    tag = "properties",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Update result", body = UpdateResult),
        (status = 400, description = "Malformed id", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an admin", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn accept_property(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, AppError> {
    parse_record_id(&id)?;

    let result = state.store.accept_property(&id).await?;

    if result.matched_count > 0 {
        audit_log(&AuditEvent::PropertyAccepted {
            property_id: id,
            accepted_by: caller.email,
        });
    }

    Ok(Json(result))
}

/// Replace a listing's editable fields, creating it if absent
///
/// Moderation status is kept on update; a created listing starts pending.
#[utoipa::path(
    put,
    path = "/properties/{id}",
    tag = "properties",
    params(("id" = String, Path, description = "Listing id")),
    request_body = NewProperty,
    responses(
        (status = 200, description = "Update result", body = UpdateResult),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an agent", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upsert_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<NewProperty>, JsonRejection>,
) -> Result<Json<UpdateResult>, AppError> {
    parse_record_id(&id)?;
    let Json(new_property) = payload?;
    new_property.validate()?;

    let result = state.store.upsert_property(&id, new_property).await?;
    Ok(Json(result))
}

/// Remove a listing
#[utoipa::path(
    delete,
    path = "/properties/{id}",
    tag = "properties",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Delete result", body = DeleteResult),
        (status = 400, description = "Malformed id", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an agent", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, AppError> {
    parse_record_id(&id)?;

    let result = state.store.delete_property(&id).await?;
    Ok(Json(result))
}
