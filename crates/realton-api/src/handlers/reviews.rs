//! Review handlers

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use realton_core::{InsertResult, NewReview, Review};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

/// Review list filter
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewQuery {
    /// Only reviews of this listing
    pub property_id: Option<String>,
}

/// List reviews, optionally for one listing
#[utoipa::path(
    get,
    path = "/reviews",
    tag = "reviews",
    params(ReviewQuery),
    responses(
        (status = 200, description = "Matching reviews", body = Vec<Review>)
    )
)]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ReviewQuery>, QueryRejection>,
) -> Result<Json<Vec<Review>>, AppError> {
    let Query(query) = query?;
    let reviews = state
        .store
        .list_reviews(query.property_id.as_deref())
        .await?;
    Ok(Json(reviews))
}

/// Post a review
#[utoipa::path(
    post,
    path = "/reviews",
    tag = "reviews",
    request_body = NewReview,
    responses(
        (status = 200, description = "Review inserted", body = InsertResult),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewReview>, JsonRejection>,
) -> Result<Json<InsertResult>, AppError> {
    let Json(new_review) = payload?;
    new_review.validate()?;

    let result = state.store.insert_review(Review::from_new(new_review)).await?;
    Ok(Json(result))
}
