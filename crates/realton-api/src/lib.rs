//! Realton API - REST server
//!
//! Provides HTTP endpoints for users, property listings and reviews, with
//! bearer-token authentication and role-gated mutations.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::{http::HeaderValue, routing::get, Json, Router};
use handlers::{health, properties, reviews, token, users};
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI document for the whole server
#[derive(OpenApi)]
#[openapi(
    info(title = "Realton API", description = "Property listing backend"),
    paths(
        health::root,
        health::health_check,
        token::issue_token,
        users::list_users,
        users::register_user,
        users::check_admin,
        users::check_agent,
        users::make_admin,
        users::make_agent,
        users::delete_user,
        properties::list_properties,
        properties::get_property,
        properties::create_property,
        properties::accept_property,
        properties::upsert_property,
        properties::delete_property,
        reviews::list_reviews,
        reviews::create_review,
    ),
    components(schemas(
        error::ApiError,
        health::HealthResponse,
        token::TokenResponse,
        auth::IdentityClaims,
        users::ExistingUserResponse,
        users::AdminStatus,
        users::AgentStatus,
        realton_core::User,
        realton_core::UserRole,
        realton_core::NewUser,
        realton_core::Property,
        realton_core::PropertyStatus,
        realton_core::NewProperty,
        realton_core::Review,
        realton_core::NewReview,
        realton_core::InsertResult,
        realton_core::UpdateResult,
        realton_core::DeleteResult,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Token issuance"),
        (name = "users", description = "User directory and roles"),
        (name = "properties", description = "Property listings"),
        (name = "reviews", description = "Listing reviews")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the application router with CORS and request tracing
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    routes::api_routes(state.clone())
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// CORS policy from the configured origins; empty or `*` allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(allowed)
}
