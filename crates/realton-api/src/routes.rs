//! API route definitions
//!
//! Routes are grouped by the guard they need. Groups that share a path
//! (e.g. `/properties/:id`) are merged per method, so a path may be public
//! for GET and gated for PATCH. Shared paths must use the same parameter
//! name in every group.
//!
//! Guards wrap the method handlers, never the router. A method a path does
//! not serve answers 405 before any token is looked at.

use crate::auth::{require_admin, require_agent, require_auth};
use crate::handlers::{health, properties, reviews, token, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, patch, post, put, MethodRouter},
    Router,
};
use std::sync::Arc;

type Route = MethodRouter<Arc<AppState>>;

/// Create all API routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/jwt", post(token::issue_token))
        .route("/users", get(users::list_users))
        .route("/users", post(users::register_user))
        .route("/properties", get(properties::list_properties))
        .route("/properties/:id", get(properties::get_property))
        .route("/reviews", get(reviews::list_reviews));

    // Any verified identity
    let verified_routes = Router::new()
        .route("/users/admin/:user", verified(&state, get(users::check_admin)))
        .route("/users/agent/:user", verified(&state, get(users::check_agent)))
        .route("/reviews", verified(&state, post(reviews::create_review)));

    // Verified admins
    let admin_routes = Router::new()
        .route("/users/admin/:user", admins(&state, patch(users::make_admin)))
        .route("/users/agent/:user", admins(&state, patch(users::make_agent)))
        .route("/users/:id", admins(&state, delete(users::delete_user)))
        .route(
            "/properties/:id",
            admins(&state, patch(properties::accept_property)),
        );

    // Verified agents (admins pass as well)
    let agent_routes = Router::new()
        .route(
            "/properties",
            agents(&state, post(properties::create_property)),
        )
        .route(
            "/properties/:id",
            agents(&state, put(properties::upsert_property)),
        )
        .route(
            "/properties/:id",
            agents(&state, delete(properties::delete_property)),
        );

    Router::new()
        .merge(public_routes)
        .merge(verified_routes)
        .merge(admin_routes)
        .merge(agent_routes)
}

fn verified(state: &Arc<AppState>, route: Route) -> Route {
    route.route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

// The role gate is added first so authentication runs before it
fn admins(state: &Arc<AppState>, route: Route) -> Route {
    verified(
        state,
        route.route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
    )
}

fn agents(state: &Arc<AppState>, route: Route) -> Route {
    verified(
        state,
        route.route_layer(middleware::from_fn_with_state(state.clone(), require_agent)),
    )
}
