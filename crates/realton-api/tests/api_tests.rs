//! API Integration Tests
//!
//! Every test runs the full router over an in-memory store, so no database
//! is required.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use realton_api::{
    auth::jwt::{issue_access_token, Claims, IdentityClaims},
    create_router,
    state::AppState,
};
use realton_core::{
    AppConfig, DeleteResult, InsertResult, NewProperty, NewUser, Property, PropertyFilter,
    RealtonError, Result as CoreResult, Review, UpdateResult, User, UserRole,
};
use realton_store::{
    DocumentStore, MemoryStore, PropertyRepository, ReviewRepository, UserInsert, UserRepository,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const TEST_SECRET: &str = "integration-test-secret";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    state: Arc<AppState>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn DocumentStore> = store.clone();
        let state = Arc::new(AppState::new(test_config(), dyn_store));

        Self {
            router: create_router(state.clone()),
            store,
            state,
        }
    }

    fn token_for(&self, email: &str) -> String {
        issue_access_token(&self.state.jwt, IdentityClaims::new(email)).unwrap()
    }

    /// Register a user directly in the store, optionally with a role
    async fn seed_user(&self, email: &str, role: Option<UserRole>) -> String {
        let user = User::from_new(NewUser {
            email: email.to_string(),
            name: None,
            photo_url: None,
        });
        let id = user.id.clone();
        self.store.insert_user(user).await.unwrap();
        if let Some(role) = role {
            self.store.set_user_role(&id, role).await.unwrap();
        }
        id
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.secret = TEST_SECRET.to_string();
    config
}

/// Helper to create a test request
fn create_json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn listing(title: &str, agent_email: &str) -> Value {
    json!({
        "title": title,
        "location": "Austin, TX",
        "agent_name": "Ann Agent",
        "agent_email": agent_email,
        "price_min": 100000.0,
        "price_max": 150000.0
    })
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, json) = app
        .send(create_json_request("GET", "/health", None, None))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("Realton server is running"));
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = TestApp::new();

    let (status, json) = app
        .send(create_json_request("GET", "/api-docs/openapi.json", None, None))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/users"].is_object());
}

// =============================================================================
// Token Tests
// =============================================================================

#[tokio::test]
async fn test_issued_token_is_accepted() {
    let app = TestApp::new();

    let (status, json) = app
        .send(create_json_request(
            "POST",
            "/jwt",
            None,
            Some(json!({"email": "jane@realton.io", "name": "Jane"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = json["token"].as_str().unwrap().to_string();

    let (status, json) = app
        .send(create_json_request(
            "GET",
            "/users/admin/jane@realton.io",
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"admin": false}));
}

#[tokio::test]
async fn test_token_email_is_normalized() {
    let app = TestApp::new();
    app.seed_user("jane@realton.io", Some(UserRole::Admin)).await;

    let (status, json) = app
        .send(create_json_request(
            "POST",
            "/jwt",
            None,
            Some(json!({"email": "Jane@Realton.IO "})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = json["token"].as_str().unwrap().to_string();

    let (status, json) = app
        .send(create_json_request(
            "GET",
            "/users/admin/jane@realton.io",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"admin": true}));

    let (status, json) = app
        .send(create_json_request(
            "GET",
            "/users/admin/JANE@realton.io",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"admin": true}));
}

#[tokio::test]
async fn test_bearer_scheme_is_case_insensitive() {
    let app = TestApp::new();
    let token = app.token_for("rita@realton.io");

    let request = Request::builder()
        .method("GET")
        .uri("/users/agent/rita@realton.io")
        .header(header::AUTHORIZATION, format!("bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, json) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"agent": false}));
}

#[tokio::test]
async fn test_issue_token_requires_email() {
    let app = TestApp::new();

    let (status, json) = app
        .send(create_json_request(
            "POST",
            "/jwt",
            None,
            Some(json!({"name": "No Email"})),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();
    let id = app.seed_user("target@realton.io", None).await;

    let (status, json) = app
        .send(create_json_request(
            "DELETE",
            &format!("/users/{id}"),
            None,
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "unauthorized access");
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/reviews")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_token_is_unauthorized() {
    let app = TestApp::new();
    app.seed_user("admin@realton.io", Some(UserRole::Admin)).await;

    let token = app.token_for("user@realton.io");
    let forged = app.token_for("admin@realton.io");
    let parts: Vec<&str> = token.split('.').collect();
    let forged_parts: Vec<&str> = forged.split('.').collect();
    let tampered = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

    let (status, _) = app
        .send(create_json_request(
            "GET",
            "/users/admin/admin@realton.io",
            Some(&tampered),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = TestApp::new();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = Claims {
        iss: app.state.jwt.issuer.clone(),
        iat: now - 7200,
        exp: now - 3600,
        identity: IdentityClaims::new("user@realton.io"),
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let (status, _) = app
        .send(create_json_request(
            "GET",
            "/users/admin/user@realton.io",
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// User Tests
// =============================================================================

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new();
    let body = json!({"email": "new@realton.io", "name": "New"});

    let (status, first) = app
        .send(create_json_request("POST", "/users", None, Some(body.clone())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["acknowledged"], true);
    assert!(first["insertedId"].is_string());

    let (status, second) = app
        .send(create_json_request("POST", "/users", None, Some(body)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        second,
        json!({"message": "User email already exist", "insertedId": null})
    );

    let (_, users) = app
        .send(create_json_request("GET", "/users", None, None))
        .await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_duplicate_email_ignores_case_and_padding() {
    let app = TestApp::new();

    let (status, first) = app
        .send(create_json_request(
            "POST",
            "/users",
            None,
            Some(json!({"email": "x@y.com"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["insertedId"].is_string());

    for variant in [" x@y.com", "X@Y.COM", "x@y.com\t"] {
        let (status, json) = app
            .send(create_json_request(
                "POST",
                "/users",
                None,
                Some(json!({"email": variant})),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{variant:?}");
        assert_eq!(
            json,
            json!({"message": "User email already exist", "insertedId": null}),
            "{variant:?}"
        );
    }

    let (_, users) = app
        .send(create_json_request("GET", "/users", None, None))
        .await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "x@y.com");
}

#[tokio::test]
async fn test_register_ignores_role() {
    let app = TestApp::new();

    app.send(create_json_request(
        "POST",
        "/users",
        None,
        Some(json!({"email": "sneaky@realton.io", "role": "admin"})),
    ))
    .await;

    let user = app
        .store
        .find_user_by_email("sneaky@realton.io")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.role, UserRole::Unset);
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = TestApp::new();

    let (status, _) = app
        .send(create_json_request(
            "POST",
            "/users",
            None,
            Some(json!({"email": "not-an-email"})),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_role_check_for_other_email_is_forbidden() {
    let app = TestApp::new();
    app.seed_user("admin@realton.io", Some(UserRole::Admin)).await;
    let token = app.token_for("user@realton.io");

    let (status, json) = app
        .send(create_json_request(
            "GET",
            "/users/agent/admin@realton.io",
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "forbidden access");
}

#[tokio::test]
async fn test_non_admin_cannot_delete_user() {
    let app = TestApp::new();
    app.seed_user("agent@realton.io", Some(UserRole::Agent)).await;
    let id = app.seed_user("target@realton.io", None).await;
    let token = app.token_for("agent@realton.io");

    let (status, _) = app
        .send(create_json_request(
            "DELETE",
            &format!("/users/{id}"),
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.store.find_user_by_id(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_admin_deletes_user() {
    let app = TestApp::new();
    app.seed_user("admin@realton.io", Some(UserRole::Admin)).await;
    let id = app.seed_user("target@realton.io", None).await;
    let token = app.token_for("admin@realton.io");

    let (status, json) = app
        .send(create_json_request(
            "DELETE",
            &format!("/users/{id}"),
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deletedCount"], 1);
    assert!(app.store.find_user_by_id(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_promote_to_admin_is_idempotent() {
    let app = TestApp::new();
    app.seed_user("admin@realton.io", Some(UserRole::Admin)).await;
    let id = app.seed_user("user@realton.io", None).await;
    let admin_token = app.token_for("admin@realton.io");
    let uri = format!("/users/admin/{id}");

    let (status, first) = app
        .send(create_json_request("PATCH", &uri, Some(&admin_token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["matchedCount"], 1);
    assert_eq!(first["modifiedCount"], 1);

    let (status, second) = app
        .send(create_json_request("PATCH", &uri, Some(&admin_token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["matchedCount"], 1);
    assert_eq!(second["modifiedCount"], 0);

    let user_token = app.token_for("user@realton.io");
    let (status, json) = app
        .send(create_json_request(
            "GET",
            "/users/admin/user@realton.io",
            Some(&user_token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"admin": true}));
}

#[tokio::test]
async fn test_promote_unknown_user_matches_nothing() {
    let app = TestApp::new();
    app.seed_user("admin@realton.io", Some(UserRole::Admin)).await;
    let token = app.token_for("admin@realton.io");

    let (status, json) = app
        .send(create_json_request(
            "PATCH",
            &format!("/users/agent/{}", uuid::Uuid::new_v4()),
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["matchedCount"], 0);
}

#[tokio::test]
async fn test_role_change_applies_to_existing_token() {
    let app = TestApp::new();
    let id = app.seed_user("user@realton.io", None).await;
    let token = app.token_for("user@realton.io");

    let (status, _) = app
        .send(create_json_request(
            "POST",
            "/properties",
            Some(&token),
            Some(listing("Cottage", "user@realton.io")),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.store.set_user_role(&id, UserRole::Agent).await.unwrap();

    let (status, _) = app
        .send(create_json_request(
            "POST",
            "/properties",
            Some(&token),
            Some(listing("Cottage", "user@realton.io")),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_user_id_is_bad_request() {
    let app = TestApp::new();
    app.seed_user("admin@realton.io", Some(UserRole::Admin)).await;
    let token = app.token_for("admin@realton.io");

    let (status, _) = app
        .send(create_json_request(
            "DELETE",
            "/users/not-a-uuid",
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Property Tests
// =============================================================================

#[tokio::test]
async fn test_property_lifecycle() {
    let app = TestApp::new();
    app.seed_user("agent@realton.io", Some(UserRole::Agent)).await;
    app.seed_user("admin@realton.io", Some(UserRole::Admin)).await;
    let agent = app.token_for("agent@realton.io");
    let admin = app.token_for("admin@realton.io");

    // Create: starts pending
    let (status, created) = app
        .send(create_json_request(
            "POST",
            "/properties",
            Some(&agent),
            Some(listing("Cottage", "agent@realton.io")),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["insertedId"].as_str().unwrap().to_string();

    let (_, property) = app
        .send(create_json_request("GET", &format!("/properties/{id}"), None, None))
        .await;
    assert_eq!(property["status"], "pending");

    let (_, accepted) = app
        .send(create_json_request("GET", "/properties?status=accepted", None, None))
        .await;
    assert!(accepted.as_array().unwrap().is_empty());

    // Agents cannot approve their own listing
    let (status, _) = app
        .send(create_json_request(
            "PATCH",
            &format!("/properties/{id}"),
            Some(&agent),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin approves
    let (status, json) = app
        .send(create_json_request(
            "PATCH",
            &format!("/properties/{id}"),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["modifiedCount"], 1);

    let (_, accepted) = app
        .send(create_json_request("GET", "/properties?status=accepted", None, None))
        .await;
    assert_eq!(accepted.as_array().unwrap().len(), 1);

    // Replace keeps the moderation status
    let (status, json) = app
        .send(create_json_request(
            "PUT",
            &format!("/properties/{id}"),
            Some(&agent),
            Some(listing("Renovated cottage", "agent@realton.io")),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["modifiedCount"], 1);

    let (_, property) = app
        .send(create_json_request("GET", &format!("/properties/{id}"), None, None))
        .await;
    assert_eq!(property["title"], "Renovated cottage");
    assert_eq!(property["status"], "accepted");

    // Delete
    let (status, json) = app
        .send(create_json_request(
            "DELETE",
            &format!("/properties/{id}"),
            Some(&agent),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deletedCount"], 1);

    let (status, _) = app
        .send(create_json_request("GET", &format!("/properties/{id}"), None, None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upsert_creates_missing_property() {
    let app = TestApp::new();
    app.seed_user("agent@realton.io", Some(UserRole::Agent)).await;
    let agent = app.token_for("agent@realton.io");
    let id = uuid::Uuid::new_v4().to_string();

    let (status, json) = app
        .send(create_json_request(
            "PUT",
            &format!("/properties/{id}"),
            Some(&agent),
            Some(listing("Loft", "agent@realton.io")),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["upsertedCount"], 1);
    assert_eq!(json["upsertedId"], id.as_str());

    let (_, property) = app
        .send(create_json_request("GET", &format!("/properties/{id}"), None, None))
        .await;
    assert_eq!(property["status"], "pending");
}

#[tokio::test]
async fn test_admin_passes_agent_gate() {
    let app = TestApp::new();
    app.seed_user("admin@realton.io", Some(UserRole::Admin)).await;
    let admin = app.token_for("admin@realton.io");

    let (status, _) = app
        .send(create_json_request(
            "POST",
            "/properties",
            Some(&admin),
            Some(listing("Villa", "admin@realton.io")),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_filter_properties_by_agent() {
    let app = TestApp::new();
    app.seed_user("a@realton.io", Some(UserRole::Agent)).await;
    app.seed_user("b@realton.io", Some(UserRole::Agent)).await;

    for (email, title) in [("a@realton.io", "One"), ("b@realton.io", "Two")] {
        let token = app.token_for(email);
        app.send(create_json_request(
            "POST",
            "/properties",
            Some(&token),
            Some(listing(title, email)),
        ))
        .await;
    }

    let (status, json) = app
        .send(create_json_request(
            "GET",
            "/properties?agent_email=b@realton.io",
            None,
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let listings = json.as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["title"], "Two");
}

#[tokio::test]
async fn test_invalid_property_is_bad_request() {
    let app = TestApp::new();
    app.seed_user("agent@realton.io", Some(UserRole::Agent)).await;
    let agent = app.token_for("agent@realton.io");

    let mut body = listing("Cottage", "agent@realton.io");
    body["price_min"] = json!(500000.0);

    let (status, json) = app
        .send(create_json_request("POST", "/properties", Some(&agent), Some(body)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(app.store.list_properties(&PropertyFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_status_filter_is_bad_request() {
    let app = TestApp::new();

    let (status, _) = app
        .send(create_json_request("GET", "/properties?status=sold", None, None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_property_id_is_bad_request() {
    let app = TestApp::new();

    let (status, _) = app
        .send(create_json_request("GET", "/properties/not-a-uuid", None, None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_method_is_not_allowed_without_token() {
    let app = TestApp::new();
    let id = uuid::Uuid::new_v4();

    let cases = [
        ("POST", format!("/properties/{id}")),
        ("PUT", "/reviews".to_string()),
        ("POST", format!("/users/{id}")),
        ("DELETE", "/users/admin/jane@realton.io".to_string()),
    ];

    for (method, uri) in cases {
        let (status, _) = app
            .send(create_json_request(method, &uri, None, None))
            .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
    }

    // Served methods on the same paths stay gated
    let (status, _) = app
        .send(create_json_request(
            "PATCH",
            &format!("/properties/{id}"),
            None,
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Review Tests
// =============================================================================

#[tokio::test]
async fn test_reviews_require_token_to_post() {
    let app = TestApp::new();
    let property_id = uuid::Uuid::new_v4().to_string();
    let review = json!({
        "property_id": property_id,
        "reviewer_name": "Rita",
        "reviewer_email": "rita@realton.io",
        "comment": "Lovely place",
        "rating": 5
    });

    let (status, _) = app
        .send(create_json_request("POST", "/reviews", None, Some(review.clone())))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.token_for("rita@realton.io");
    let (status, json) = app
        .send(create_json_request("POST", "/reviews", Some(&token), Some(review)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["insertedId"].is_string());

    let (_, for_property) = app
        .send(create_json_request(
            "GET",
            &format!("/reviews?property_id={property_id}"),
            None,
            None,
        ))
        .await;
    assert_eq!(for_property.as_array().unwrap().len(), 1);

    let (_, for_other) = app
        .send(create_json_request(
            "GET",
            &format!("/reviews?property_id={}", uuid::Uuid::new_v4()),
            None,
            None,
        ))
        .await;
    assert!(for_other.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_review_rating_out_of_range() {
    let app = TestApp::new();
    let token = app.token_for("rita@realton.io");

    let (status, _) = app
        .send(create_json_request(
            "POST",
            "/reviews",
            Some(&token),
            Some(json!({
                "property_id": uuid::Uuid::new_v4().to_string(),
                "reviewer_name": "Rita",
                "reviewer_email": "rita@realton.io",
                "comment": "Too good",
                "rating": 9
            })),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Store Failure Tests
// =============================================================================

/// Store whose every operation fails
struct FailingStore;

fn unavailable<T>() -> CoreResult<T> {
    Err(RealtonError::StoreError(
        "connection refused by 10.0.0.7:8000".to_string(),
    ))
}

#[async_trait]
impl UserRepository for FailingStore {
    async fn list_users(&self) -> CoreResult<Vec<User>> {
        unavailable()
    }
    async fn find_user_by_email(&self, _email: &str) -> CoreResult<Option<User>> {
        unavailable()
    }
    async fn find_user_by_id(&self, _id: &str) -> CoreResult<Option<User>> {
        unavailable()
    }
    async fn insert_user(&self, _user: User) -> CoreResult<UserInsert> {
        unavailable()
    }
    async fn set_user_role(&self, _id: &str, _role: UserRole) -> CoreResult<UpdateResult> {
        unavailable()
    }
    async fn delete_user(&self, _id: &str) -> CoreResult<DeleteResult> {
        unavailable()
    }
}

#[async_trait]
impl PropertyRepository for FailingStore {
    async fn list_properties(&self, _filter: &PropertyFilter) -> CoreResult<Vec<Property>> {
        unavailable()
    }
    async fn find_property(&self, _id: &str) -> CoreResult<Option<Property>> {
        unavailable()
    }
    async fn insert_property(&self, _property: Property) -> CoreResult<InsertResult> {
        unavailable()
    }
    async fn accept_property(&self, _id: &str) -> CoreResult<UpdateResult> {
        unavailable()
    }
    async fn upsert_property(&self, _id: &str, _new: NewProperty) -> CoreResult<UpdateResult> {
        unavailable()
    }
    async fn delete_property(&self, _id: &str) -> CoreResult<DeleteResult> {
        unavailable()
    }
}

#[async_trait]
impl ReviewRepository for FailingStore {
    async fn list_reviews(&self, _property_id: Option<&str>) -> CoreResult<Vec<Review>> {
        unavailable()
    }
    async fn insert_review(&self, _review: Review) -> CoreResult<InsertResult> {
        unavailable()
    }
}

#[tokio::test]
async fn test_store_failure_is_opaque_500() {
    let state = Arc::new(AppState::new(test_config(), Arc::new(FailingStore)));
    let router = create_router(state.clone());

    let response = router
        .clone()
        .oneshot(create_json_request("GET", "/users", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "Internal server error");
    assert!(!json.to_string().contains("10.0.0.7"));

    // The role gate fails closed when the lookup errors
    let token = issue_access_token(&state.jwt, IdentityClaims::new("admin@realton.io")).unwrap();
    let response = router
        .oneshot(create_json_request(
            "DELETE",
            &format!("/users/{}", uuid::Uuid::new_v4()),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
