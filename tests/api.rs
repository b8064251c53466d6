//! Router-level tests over in-memory stores. No database required.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use storefront::config::AppConfig;
use storefront::{build_app, AppState};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(AppConfig::for_tests("api-test-secret"))
    }

    fn with_config(config: AppConfig) -> Self {
        let state = AppState::in_memory(config);
        let router = build_app(state.clone()).expect("build app");
        Self { router, state }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }

    async fn register(&self, who: &str, email: &str, password: &str) -> Value {
        let (status, _, body) = self
            .send(
                Method::POST,
                &format!("/api/{who}/register"),
                None,
                Some(json!({ "name": "Test Person", "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {who}: {body}");
        body
    }

    async fn user_token(&self) -> String {
        let body = self.register("users", "user@example.com", "password123").await;
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        let body = self.register("admins", "admin@example.com", "admin123").await;
        body["token"].as_str().unwrap().to_string()
    }
}

fn lamp() -> Value {
    json!({
        "name": "Desk Lamp",
        "price": 39.5,
        "description": "Adjustable LED lamp",
        "category": "Home",
        "imageURL": "https://img.example/lamp.png"
    })
}

// ============================================================================
// Service
// ============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();
    let (status, _, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK", "message": "Backend is running" }));
}

#[tokio::test]
async fn index_lists_endpoint_prefixes() {
    let app = TestApp::new();
    let (status, _, body) = app.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["products"], "/api/products");
}

// ============================================================================
// Registration and login
// ============================================================================

#[tokio::test]
async fn registration_succeeds_once_per_kind() {
    let app = TestApp::new();
    let body = app.register("users", "john@example.com", "password123").await;
    assert_eq!(body["email"], "john@example.com");
    assert!(body.get("password").is_none());

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "name": "Again", "email": "john@example.com", "password": "other" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    // the admin collection is independent
    app.register("admins", "john@example.com", "password123").await;
}

#[tokio::test]
async fn login_token_verifies_back_to_the_registered_id() {
    let app = TestApp::new();
    let reg = app.register("users", "jane@example.com", "password123").await;

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "email": "jane@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], reg["id"]);

    let claims = app.state.keys.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.id.to_string(), reg["id"].as_str().unwrap());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let app = TestApp::new();
    app.register("users", "jane@example.com", "password123").await;

    let (s1, _, wrong) = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "email": "jane@example.com", "password": "nope" })),
        )
        .await;
    let (s2, _, unknown) = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn admin_login_never_checks_users() {
    let app = TestApp::new();
    app.register("users", "user@example.com", "password123").await;
    let (status, _, _) = app
        .send(
            Method::POST,
            "/api/admins/login",
            None,
            Some(json!({ "email": "user@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_keeps_message_shape() {
    let app = TestApp::new();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].is_string());
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn profile_without_header_is_unauthenticated() {
    let app = TestApp::new();
    let (status, _, body) = app.send(Method::GET, "/api/users/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token provided");
}

#[tokio::test]
async fn profile_with_admin_token_is_unauthenticated() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let (status, _, body) = app
        .send(Method::GET, "/api/users/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, user not found");
}

#[tokio::test]
async fn expired_and_tampered_tokens_are_rejected() {
    let app = TestApp::new();
    let reg = app.register("users", "old@example.com", "password123").await;
    let id: Uuid = reg["id"].as_str().unwrap().parse().unwrap();

    let long_ago = OffsetDateTime::now_utc().unix_timestamp() - 31 * 24 * 60 * 60;
    let expired = app.state.keys.sign_at(id, long_ago).unwrap();
    let (status, _, body) = app
        .send(Method::GET, "/api/users/profile", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, invalid or expired token");

    let token = reg["token"].as_str().unwrap();
    let at = token.len() - 8;
    let flipped = if &token[at..at + 1] == "A" { "B" } else { "A" };
    let tampered = format!("{}{}{}", &token[..at], flipped, &token[at + 1..]);
    let (status, _, _) = app
        .send(Method::GET, "/api/users/profile", Some(&tampered), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_read_and_update() {
    let app = TestApp::new();
    let token = app.user_token().await;

    let (status, _, body) = app
        .send(Method::GET, "/api/users/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "user@example.com");
    assert_eq!(body["isAdmin"], false);
    assert!(body["createdAt"].is_string());

    let (status, _, body) = app
        .send(
            Method::PUT,
            "/api/users/profile",
            Some(&token),
            Some(json!({ "name": "Renamed", "email": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["email"], "user@example.com");
    assert!(app.state.keys.verify(body["token"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let app = TestApp::new();
    let (status, headers, body) = app.send(Method::POST, "/api/users/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("jwt=;"));
    assert!(cookie.contains("Max-Age=0"));
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn user_token_is_forbidden_on_mutations_but_reads_work() {
    let app = TestApp::new();
    let token = app.user_token().await;

    let (status, _, body) = app
        .send(Method::POST, "/api/products", Some(&token), Some(lamp()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied. Not an admin account.");

    let (status, _, body) = app
        .send(Method::GET, "/api/products", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn mutations_without_token_are_unauthenticated() {
    let app = TestApp::new();
    let (status, _, _) = app
        .send(Method::POST, "/api/products", None, Some(lamp()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_manages_the_catalog() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, _, created) = app
        .send(Method::POST, "/api/products", Some(&token), Some(lamp()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["stock"], 0);
    assert_eq!(created["imageURL"], "https://img.example/lamp.png");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _, updated) = app
        .send(
            Method::PUT,
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "price": 35.0, "name": "", "stock": 12 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 35.0);
    assert_eq!(updated["name"], "Desk Lamp");
    assert_eq!(updated["stock"], 12);

    let (_, _, zeroed) = app
        .send(
            Method::PUT,
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "stock": 0 })),
        )
        .await;
    assert_eq!(zeroed["stock"], 0);

    let (status, _, fetched) = app
        .send(Method::GET, &format!("/api/products/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["price"], 35.0);
}

#[tokio::test]
async fn zero_price_keeps_stored_price_but_zero_stock_applies() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let mut body = lamp();
    body["stock"] = json!(7);
    let (_, _, created) = app
        .send(Method::POST, "/api/products", Some(&token), Some(body))
        .await;
    let uri = format!("/api/products/{}", created["id"].as_str().unwrap());

    let (status, _, updated) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "price": 0 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 39.5);
    assert_eq!(updated["stock"], 7);

    let (_, _, updated) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "stock": 0 })))
        .await;
    assert_eq!(updated["price"], 39.5);
    assert_eq!(updated["stock"], 0);
}

#[tokio::test]
async fn deleting_twice_is_success_then_not_found() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let (_, _, created) = app
        .send(Method::POST, "/api/products", Some(&token), Some(lamp()))
        .await;
    let uri = format!("/api/products/{}", created["id"].as_str().unwrap());

    let (status, _, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product removed successfully");

    let (status, _, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn unknown_and_malformed_product_ids_are_not_found() {
    let app = TestApp::new();
    let (status, _, _) = app
        .send(Method::GET, &format!("/api/products/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = app
        .send(Method::GET, "/api/products/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

// ============================================================================
// Seeding
// ============================================================================

#[tokio::test]
async fn seed_endpoint_is_off_by_default() {
    let app = TestApp::new();
    let (status, _, _) = app.send(Method::POST, "/api/seed", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seed_endpoint_creates_working_demo_accounts() {
    let mut config = AppConfig::for_tests("api-test-secret");
    config.seed_endpoint = true;
    let app = TestApp::with_config(config);

    let (status, _, body) = app.send(Method::POST, "/api/seed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let admin = &body["credentials"]["admin"];

    let (status, _, login) = app
        .send(
            Method::POST,
            "/api/admins/login",
            None,
            Some(json!({ "email": admin["email"], "password": admin["password"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, products) = app.send(Method::GET, "/api/products", None, None).await;
    assert_eq!(products.as_array().unwrap().len(), 8);

    let (status, _, _) = app
        .send(
            Method::DELETE,
            &format!("/api/products/{}", products[0]["id"].as_str().unwrap()),
            Some(login["token"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
