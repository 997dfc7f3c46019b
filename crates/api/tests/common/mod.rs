//! Shared harness for HTTP-level integration tests.
//!
//! Builds the full application router with the same middleware stack as
//! `main.rs`, but backed by the in-memory datastore so tests stay
//! hermetic and fast.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use bugspot_api::auth::jwt::JwtConfig;
use bugspot_api::config::ServerConfig;
use bugspot_api::router::build_app_router;
use bugspot_api::state::AppState;
use bugspot_db::store::{Datastore, MemoryDatastore};

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        body_limit_bytes: 10 * 1024 * 1024,
        ai_analysis_enabled: false,
        app_url: "http://localhost:5173".to_string(),
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            token_expiry_days: 7,
        },
    }
}

/// Build the application router over a fresh in-memory datastore.
///
/// Returns the datastore too, for tests that need to seed or inspect state
/// directly.
pub fn build_test_app() -> (Router, Arc<dyn Datastore>) {
    let store: Arc<dyn Datastore> = Arc::new(MemoryDatastore::new());
    let config = test_config();
    let state = AppState {
        store: Arc::clone(&store),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), store)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn request(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    api_key: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    };
    app.oneshot(request).await.expect("request succeeds")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    request(app, Method::GET, uri, None, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    request(app, Method::GET, uri, Some(token), None, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    request(app, Method::POST, uri, None, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    request(app, Method::POST, uri, Some(token), None, Some(body)).await
}

pub async fn post_json_api_key(
    app: Router,
    uri: &str,
    api_key: &str,
    body: serde_json::Value,
) -> Response<Body> {
    request(app, Method::POST, uri, None, Some(api_key), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    request(app, Method::PUT, uri, Some(token), None, Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    request(app, Method::DELETE, uri, Some(token), None, None).await
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

/// Register a user via the API and return the response JSON
/// (`token` + `user`).
pub async fn register_user(app: Router, email: &str) -> serde_json::Value {
    let body = serde_json::json!({ "email": email, "password": "test_password_123!" });
    let response = post_json(app, "/api/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Register a user and return `(token, project_api_key)` for its default
/// project.
pub async fn register_with_project(app: Router, email: &str) -> (String, String) {
    let registered = register_user(app.clone(), email).await;
    let token = registered["token"].as_str().expect("token").to_string();

    let response = get_auth(app, "/api/analytics/projects", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let projects = body_json(response).await;
    let api_key = projects[0]["api_key"].as_str().expect("api key").to_string();

    (token, api_key)
}

/// A minimal valid submission body.
pub fn submit_body(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Something is broken",
    })
}
