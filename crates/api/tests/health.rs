//! Health endpoint smoke test.

mod common;

use axum::http::StatusCode;

use common::{body_json, get};

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _store) = common::build_test_app();

    let response = get(app, "/api/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["timestamp"].is_string());
}
