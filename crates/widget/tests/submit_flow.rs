//! End-to-end submission tests against a live HTTP server.
//!
//! A minimal axum server stands in for the API so the sink's status
//! classification (accept / reject / fall back) is exercised over a real
//! socket.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;

use bugspot_widget::context::{ContextCollector, PageFacts};
use bugspot_widget::report::NewBugReport;
use bugspot_widget::sink::{ApiSink, FallbackStore, SubmitError, SubmitReceipt};
use bugspot_widget::submit::CreateBugReport;

type Captured = Arc<Mutex<Option<serde_json::Value>>>;

/// Serve the router on an ephemeral port, returning its base URL.
async fn start(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

/// Accepts submissions carrying `X-API-Key: good-key`, capturing the body.
async fn submit_handler(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if key != Some("good-key") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid API key" })),
        );
    }
    *captured.lock().unwrap() = Some(body);
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Bug report submitted successfully", "id": 7 })),
    )
}

async fn project_server() -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(None));
    let router = Router::new()
        .route("/api/bug-reports/submit", post(submit_handler))
        .with_state(captured.clone());
    (start(router).await, captured)
}

async fn failing_server(status: StatusCode, error: &'static str) -> String {
    let router = Router::new().route(
        "/api/bug-reports/submit",
        post(move || async move {
            (status, Json(serde_json::json!({ "error": error })))
        }),
    );
    start(router).await
}

fn pipeline(api_url: &str, api_key: &str, store: FallbackStore) -> CreateBugReport {
    let sink = Arc::new(ApiSink::new(api_url, api_key, store));
    let mut facts = PageFacts::new("https://app.example.com/checkout");
    facts.user_agent = "integration-agent/1.0".into();
    facts.viewport = (1280, 720);
    facts.screen = (1920, 1080);
    let collector = Arc::new(ContextCollector::new(facts));
    CreateBugReport::new(sink, collector)
}

fn input() -> NewBugReport {
    NewBugReport {
        title: "Pay button stuck".into(),
        description: "Clicking pay spins forever".into(),
        steps: vec!["Add an item".into(), "Press pay".into()],
        tags: vec!["checkout".into()],
        ..Default::default()
    }
}

#[tokio::test]
async fn accepted_submission_returns_server_id_and_writes_nothing_locally() {
    let (url, captured) = project_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FallbackStore::new(dir.path().join("pending.json"));
    let pipeline = pipeline(&url, "good-key", store.clone());

    let receipt = pipeline.execute(input()).await.unwrap();

    assert_eq!(receipt, SubmitReceipt::Accepted { id: "7".into() });
    // Exclusive outcome: a server id means no local record.
    assert!(store.pending().unwrap().is_empty());

    // The wire body is camelCase and carries the collected environment.
    let body = captured.lock().unwrap().clone().expect("body captured");
    assert_eq!(body["title"], "Pay button stuck");
    assert_eq!(body["severity"], "medium");
    assert_eq!(body["userAgent"], "integration-agent/1.0");
    assert_eq!(body["environment"]["viewport"], "1280x720");
    assert_eq!(body["environment"]["referrer"], "Direct");
    assert_eq!(body["steps"][1], "Press pay");
}

#[tokio::test]
async fn unauthorized_submission_fails_without_fallback() {
    let (url, _captured) = project_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FallbackStore::new(dir.path().join("pending.json"));
    let pipeline = pipeline(&url, "wrong-key", store.clone());

    let err = pipeline.execute(input()).await.unwrap_err();

    assert!(matches!(err, SubmitError::Rejected(ref msg) if msg == "Invalid API key"));
    // 401 never falls back: the store stays untouched.
    assert!(store.pending().unwrap().is_empty());
}

#[tokio::test]
async fn bad_request_fails_without_fallback() {
    let url = failing_server(StatusCode::BAD_REQUEST, "Screenshot size exceeds 1MB limit").await;
    let dir = tempfile::tempdir().unwrap();
    let store = FallbackStore::new(dir.path().join("pending.json"));
    let pipeline = pipeline(&url, "good-key", store.clone());

    let err = pipeline.execute(input()).await.unwrap_err();

    assert!(matches!(err, SubmitError::Rejected(_)));
    assert!(store.pending().unwrap().is_empty());
}

#[tokio::test]
async fn server_error_preserves_report_locally() {
    let url = failing_server(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    let dir = tempfile::tempdir().unwrap();
    let store = FallbackStore::new(dir.path().join("pending.json"));
    let pipeline = pipeline(&url, "good-key", store.clone());

    let receipt = pipeline.execute(input()).await.unwrap();

    let id = receipt.id().to_string();
    assert!(id.starts_with("local_"));
    assert!(id["local_".len()..].chars().all(|c| c.is_ascii_digit()));

    let pending = store.pending().unwrap();
    assert_eq!(pending.len(), 1, "exactly one fallback record per attempt");
    assert_eq!(pending[0].status, "pending");
    assert_eq!(pending[0].id, id);
    assert_eq!(pending[0].report.title, "Pay button stuck");
}

#[tokio::test]
async fn unreachable_server_preserves_report_locally() {
    // Nothing listens on this port: connection refused is a connectivity
    // failure and must fall back, same as a timeout.
    let dir = tempfile::tempdir().unwrap();
    let store = FallbackStore::new(dir.path().join("pending.json"));
    let sink = ApiSink::new("http://127.0.0.1:9", "good-key", store.clone());

    let mut facts = PageFacts::new("https://app.example.com/checkout");
    facts.user_agent = "integration-agent/1.0".into();
    let collector = Arc::new(ContextCollector::new(facts));
    let pipeline = CreateBugReport::new(Arc::new(sink), collector);

    let first = pipeline.execute(input()).await.unwrap();
    let second = pipeline.execute(input()).await.unwrap();

    assert!(matches!(first, SubmitReceipt::StoredLocally { .. }));
    assert!(matches!(second, SubmitReceipt::StoredLocally { .. }));
    assert_eq!(store.pending().unwrap().len(), 2);
}

#[tokio::test]
async fn sink_validation_short_circuits_before_the_network() {
    // The URL is unroutable; reaching the network would surface as a
    // fallback write, which the final assertion rules out.
    let dir = tempfile::tempdir().unwrap();
    let store = FallbackStore::new(dir.path().join("pending.json"));
    let sink = ApiSink::new("http://127.0.0.1:9", "", store.clone());

    let mut facts = PageFacts::new("https://app.example.com");
    facts.user_agent = "integration-agent/1.0".into();
    let collector = Arc::new(ContextCollector::new(facts));
    let use_case = CreateBugReport::new(Arc::new(sink), collector);

    let err = use_case.execute(input()).await.unwrap_err();
    assert!(matches!(err, SubmitError::Validation(ref msg) if msg.contains("API key")));
    assert!(store.pending().unwrap().is_empty());
}
