//! Report submission: network-first with a local fallback.
//!
//! [`ApiSink`] favors the server but tolerates its unavailability. The one
//! deliberate distinction worth preserving exactly: a *client/auth* error
//! (HTTP 400/401) surfaces as a failure and never falls back, while a
//! *connectivity* failure (timeout, connect error, any other status)
//! preserves the report in the local pending store. Per submit call,
//! exactly one of {server id, local record, explicit failure} can occur.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::context::iso_now;
use crate::report::BugReport;

/// Bound on the network submission attempt.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Status stamped on locally preserved records. This vocabulary is
/// distinct from the server's status set and is never reconciled with it.
pub const PENDING_STATUS: &str = "pending";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Typed failure of a submission attempt. Never an escaping panic; the UI
/// translates these into visible messages.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Missing/blank required field or missing API key. Surfaced before
    /// any network attempt; never triggers the fallback.
    #[error("{0}")]
    Validation(String),

    /// The server rejected the submission (HTTP 400/401). Deliberately not
    /// preserved locally: silently "saving" an invalid submission would
    /// hide a real problem from the user.
    #[error("{0}")]
    Rejected(String),

    /// The local fallback write failed. The one path where a report can be
    /// lost entirely, so it is reported rather than swallowed.
    #[error("Failed to save report locally: {0}")]
    Storage(String),
}

/// Successful outcome of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReceipt {
    /// The server accepted the report and issued an identifier.
    Accepted { id: String },
    /// The server was unreachable; the report was preserved locally with a
    /// synthesized `local_<epoch-millis>` identifier and pending status.
    StoredLocally { id: String },
}

impl SubmitReceipt {
    pub fn id(&self) -> &str {
        match self {
            SubmitReceipt::Accepted { id } | SubmitReceipt::StoredLocally { id } => id,
        }
    }
}

pub type SubmitResult = Result<SubmitReceipt, SubmitError>;

/// Destination for assembled bug reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit(&self, report: &BugReport) -> SubmitResult;
}

// ---------------------------------------------------------------------------
// Fallback store
// ---------------------------------------------------------------------------

/// A report preserved locally after a connectivity failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReport {
    #[serde(flatten)]
    pub report: BugReport,
    pub id: String,
    pub timestamp: String,
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt pending store: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// JSON-file store for pending reports: a single file holding an array of
/// records, appended to with a read-modify-write cycle.
///
/// A single process is assumed to be the sole writer; concurrent writers
/// could race and lose an entry. Nothing ever re-submits these records to
/// the server -- they stay local until the host exports them via
/// [`FallbackStore::take_pending`].
#[derive(Debug, Clone)]
pub struct FallbackStore {
    path: PathBuf,
}

impl FallbackStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All pending records, oldest first. A missing file is an empty list.
    pub fn pending(&self) -> Result<Vec<PendingReport>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Preserve a report with a locally synthesized id and pending status.
    /// Returns the assigned id.
    pub fn append(&self, report: &BugReport) -> Result<String, StorageError> {
        let id = format!("local_{}", Utc::now().timestamp_millis());
        let mut list = self.pending()?;
        list.push(PendingReport {
            // The record-level `id` carries the local identifier; the
            // flattened report keeps `id: None` so the key appears once.
            report: BugReport {
                id: None,
                ..report.clone()
            },
            id: id.clone(),
            timestamp: iso_now(),
            status: PENDING_STATUS.to_string(),
        });
        fs::write(&self.path, serde_json::to_vec_pretty(&list)?)?;
        Ok(id)
    }

    /// Drain the store, returning every pending record and deleting the
    /// file. For hosts that export or manually re-submit stranded reports.
    pub fn take_pending(&self) -> Result<Vec<PendingReport>, StorageError> {
        let pending = self.pending()?;
        if !pending.is_empty() {
            fs::remove_file(&self.path)?;
        }
        Ok(pending)
    }
}

// ---------------------------------------------------------------------------
// API sink
// ---------------------------------------------------------------------------

/// Network-backed [`ReportSink`] with the local fallback.
pub struct ApiSink {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    fallback: FallbackStore,
}

impl ApiSink {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, fallback: FallbackStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            fallback,
        }
    }

    fn submit_url(&self) -> String {
        format!(
            "{}/api/bug-reports/submit",
            self.api_url.trim_end_matches('/')
        )
    }

    /// Preserve the report locally after a connectivity failure.
    fn fall_back(&self, report: &BugReport) -> SubmitResult {
        match self.fallback.append(report) {
            Ok(id) => {
                tracing::info!(id = %id, "Report preserved in local fallback store");
                Ok(SubmitReceipt::StoredLocally { id })
            }
            Err(e) => {
                tracing::error!(error = %e, "Local fallback write failed");
                Err(SubmitError::Storage(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl ReportSink for ApiSink {
    async fn submit(&self, report: &BugReport) -> SubmitResult {
        // Pre-flight checks: no network attempt, no fallback.
        if report.title.trim().is_empty() {
            return Err(SubmitError::Validation("Title is required".into()));
        }
        if report.description.trim().is_empty() {
            return Err(SubmitError::Validation("Description is required".into()));
        }
        if self.api_key.is_empty() {
            return Err(SubmitError::Validation("API key is required".into()));
        }

        let response = self
            .http
            .post(self.submit_url())
            .header("X-API-Key", &self.api_key)
            .timeout(SUBMIT_TIMEOUT)
            .json(report)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            // Timeout, connect failure, or any other transport error.
            Err(e) => {
                tracing::warn!(error = %e, "API submission failed, falling back to local store");
                return self.fall_back(report);
            }
        };

        let status = response.status();

        if status.is_success() {
            let body: serde_json::Value = response.json().await.map_err(|e| {
                SubmitError::Rejected(format!("API error: malformed response: {e}"))
            })?;
            let id = match body.get("id") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => {
                    return Err(SubmitError::Rejected(
                        "API error: response missing report id".into(),
                    ))
                }
            };
            return Ok(SubmitReceipt::Accepted { id });
        }

        // Pull the server's error message when there is one.
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| format!("API error: {status}"));

        // Bad request / invalid key: attributable to input or credentials,
        // not availability. Never preserved locally.
        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(SubmitError::Rejected(message));
        }

        // Everything else (5xx, unexpected statuses) is transient.
        tracing::warn!(status = %status, "API submission failed, falling back to local store");
        self.fall_back(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bugspot_core::environment::EnvironmentData;
    use bugspot_core::report::Severity;

    fn sample_report() -> BugReport {
        BugReport {
            id: None,
            title: "Checkout fails".into(),
            description: "Pressing pay does nothing".into(),
            severity: Severity::High,
            screenshot: None,
            environment: EnvironmentData {
                user_agent: "test-agent/1.0".into(),
                url: "https://shop.example.com/checkout".into(),
                referrer: "Direct".into(),
                viewport: "1280x720".into(),
                screen: "1920x1080".into(),
                timestamp: "2026-01-01T00:00:00.000Z".into(),
                language: "en-US".into(),
                platform: "linux".into(),
            },
            user_email: None,
            user_agent: "test-agent/1.0".into(),
            url: "https://shop.example.com/checkout".into(),
            steps: vec![],
            tags: vec![],
        }
    }

    #[test]
    fn fallback_store_appends_pending_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path().join("pending.json"));

        assert!(store.pending().unwrap().is_empty());

        let id = store.append(&sample_report()).unwrap();
        assert!(id.starts_with("local_"));
        assert!(id["local_".len()..].chars().all(|c| c.is_ascii_digit()));

        let pending = store.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, PENDING_STATUS);
        assert_eq!(pending[0].id, id);
        assert_eq!(pending[0].report.title, "Checkout fails");
    }

    #[test]
    fn fallback_record_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path().join("pending.json"));
        store.append(&sample_report()).unwrap();

        // The file holds a JSON array with the report fields flattened in.
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["title"], "Checkout fails");
        assert_eq!(value[0]["status"], "pending");
        assert_eq!(value[0]["environment"]["viewport"], "1280x720");
    }

    #[test]
    fn take_pending_drains_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path().join("pending.json"));
        store.append(&sample_report()).unwrap();
        store.append(&sample_report()).unwrap();

        let drained = store.take_pending().unwrap();
        assert_eq!(drained.len(), 2);
        assert!(store.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_title_fails_validation_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path().join("pending.json"));
        // An unroutable URL: any network attempt would fall back and write
        // a pending record, which the assertion below would catch.
        let sink = ApiSink::new("http://127.0.0.1:1", "key", store.clone());

        let mut report = sample_report();
        report.title = "   ".into();

        let err = sink.submit(&report).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(ref msg) if msg.contains("Title")));
        assert!(store.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_api_key_fails_validation_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path().join("pending.json"));
        let sink = ApiSink::new("http://127.0.0.1:1", "", store.clone());

        let err = sink.submit(&sample_report()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(ref msg) if msg.contains("API key")));
        assert!(store.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn connectivity_failure_preserves_report_locally() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path().join("pending.json"));
        // Connection refused counts as a connectivity failure.
        let sink = ApiSink::new("http://127.0.0.1:1", "key", store.clone());

        let receipt = sink.submit(&sample_report()).await.unwrap();
        match receipt {
            SubmitReceipt::StoredLocally { ref id } => {
                assert!(id.starts_with("local_"));
                assert!(id["local_".len()..].chars().all(|c| c.is_ascii_digit()));
            }
            other => panic!("expected local receipt, got {other:?}"),
        }

        let pending = store.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, "pending");
    }
}
