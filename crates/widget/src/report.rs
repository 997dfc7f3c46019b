//! The bug report entity as submitted on the wire.

use serde::{Deserialize, Serialize};

use bugspot_core::environment::EnvironmentData;
use bugspot_core::report::Severity;

/// A fully assembled bug report, ready for submission. Field names are
/// camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugReport {
    /// Absent at creation. Assigned by the server on success, or
    /// synthesized locally on fallback; immutable afterwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    pub environment: EnvironmentData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub user_agent: String,
    pub url: String,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
}

/// Caller-supplied fields for a new report; everything else is collected
/// by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct NewBugReport {
    pub title: String,
    pub description: String,
    /// Defaults to [`Severity::Medium`] when unspecified.
    pub severity: Option<Severity>,
    pub screenshot: Option<String>,
    pub user_email: Option<String>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
}
