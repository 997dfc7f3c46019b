//! Bug report entity model and DTOs.

use bugspot_core::report::Severity;
use bugspot_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `bug_reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BugReport {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: String,
    pub severity: String,
    pub status: String,
    pub screenshot: Option<String>,
    /// Environment snapshot captured by the widget, stored verbatim.
    pub environment: Option<serde_json::Value>,
    pub user_email: Option<String>,
    pub user_agent: Option<String>,
    pub url: Option<String>,
    pub steps: Json<Vec<String>>,
    pub tags: Json<Vec<String>>,
    /// Heuristic triage analysis, filled in by a background task.
    pub ai_analysis: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A bug report joined with the owning project's name, as returned by the
/// dashboard list and analytics endpoints.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BugReportListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub report: BugReport,
    pub project_name: String,
}

/// DTO for submitting a new bug report. Field names are camelCase on the
/// wire to match the widget protocol.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBugReport {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    pub screenshot: Option<String>,
    pub environment: Option<serde_json::Value>,
    pub user_email: Option<String>,
    pub user_agent: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// DTO for updating a bug report's status.
#[derive(Debug, Deserialize)]
pub struct UpdateBugReportStatus {
    pub status: String,
}

/// Query parameters for listing bug reports.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugReportListParams {
    pub project_id: Option<DbId>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
