//! Analytics event model and aggregate rows for the dashboard.

use bugspot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Event type recorded when a bug report is submitted.
pub const EVENT_BUG_REPORT_SUBMITTED: &str = "bug_report_submitted";

/// A row from the `analytics` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnalyticsEvent {
    pub id: DbId,
    pub project_id: DbId,
    pub event_type: String,
    pub event_data: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// Report count grouped by status.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Report count grouped by severity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SeverityCount {
    pub severity: String,
    pub count: i64,
}

/// Report count for one calendar day (`YYYY-MM-DD`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}
