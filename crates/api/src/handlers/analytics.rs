//! Handlers for the dashboard analytics endpoints.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use bugspot_core::types::{clamp_limit, DbId};
use bugspot_db::models::analytics::DailyCount;
use bugspot_db::models::bug_report::BugReportListItem;
use bugspot_db::models::project::Project;
use bugspot_db::store::Datastore as _;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Default and maximum reporting window in days.
const DEFAULT_WINDOW_DAYS: i64 = 30;
const MAX_WINDOW_DAYS: i64 = 365;

/// Number of reports in the "recent" panel.
const RECENT_REPORTS_LIMIT: i64 = 10;

/// Query parameters for `GET /analytics/dashboard`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    pub project_id: Option<DbId>,
    pub days: Option<i64>,
}

/// Aggregated dashboard statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_reports: i64,
    pub reports_by_status: BTreeMap<String, i64>,
    pub reports_by_severity: BTreeMap<String, i64>,
    pub reports_over_time: Vec<DailyCount>,
    pub recent_reports: Vec<BugReportListItem>,
}

/// GET /api/analytics/dashboard
///
/// Totals, breakdowns, a per-day series over the requested window, and
/// the most recent reports.
pub async fn dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> AppResult<Json<DashboardResponse>> {
    let days = clamp_limit(params.days, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS);
    let project_id = params.project_id;
    let store = &state.store;

    let total_reports = store.count_reports(auth.user_id, project_id).await?;

    let reports_by_status = store
        .count_reports_by_status(auth.user_id, project_id)
        .await?
        .into_iter()
        .map(|row| (row.status, row.count))
        .collect();

    let reports_by_severity = store
        .count_reports_by_severity(auth.user_id, project_id)
        .await?
        .into_iter()
        .map(|row| (row.severity, row.count))
        .collect();

    let reports_over_time = store
        .count_reports_by_day(auth.user_id, project_id, days)
        .await?;

    let recent_reports = store
        .recent_reports(auth.user_id, project_id, RECENT_REPORTS_LIMIT)
        .await?;

    Ok(Json(DashboardResponse {
        total_reports,
        reports_by_status,
        reports_by_severity,
        reports_over_time,
        recent_reports,
    }))
}

/// GET /api/analytics/projects
///
/// The authenticated user's projects, newest first.
pub async fn projects(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Project>>> {
    let projects = state.store.list_projects_for_user(auth.user_id).await?;
    Ok(Json(projects))
}
