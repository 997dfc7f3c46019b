//! Handlers for bug reporting.
//!
//! Submission accepts either widget (API key) or dashboard (JWT) callers;
//! the remaining endpoints are dashboard-only and enforce ownership
//! through the project join.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use validator::ValidateEmail;

use bugspot_core::error::CoreError;
use bugspot_core::report;
use bugspot_core::types::{clamp_limit, clamp_offset, DbId};
use bugspot_db::models::analytics::EVENT_BUG_REPORT_SUBMITTED;
use bugspot_db::models::bug_report::{
    BugReportListItem, BugReportListParams, CreateBugReport, UpdateBugReportStatus,
};
use bugspot_db::store::Datastore as _;

use crate::background;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::project::SubmitProject;
use crate::state::AppState;

/// Response returned when a report is accepted. The widget relies on the
/// top-level `id` field.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: &'static str,
    pub id: DbId,
}

/// Simple `{ "message": ... }` response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// POST /bug-reports/submit
// ---------------------------------------------------------------------------

/// Submit a new bug report from the widget or the dashboard.
pub async fn submit_bug_report(
    SubmitProject(project): SubmitProject,
    State(state): State<AppState>,
    Json(mut input): Json<CreateBugReport>,
) -> AppResult<impl IntoResponse> {
    report::validate_title(&input.title)?;
    report::validate_description(&input.description)?;

    input.title = input.title.trim().to_string();
    input.description = input.description.trim().to_string();
    input.user_email = input
        .user_email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty());

    if let Some(ref email) = input.user_email {
        if !email.validate_email() {
            return Err(AppError::Core(CoreError::Validation(
                "Invalid email format".into(),
            )));
        }
    }
    if let Some(ref screenshot) = input.screenshot {
        report::validate_screenshot(screenshot)?;
    }

    let created = state.store.create_bug_report(project.id, &input).await?;

    // Best-effort analytics; a failure never affects the response.
    let event_data = serde_json::json!({
        "severity": input.severity,
        "hasScreenshot": input.screenshot.is_some(),
    });
    if let Err(e) = state
        .store
        .record_event(project.id, EVENT_BUG_REPORT_SUBMITTED, event_data)
        .await
    {
        tracing::warn!(error = %e, "Analytics tracking failed");
    }

    // Triage analysis runs detached with its own error channel; the
    // submission response never waits on it.
    if state.config.ai_analysis_enabled {
        background::analysis::spawn_analysis(Arc::clone(&state.store), created.id, input);
    }

    tracing::info!(
        bug_report_id = created.id,
        project_id = project.id,
        "Bug report submitted",
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Bug report submitted successfully",
            id: created.id,
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /bug-reports
// ---------------------------------------------------------------------------

/// List the authenticated user's bug reports, newest first, with optional
/// project/status/severity filters.
pub async fn list_bug_reports(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BugReportListParams>,
) -> AppResult<Json<Vec<BugReportListItem>>> {
    // Validate status filter if provided.
    if let Some(ref status) = params.status {
        report::validate_status(status)?;
    }

    let limit = clamp_limit(params.limit, 50, 200);
    let offset = clamp_offset(params.offset);

    let reports = state
        .store
        .list_bug_reports(auth.user_id, &params, limit, offset)
        .await?;

    Ok(Json(reports))
}

// ---------------------------------------------------------------------------
// GET /bug-reports/{id}
// ---------------------------------------------------------------------------

/// Get a single bug report. Users can only view their own reports.
pub async fn get_bug_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<BugReportListItem>> {
    let item = state
        .store
        .find_bug_report_for_user(id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "BugReport",
            id,
        }))?;

    Ok(Json(item))
}

// ---------------------------------------------------------------------------
// PUT /bug-reports/{id}/status
// ---------------------------------------------------------------------------

/// Update a report's status. The target status must be one of the
/// dashboard vocabulary.
pub async fn update_bug_report_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBugReportStatus>,
) -> AppResult<Json<MessageResponse>> {
    report::validate_status(&input.status)?;

    let updated = state
        .store
        .update_bug_report_status(id, auth.user_id, &input.status)
        .await?;
    if !updated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "BugReport",
            id,
        }));
    }

    tracing::info!(bug_report_id = id, status = %input.status, "Bug report status updated");

    Ok(Json(MessageResponse {
        message: "Status updated successfully",
    }))
}

// ---------------------------------------------------------------------------
// DELETE /bug-reports/{id}
// ---------------------------------------------------------------------------

/// Delete a report. Users can only delete their own reports.
pub async fn delete_bug_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let deleted = state.store.delete_bug_report(id, auth.user_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "BugReport",
            id,
        }));
    }

    tracing::info!(bug_report_id = id, "Bug report deleted");

    Ok(Json(MessageResponse {
        message: "Bug report deleted successfully",
    }))
}
