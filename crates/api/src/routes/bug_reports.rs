//! Route definitions for bug reporting.
//!
//! Mounted at `/bug-reports` by `api_routes()`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::bug_reports;
use crate::state::AppState;

/// Bug report routes.
///
/// ```text
/// POST   /submit            -> submit_bug_report (API key or token)
/// GET    /                  -> list_bug_reports
/// GET    /{id}              -> get_bug_report
/// PUT    /{id}/status       -> update_bug_report_status
/// DELETE /{id}              -> delete_bug_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(bug_reports::submit_bug_report))
        .route("/", get(bug_reports::list_bug_reports))
        .route(
            "/{id}",
            get(bug_reports::get_bug_report).delete(bug_reports::delete_bug_report),
        )
        .route("/{id}/status", put(bug_reports::update_bug_report_status))
}
