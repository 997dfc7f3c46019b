//! Route tree for the `/api` prefix.

pub mod analytics;
pub mod auth;
pub mod bug_reports;
pub mod health;
pub mod widget;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                          service health (public)
///
/// /auth/register                   register (public)
/// /auth/login                      login (public)
/// /auth/profile                    profile (requires auth)
/// /auth/forgot-password            request password reset (public)
/// /auth/reset-password             reset password with token (public)
///
/// /bug-reports/submit              submit (API key or auth)
/// /bug-reports                     list (requires auth)
/// /bug-reports/{id}                get, delete (requires auth)
/// /bug-reports/{id}/status         update status (requires auth)
///
/// /analytics/dashboard             aggregated stats (requires auth)
/// /analytics/projects              the user's projects (requires auth)
///
/// /widget/config/{api_key}         widget boot configuration (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::router())
        .nest("/bug-reports", bug_reports::router())
        .nest("/analytics", analytics::router())
        .nest("/widget", widget::router())
}
