//! Route definitions for the public widget endpoints.

use axum::routing::get;
use axum::Router;

use crate::handlers::widget;
use crate::state::AppState;

/// Routes mounted at `/widget`.
///
/// ```text
/// GET /config/{api_key}  -> widget_config
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/config/{api_key}", get(widget::widget_config))
}
