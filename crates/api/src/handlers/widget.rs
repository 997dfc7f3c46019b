//! Handler for the public widget configuration endpoint.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use bugspot_core::types::DbId;
use bugspot_db::store::Datastore as _;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Configuration handed to an embedding page at widget boot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfigResponse {
    pub project_id: DbId,
    pub project_name: String,
    /// Appearance/behavior defaults merged under the project's stored
    /// overrides.
    pub settings: serde_json::Value,
}

/// GET /api/widget/config/{api_key}
///
/// Public endpoint: the widget script calls it before any report exists,
/// identified only by its project API key.
pub async fn widget_config(
    State(state): State<AppState>,
    Path(api_key): Path<String>,
) -> AppResult<Json<WidgetConfigResponse>> {
    let project = state
        .store
        .find_project_by_api_key(&api_key)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    let mut settings = serde_json::Map::new();
    settings.insert("position".into(), "bottom-right".into());
    settings.insert("primaryColor".into(), "#3B82F6".into());
    settings.insert("enableScreenshot".into(), true.into());
    settings.insert("showPreview".into(), true.into());

    // Project-stored settings override the defaults key by key.
    if let Some(overrides) = project.settings.as_object() {
        for (key, value) in overrides {
            settings.insert(key.clone(), value.clone());
        }
    }

    Ok(Json(WidgetConfigResponse {
        project_id: project.id,
        project_name: project.name,
        settings: serde_json::Value::Object(settings),
    }))
}
