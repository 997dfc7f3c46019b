//! Submission-target extractor.
//!
//! The submit endpoint serves two callers: the embeddable widget, which
//! authenticates with a project `X-API-Key` header, and the dashboard,
//! which authenticates with a JWT. Either way the handler just needs the
//! project the report belongs to; this extractor resolves it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bugspot_core::api_keys::generate_api_key;
use bugspot_core::error::CoreError;
use bugspot_db::models::project::{CreateProject, Project, DEFAULT_PROJECT_NAME};
use bugspot_db::store::Datastore as _;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The project a submission is attributed to, resolved from either an
/// `X-API-Key` header (widget) or a Bearer token (dashboard).
#[derive(Debug, Clone)]
pub struct SubmitProject(pub Project);

impl FromRequestParts<AppState> for SubmitProject {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Widget path: project API key.
        if let Some(api_key) = parts.headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
            let project = state
                .store
                .find_project_by_api_key(api_key)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized("Invalid API key".into()))
                })?;
            return Ok(SubmitProject(project));
        }

        // Dashboard path: Bearer token, resolved to the user's first
        // project. A default project is created when none exists yet.
        if let Some(token) = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            let claims = validate_token(token, &state.config.jwt).map_err(|_| {
                AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
            })?;

            if let Some(project) = state.store.first_project_for_user(claims.sub).await? {
                return Ok(SubmitProject(project));
            }

            tracing::info!(user_id = claims.sub, "No project found, creating default");
            let project = state
                .store
                .create_project(&CreateProject {
                    user_id: claims.sub,
                    name: DEFAULT_PROJECT_NAME.to_string(),
                    api_key: generate_api_key(),
                })
                .await?;
            return Ok(SubmitProject(project));
        }

        Err(AppError::Core(CoreError::Unauthorized(
            "API key or authorization token required".into(),
        )))
    }
}
