//! Project model and DTOs.
//!
//! A project is the unit the embeddable widget authenticates against: its
//! `api_key` travels in the `X-API-Key` header of widget submissions.

use bugspot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub domain: Option<String>,
    pub api_key: String,
    /// Widget appearance/behavior overrides, stored as JSON.
    pub settings: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub user_id: DbId,
    pub name: String,
    pub api_key: String,
}

/// Name of the project auto-created for every new account.
pub const DEFAULT_PROJECT_NAME: &str = "Default Project";
