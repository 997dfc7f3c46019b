//! Datastore abstraction.
//!
//! Handlers depend on the [`Datastore`] trait, never on a concrete backend.
//! Two implementations exist and are selected at construction time:
//!
//! - [`SqliteDatastore`] -- the production backend (sqlx over SQLite).
//! - [`MemoryDatastore`] -- an in-memory test double with the same
//!   observable behavior, used by the HTTP integration tests.

use async_trait::async_trait;
use bugspot_core::types::{DbId, Timestamp};

use crate::models::analytics::{DailyCount, SeverityCount, StatusCount};
use crate::models::bug_report::{
    BugReport, BugReportListItem, BugReportListParams, CreateBugReport,
};
use crate::models::project::{CreateProject, Project};
use crate::models::reset_token::PasswordResetToken;
use crate::models::user::{CreateUser, User};

mod memory;
mod sqlite;

pub use memory::MemoryDatastore;
pub use sqlite::SqliteDatastore;

/// Errors surfaced by datastore operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness violation detected by the backend.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Persistence operations required by the API layer.
#[async_trait]
pub trait Datastore: Send + Sync {
    // -- Users ------------------------------------------------------------

    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;
    async fn update_user_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<(), StoreError>;

    // -- Password reset tokens --------------------------------------------

    /// Invalidate any existing tokens for the user and store a new one.
    async fn replace_reset_token(
        &self,
        user_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<(), StoreError>;
    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError>;
    async fn mark_reset_token_used(&self, id: DbId) -> Result<(), StoreError>;

    // -- Projects ----------------------------------------------------------

    async fn create_project(&self, input: &CreateProject) -> Result<Project, StoreError>;
    async fn find_project_by_api_key(&self, api_key: &str)
        -> Result<Option<Project>, StoreError>;
    /// The user's oldest project, used as the default submission target for
    /// dashboard-authenticated submissions.
    async fn first_project_for_user(&self, user_id: DbId)
        -> Result<Option<Project>, StoreError>;
    async fn list_projects_for_user(&self, user_id: DbId) -> Result<Vec<Project>, StoreError>;

    // -- Bug reports -------------------------------------------------------

    async fn create_bug_report(
        &self,
        project_id: DbId,
        input: &CreateBugReport,
    ) -> Result<BugReport, StoreError>;
    /// Fetch one report, enforcing ownership through the project join.
    async fn find_bug_report_for_user(
        &self,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<BugReportListItem>, StoreError>;
    /// List the user's reports newest-first with optional filters.
    async fn list_bug_reports(
        &self,
        user_id: DbId,
        params: &BugReportListParams,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BugReportListItem>, StoreError>;
    /// Returns `false` when the report does not exist or is not owned by
    /// the user.
    async fn update_bug_report_status(
        &self,
        id: DbId,
        user_id: DbId,
        status: &str,
    ) -> Result<bool, StoreError>;
    /// Returns `false` when the report does not exist or is not owned by
    /// the user.
    async fn delete_bug_report(&self, id: DbId, user_id: DbId) -> Result<bool, StoreError>;
    async fn set_bug_report_analysis(
        &self,
        id: DbId,
        analysis: &serde_json::Value,
    ) -> Result<(), StoreError>;

    // -- Analytics ---------------------------------------------------------

    async fn record_event(
        &self,
        project_id: DbId,
        event_type: &str,
        event_data: serde_json::Value,
    ) -> Result<(), StoreError>;
    async fn count_reports(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<i64, StoreError>;
    async fn count_reports_by_status(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<Vec<StatusCount>, StoreError>;
    async fn count_reports_by_severity(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<Vec<SeverityCount>, StoreError>;
    async fn count_reports_by_day(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
        days: i64,
    ) -> Result<Vec<DailyCount>, StoreError>;
    async fn recent_reports(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<BugReportListItem>, StoreError>;
}
