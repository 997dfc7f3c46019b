//! SQLite-backed [`Datastore`] implementation.

use async_trait::async_trait;
use bugspot_core::types::{DbId, Timestamp};
use sqlx::types::Json;

use crate::models::analytics::{DailyCount, SeverityCount, StatusCount};
use crate::models::bug_report::{
    BugReport, BugReportListItem, BugReportListParams, CreateBugReport,
};
use crate::models::project::{CreateProject, Project};
use crate::models::reset_token::PasswordResetToken;
use crate::models::user::{CreateUser, User};
use crate::DbPool;

use super::{Datastore, StoreError};

/// Column list for `users` queries.
const USER_COLUMNS: &str = "id, email, password_hash, api_key, plan, created_at, updated_at";

/// Column list for `projects` queries.
const PROJECT_COLUMNS: &str = "id, user_id, name, domain, api_key, settings, created_at";

/// Column list for `bug_reports` queries.
const REPORT_COLUMNS: &str = "\
    id, project_id, title, description, severity, status, screenshot, \
    environment, user_email, user_agent, url, steps, tags, ai_analysis, \
    created_at, updated_at";

/// Column list for bug reports joined with the owning project (`br`/`p`
/// aliases), including the project name for list responses.
const REPORT_JOIN_COLUMNS: &str = "\
    br.id, br.project_id, br.title, br.description, br.severity, br.status, \
    br.screenshot, br.environment, br.user_email, br.user_agent, br.url, \
    br.steps, br.tags, br.ai_analysis, br.created_at, br.updated_at, \
    p.name AS project_name";

/// Production datastore backed by a SQLite connection pool.
pub struct SqliteDatastore {
    pool: DbPool,
}

impl SqliteDatastore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Datastore for SqliteDatastore {
    // -- Users ------------------------------------------------------------

    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (email, password_hash, api_key) \
             VALUES (?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.api_key)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_user_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -- Password reset tokens --------------------------------------------

    async fn replace_reset_token(
        &self,
        user_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError> {
        Ok(sqlx::query_as::<_, PasswordResetToken>(
            "SELECT id, user_id, token_hash, expires_at, used, created_at \
             FROM password_reset_tokens WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn mark_reset_token_used(&self, id: DbId) -> Result<(), StoreError> {
        sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -- Projects ----------------------------------------------------------

    async fn create_project(&self, input: &CreateProject) -> Result<Project, StoreError> {
        let query = format!(
            "INSERT INTO projects (user_id, name, api_key) \
             VALUES (?, ?, ?) \
             RETURNING {PROJECT_COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.api_key)
            .fetch_one(&self.pool)
            .await?;
        Ok(project)
    }

    async fn find_project_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<Project>, StoreError> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE api_key = ?");
        Ok(sqlx::query_as::<_, Project>(&query)
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn first_project_for_user(
        &self,
        user_id: DbId,
    ) -> Result<Option<Project>, StoreError> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ? ORDER BY id ASC LIMIT 1"
        );
        Ok(sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_projects_for_user(&self, user_id: DbId) -> Result<Vec<Project>, StoreError> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ? ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    // -- Bug reports -------------------------------------------------------

    async fn create_bug_report(
        &self,
        project_id: DbId,
        input: &CreateBugReport,
    ) -> Result<BugReport, StoreError> {
        let query = format!(
            "INSERT INTO bug_reports \
                (project_id, title, description, severity, screenshot, \
                 environment, user_email, user_agent, url, steps, tags) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {REPORT_COLUMNS}"
        );
        let report = sqlx::query_as::<_, BugReport>(&query)
            .bind(project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.severity.as_str())
            .bind(&input.screenshot)
            .bind(&input.environment)
            .bind(&input.user_email)
            .bind(&input.user_agent)
            .bind(&input.url)
            .bind(Json(&input.steps))
            .bind(Json(&input.tags))
            .fetch_one(&self.pool)
            .await?;
        Ok(report)
    }

    async fn find_bug_report_for_user(
        &self,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<BugReportListItem>, StoreError> {
        let query = format!(
            "SELECT {REPORT_JOIN_COLUMNS} \
             FROM bug_reports br JOIN projects p ON br.project_id = p.id \
             WHERE br.id = ? AND p.user_id = ?"
        );
        Ok(sqlx::query_as::<_, BugReportListItem>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_bug_reports(
        &self,
        user_id: DbId,
        params: &BugReportListParams,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BugReportListItem>, StoreError> {
        let mut conditions: Vec<&str> = vec!["p.user_id = ?"];
        if params.project_id.is_some() {
            conditions.push("br.project_id = ?");
        }
        if params.status.is_some() {
            conditions.push("br.status = ?");
        }
        if params.severity.is_some() {
            conditions.push("br.severity = ?");
        }

        let query = format!(
            "SELECT {REPORT_JOIN_COLUMNS} \
             FROM bug_reports br JOIN projects p ON br.project_id = p.id \
             WHERE {} \
             ORDER BY br.created_at DESC, br.id DESC \
             LIMIT ? OFFSET ?",
            conditions.join(" AND ")
        );

        let mut q = sqlx::query_as::<_, BugReportListItem>(&query).bind(user_id);
        if let Some(project_id) = params.project_id {
            q = q.bind(project_id);
        }
        if let Some(ref status) = params.status {
            q = q.bind(status);
        }
        if let Some(ref severity) = params.severity {
            q = q.bind(severity);
        }

        Ok(q.bind(limit).bind(offset).fetch_all(&self.pool).await?)
    }

    async fn update_bug_report_status(
        &self,
        id: DbId,
        user_id: DbId,
        status: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE bug_reports SET status = ?, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ? AND project_id IN (SELECT id FROM projects WHERE user_id = ?)",
        )
        .bind(status)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_bug_report(&self, id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM bug_reports \
             WHERE id = ? AND project_id IN (SELECT id FROM projects WHERE user_id = ?)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_bug_report_analysis(
        &self,
        id: DbId,
        analysis: &serde_json::Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE bug_reports SET ai_analysis = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(analysis)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // -- Analytics ---------------------------------------------------------

    async fn record_event(
        &self,
        project_id: DbId,
        event_type: &str,
        event_data: serde_json::Value,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO analytics (project_id, event_type, event_data) VALUES (?, ?, ?)")
            .bind(project_id)
            .bind(event_type)
            .bind(event_data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_reports(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<i64, StoreError> {
        let query = format!(
            "SELECT COUNT(*) FROM bug_reports br \
             JOIN projects p ON br.project_id = p.id \
             WHERE p.user_id = ?{}",
            project_filter(project_id)
        );
        let mut q = sqlx::query_scalar::<_, i64>(&query).bind(user_id);
        if let Some(pid) = project_id {
            q = q.bind(pid);
        }
        Ok(q.fetch_one(&self.pool).await?)
    }

    async fn count_reports_by_status(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<Vec<StatusCount>, StoreError> {
        let query = format!(
            "SELECT br.status AS status, COUNT(*) AS count FROM bug_reports br \
             JOIN projects p ON br.project_id = p.id \
             WHERE p.user_id = ?{} \
             GROUP BY br.status",
            project_filter(project_id)
        );
        let mut q = sqlx::query_as::<_, StatusCount>(&query).bind(user_id);
        if let Some(pid) = project_id {
            q = q.bind(pid);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn count_reports_by_severity(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<Vec<SeverityCount>, StoreError> {
        let query = format!(
            "SELECT br.severity AS severity, COUNT(*) AS count FROM bug_reports br \
             JOIN projects p ON br.project_id = p.id \
             WHERE p.user_id = ?{} \
             GROUP BY br.severity",
            project_filter(project_id)
        );
        let mut q = sqlx::query_as::<_, SeverityCount>(&query).bind(user_id);
        if let Some(pid) = project_id {
            q = q.bind(pid);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn count_reports_by_day(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
        days: i64,
    ) -> Result<Vec<DailyCount>, StoreError> {
        let query = format!(
            "SELECT DATE(br.created_at) AS date, COUNT(*) AS count FROM bug_reports br \
             JOIN projects p ON br.project_id = p.id \
             WHERE p.user_id = ?{} \
               AND br.created_at >= datetime('now', printf('-%d days', ?)) \
             GROUP BY DATE(br.created_at) \
             ORDER BY date",
            project_filter(project_id)
        );
        let mut q = sqlx::query_as::<_, DailyCount>(&query).bind(user_id);
        if let Some(pid) = project_id {
            q = q.bind(pid);
        }
        Ok(q.bind(days).fetch_all(&self.pool).await?)
    }

    async fn recent_reports(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<BugReportListItem>, StoreError> {
        let query = format!(
            "SELECT {REPORT_JOIN_COLUMNS} \
             FROM bug_reports br JOIN projects p ON br.project_id = p.id \
             WHERE p.user_id = ?{} \
             ORDER BY br.created_at DESC, br.id DESC \
             LIMIT ?",
            project_filter(project_id)
        );
        let mut q = sqlx::query_as::<_, BugReportListItem>(&query).bind(user_id);
        if let Some(pid) = project_id {
            q = q.bind(pid);
        }
        Ok(q.bind(limit).fetch_all(&self.pool).await?)
    }
}

/// Optional `AND br.project_id = ?` clause shared by the analytics queries.
fn project_filter(project_id: Option<DbId>) -> &'static str {
    if project_id.is_some() {
        " AND br.project_id = ?"
    } else {
        ""
    }
}
