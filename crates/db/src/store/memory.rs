//! In-memory [`Datastore`] test double.
//!
//! Mirrors the observable behavior of [`SqliteDatastore`] on every path the
//! API exercises, backed by mutex-guarded maps. Selected at construction
//! time (dependency injection); nothing about it leaks into production
//! code paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bugspot_core::report::STATUS_OPEN;
use bugspot_core::types::{DbId, Timestamp};
use chrono::Utc;
use sqlx::types::Json;

use crate::models::analytics::{AnalyticsEvent, DailyCount, SeverityCount, StatusCount};
use crate::models::bug_report::{
    BugReport, BugReportListItem, BugReportListParams, CreateBugReport,
};
use crate::models::project::{CreateProject, Project};
use crate::models::reset_token::PasswordResetToken;
use crate::models::user::{CreateUser, User};

use super::{Datastore, StoreError};

#[derive(Default)]
struct Inner {
    next_user_id: DbId,
    next_project_id: DbId,
    next_report_id: DbId,
    next_event_id: DbId,
    next_token_id: DbId,
    users: HashMap<DbId, User>,
    projects: HashMap<DbId, Project>,
    reports: HashMap<DbId, BugReport>,
    events: Vec<AnalyticsEvent>,
    reset_tokens: HashMap<DbId, PasswordResetToken>,
}

/// In-memory datastore with autoincrement ids per table.
#[derive(Default)]
pub struct MemoryDatastore {
    inner: Mutex<Inner>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-write.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Events recorded so far, oldest first. For test assertions; the
    /// serving API only ever writes events.
    pub fn recorded_events(&self) -> Vec<AnalyticsEvent> {
        self.lock().events.clone()
    }
}

impl Inner {
    /// Project ids owned by the given user.
    fn project_ids_for_user(&self, user_id: DbId) -> Vec<DbId> {
        self.projects
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.id)
            .collect()
    }

    fn project_name(&self, project_id: DbId) -> String {
        self.projects
            .get(&project_id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    /// The user's reports newest-first, with optional project filter.
    fn user_reports(&self, user_id: DbId, project_id: Option<DbId>) -> Vec<&BugReport> {
        let owned = self.project_ids_for_user(user_id);
        let mut reports: Vec<&BugReport> = self
            .reports
            .values()
            .filter(|r| owned.contains(&r.project_id))
            .filter(|r| project_id.is_none_or(|pid| r.project_id == pid))
            .collect();
        reports.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        reports
    }

    fn to_list_item(&self, report: &BugReport) -> BugReportListItem {
        BugReportListItem {
            report: report.clone(),
            project_name: self.project_name(report.project_id),
        }
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    // -- Users ------------------------------------------------------------

    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if inner.users.values().any(|u| u.email == input.email) {
            return Err(StoreError::Conflict(format!(
                "UNIQUE constraint failed: users.email ({})",
                input.email
            )));
        }
        inner.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_user_id,
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            api_key: input.api_key.clone(),
            plan: "free".into(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn update_user_password(
        &self,
        id: DbId,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(user) = inner.users.get_mut(&id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    // -- Password reset tokens --------------------------------------------

    async fn replace_reset_token(
        &self,
        user_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.reset_tokens.retain(|_, t| t.user_id != user_id);
        inner.next_token_id += 1;
        let token = PasswordResetToken {
            id: inner.next_token_id,
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            used: false,
            created_at: Utc::now(),
        };
        inner.reset_tokens.insert(token.id, token);
        Ok(())
    }

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError> {
        Ok(self
            .lock()
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn mark_reset_token_used(&self, id: DbId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(token) = inner.reset_tokens.get_mut(&id) {
            token.used = true;
        }
        Ok(())
    }

    // -- Projects ----------------------------------------------------------

    async fn create_project(&self, input: &CreateProject) -> Result<Project, StoreError> {
        let mut inner = self.lock();
        inner.next_project_id += 1;
        let project = Project {
            id: inner.next_project_id,
            user_id: input.user_id,
            name: input.name.clone(),
            domain: None,
            api_key: input.api_key.clone(),
            settings: serde_json::json!({}),
            created_at: Utc::now(),
        };
        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<Project>, StoreError> {
        Ok(self
            .lock()
            .projects
            .values()
            .find(|p| p.api_key == api_key)
            .cloned())
    }

    async fn first_project_for_user(
        &self,
        user_id: DbId,
    ) -> Result<Option<Project>, StoreError> {
        Ok(self
            .lock()
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .min_by_key(|p| p.id)
            .cloned())
    }

    async fn list_projects_for_user(&self, user_id: DbId) -> Result<Vec<Project>, StoreError> {
        let inner = self.lock();
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(projects)
    }

    // -- Bug reports -------------------------------------------------------

    async fn create_bug_report(
        &self,
        project_id: DbId,
        input: &CreateBugReport,
    ) -> Result<BugReport, StoreError> {
        let mut inner = self.lock();
        inner.next_report_id += 1;
        let now = Utc::now();
        let report = BugReport {
            id: inner.next_report_id,
            project_id,
            title: input.title.clone(),
            description: input.description.clone(),
            severity: input.severity.as_str().to_string(),
            status: STATUS_OPEN.to_string(),
            screenshot: input.screenshot.clone(),
            environment: input.environment.clone(),
            user_email: input.user_email.clone(),
            user_agent: input.user_agent.clone(),
            url: input.url.clone(),
            steps: Json(input.steps.clone()),
            tags: Json(input.tags.clone()),
            ai_analysis: None,
            created_at: now,
            updated_at: now,
        };
        inner.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn find_bug_report_for_user(
        &self,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<BugReportListItem>, StoreError> {
        let inner = self.lock();
        let owned = inner.project_ids_for_user(user_id);
        Ok(inner
            .reports
            .get(&id)
            .filter(|r| owned.contains(&r.project_id))
            .map(|r| inner.to_list_item(r)))
    }

    async fn list_bug_reports(
        &self,
        user_id: DbId,
        params: &BugReportListParams,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BugReportListItem>, StoreError> {
        let inner = self.lock();
        let items = inner
            .user_reports(user_id, params.project_id)
            .into_iter()
            .filter(|r| params.status.as_deref().is_none_or(|s| r.status == s))
            .filter(|r| params.severity.as_deref().is_none_or(|s| r.severity == s))
            .skip(offset as usize)
            .take(limit as usize)
            .map(|r| inner.to_list_item(r))
            .collect();
        Ok(items)
    }

    async fn update_bug_report_status(
        &self,
        id: DbId,
        user_id: DbId,
        status: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let owned = inner.project_ids_for_user(user_id);
        match inner.reports.get_mut(&id) {
            Some(report) if owned.contains(&report.project_id) => {
                report.status = status.to_string();
                report.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_bug_report(&self, id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let owned = inner.project_ids_for_user(user_id);
        let deletable = inner
            .reports
            .get(&id)
            .is_some_and(|report| owned.contains(&report.project_id));
        if deletable {
            inner.reports.remove(&id);
        }
        Ok(deletable)
    }

    async fn set_bug_report_analysis(
        &self,
        id: DbId,
        analysis: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(report) = inner.reports.get_mut(&id) {
            report.ai_analysis = Some(analysis.clone());
            report.updated_at = Utc::now();
        }
        Ok(())
    }

    // -- Analytics ---------------------------------------------------------

    async fn record_event(
        &self,
        project_id: DbId,
        event_type: &str,
        event_data: serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.next_event_id += 1;
        let event = AnalyticsEvent {
            id: inner.next_event_id,
            project_id,
            event_type: event_type.to_string(),
            event_data: Some(event_data),
            created_at: Utc::now(),
        };
        inner.events.push(event);
        Ok(())
    }

    async fn count_reports(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<i64, StoreError> {
        Ok(self.lock().user_reports(user_id, project_id).len() as i64)
    }

    async fn count_reports_by_status(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<Vec<StatusCount>, StoreError> {
        let inner = self.lock();
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for report in inner.user_reports(user_id, project_id) {
            *counts.entry(report.status.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn count_reports_by_severity(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
    ) -> Result<Vec<SeverityCount>, StoreError> {
        let inner = self.lock();
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for report in inner.user_reports(user_id, project_id) {
            *counts.entry(report.severity.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(severity, count)| SeverityCount { severity, count })
            .collect())
    }

    async fn count_reports_by_day(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
        days: i64,
    ) -> Result<Vec<DailyCount>, StoreError> {
        let inner = self.lock();
        let cutoff = Utc::now() - chrono::Duration::days(days);
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for report in inner.user_reports(user_id, project_id) {
            if report.created_at >= cutoff {
                let date = report.created_at.format("%Y-%m-%d").to_string();
                *counts.entry(date).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect())
    }

    async fn recent_reports(
        &self,
        user_id: DbId,
        project_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<BugReportListItem>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .user_reports(user_id, project_id)
            .into_iter()
            .take(limit as usize)
            .map(|r| inner.to_list_item(r))
            .collect())
    }
}
