//! The bug report submission use case.
//!
//! Pure orchestration: validate the caller's fields, enrich with the
//! collected environment, assemble the record, delegate to the sink. No
//! persistence of its own.

use std::sync::Arc;

use crate::context::ContextCollector;
use crate::report::{BugReport, NewBugReport};
use crate::sink::{ReportSink, SubmitError, SubmitResult};

pub struct CreateBugReport {
    sink: Arc<dyn ReportSink>,
    collector: Arc<ContextCollector>,
}

impl CreateBugReport {
    pub fn new(sink: Arc<dyn ReportSink>, collector: Arc<ContextCollector>) -> Self {
        Self { sink, collector }
    }

    /// Validate, assemble, and submit a report. The sink's result is
    /// returned to the caller unchanged.
    pub async fn execute(&self, input: NewBugReport) -> SubmitResult {
        if input.title.trim().is_empty() {
            return Err(SubmitError::Validation("Title is required".into()));
        }
        if input.description.trim().is_empty() {
            return Err(SubmitError::Validation("Description is required".into()));
        }

        let environment = self.collector.collect_environment();

        let report = BugReport {
            id: None,
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            severity: input.severity.unwrap_or_default(),
            screenshot: input.screenshot,
            user_email: input.user_email.map(|email| email.trim().to_string()),
            user_agent: environment.user_agent.clone(),
            url: environment.url.clone(),
            environment,
            steps: input.steps,
            tags: input.tags,
        };

        self.sink.submit(&report).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
