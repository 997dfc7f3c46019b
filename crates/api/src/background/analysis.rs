//! Background triage analysis of submitted reports.
//!
//! Runs as an explicit detached task with its own error channel: failures
//! are logged and the report simply keeps `ai_analysis = NULL`. The
//! submission response never waits on, or fails because of, this task.

use std::sync::Arc;

use bugspot_core::analysis::{analyze_report, AnalysisInput};
use bugspot_core::environment::EnvironmentData;
use bugspot_core::types::DbId;
use bugspot_db::models::bug_report::CreateBugReport;
use bugspot_db::store::Datastore;

/// Analyze the submitted report and write the result back to its row.
pub fn spawn_analysis(
    store: Arc<dyn Datastore>,
    report_id: DbId,
    input: CreateBugReport,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let environment: Option<EnvironmentData> = input
            .environment
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok());

        let analysis = analyze_report(&AnalysisInput {
            title: &input.title,
            description: &input.description,
            severity: input.severity,
            environment: environment.as_ref(),
            steps: &input.steps,
            tags: &input.tags,
        });

        let value = match serde_json::to_value(&analysis) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(bug_report_id = report_id, error = %e, "Analysis serialization failed");
                return;
            }
        };

        match store.set_bug_report_analysis(report_id, &value).await {
            Ok(()) => {
                tracing::debug!(
                    bug_report_id = report_id,
                    area = analysis.area.as_str(),
                    category = analysis.category.as_str(),
                    "Triage analysis recorded",
                );
            }
            Err(e) => {
                tracing::error!(bug_report_id = report_id, error = %e, "Failed to store triage analysis");
            }
        }
    })
}
