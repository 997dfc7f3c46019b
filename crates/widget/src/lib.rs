//! Embeddable Bugspot client.
//!
//! The submission pipeline has four pieces, assembled by [`BugspotWidget`]
//! or individually by the host application:
//!
//! - [`context::ContextCollector`] -- one instance per page session;
//!   snapshots environment facts and accumulates recent errors and network
//!   timings through passive intake.
//! - [`screenshot::ScreenshotService`] -- wraps an external
//!   [`screenshot::Rasterizer`]; never fails, degrading to a generated
//!   placeholder image.
//! - [`submit::CreateBugReport`] -- validates input, enriches it with the
//!   collected context, and delegates to the sink.
//! - [`sink::ApiSink`] -- POSTs the report to the API with a bounded
//!   timeout, falling back to a local pending store on connectivity
//!   failure (and only then).

use std::path::PathBuf;
use std::sync::Arc;

pub mod context;
pub mod report;
pub mod screenshot;
pub mod sink;
pub mod submit;

use context::{ContextCollector, PageFacts};
use report::NewBugReport;
use screenshot::{Capture, Rasterizer, ScreenshotOptions, ScreenshotService};
use sink::{ApiSink, FallbackStore, SubmitResult};
use submit::CreateBugReport;

/// Default API endpoint for hosted Bugspot.
pub const DEFAULT_API_URL: &str = "https://api.bugspot.dev";

/// File name used for the local pending-report store.
pub const PENDING_REPORTS_FILE: &str = "bugspot_pending_reports.json";

/// Widget configuration supplied by the embedding application.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Project API key, sent as `X-API-Key` on submissions.
    pub api_key: String,
    pub api_url: String,
    pub enable_screenshot: bool,
    pub show_preview: bool,
    /// Where fallback records are written when the API is unreachable.
    pub storage_path: PathBuf,
}

impl WidgetConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            enable_screenshot: true,
            show_preview: true,
            storage_path: PathBuf::from(PENDING_REPORTS_FILE),
        }
    }
}

/// The assembled widget: presentation glue around the submission pipeline.
pub struct BugspotWidget {
    config: WidgetConfig,
    collector: Arc<ContextCollector>,
    screenshots: ScreenshotService,
    use_case: CreateBugReport,
}

impl BugspotWidget {
    /// Wire up the pipeline. The rasterizer is optional; without one,
    /// captures degrade to the placeholder image.
    pub fn new(
        config: WidgetConfig,
        page: PageFacts,
        rasterizer: Option<Arc<dyn Rasterizer>>,
    ) -> Self {
        let collector = Arc::new(ContextCollector::new(page));
        let screenshots = ScreenshotService::new(rasterizer, ScreenshotOptions::default());
        let sink = Arc::new(ApiSink::new(
            &config.api_url,
            &config.api_key,
            FallbackStore::new(&config.storage_path),
        ));
        let use_case = CreateBugReport::new(sink, Arc::clone(&collector));
        Self {
            config,
            collector,
            screenshots,
            use_case,
        }
    }

    /// The page-session collector, for hosts that feed it errors, network
    /// timings, or performance metrics.
    pub fn collector(&self) -> &ContextCollector {
        &self.collector
    }

    /// Capture a screenshot for the report form. Returns `None` when
    /// screenshots are disabled in the configuration; a capture itself
    /// never fails.
    pub fn capture_screenshot(&self) -> Option<Capture> {
        if !self.config.enable_screenshot {
            return None;
        }
        Some(self.screenshots.capture_with_preview(self.collector.page()))
    }

    /// Submit a report. Capture (if any) is expected to have completed
    /// before this is called; the two are never concurrent.
    pub async fn submit(&self, input: NewBugReport) -> SubmitResult {
        self.use_case.execute(input).await
    }
}
