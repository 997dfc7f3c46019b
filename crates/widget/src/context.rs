//! Page-session context collection.
//!
//! A [`ContextCollector`] is constructed once per page session and passed
//! explicitly to whatever assembles a report; there is no ambient global
//! state. Static page facts are supplied by the host at construction;
//! errors, network timings, and performance metrics arrive through passive
//! intake methods and are held in bounded buffers.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use bugspot_core::environment::{EnvironmentData, REFERRER_DIRECT, UNKNOWN};

/// Fixed capacity of the network request ring buffer.
pub const NETWORK_LOG_CAPACITY: usize = 10;

/// Maximum number of retained runtime errors.
pub const ERROR_LOG_CAPACITY: usize = 50;

/// Current time as an ISO-8601 string with millisecond precision.
pub(crate) fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Observed runtime data
// ---------------------------------------------------------------------------

/// A runtime error observed on the page (unhandled error or rejection).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colno: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub timestamp: String,
}

impl ErrorInfo {
    /// A bare error with just a message, stamped now.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            filename: None,
            lineno: None,
            colno: None,
            stack: None,
            timestamp: iso_now(),
        }
    }
}

/// A network resource timing observed on the page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    pub url: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    pub timestamp: String,
}

/// Heap usage, when the host can measure it.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub limit_bytes: u64,
}

/// Load/paint timing metrics. Every field is best-effort; unavailable
/// sub-metrics are simply omitted.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_content_loaded_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_paint_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_contentful_paint_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryUsage>,
}

/// Focus and scroll state at collection time, supplied by the host.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_element: Option<String>,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

// ---------------------------------------------------------------------------
// Page facts
// ---------------------------------------------------------------------------

/// Static facts about the reporting page, known at collector construction.
#[derive(Debug, Clone)]
pub struct PageFacts {
    pub user_agent: String,
    pub url: String,
    pub referrer: Option<String>,
    /// Viewport size in pixels (width, height).
    pub viewport: (u32, u32),
    /// Screen size in pixels (width, height).
    pub screen: (u32, u32),
    pub language: Option<String>,
    pub platform: Option<String>,
}

impl PageFacts {
    /// Facts for the given page URL, with everything derivable from the
    /// process filled in (platform, language) and the rest left to the
    /// host to overwrite.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            user_agent: format!("bugspot-widget/{}", env!("CARGO_PKG_VERSION")),
            url: url.into(),
            referrer: None,
            viewport: (0, 0),
            screen: (0, 0),
            language: std::env::var("LANG").ok().filter(|l| !l.is_empty()),
            platform: Some(std::env::consts::OS.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Everything [`ContextCollector::collect_runtime_context`] returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeContext {
    pub environment: EnvironmentData,
    pub errors: Vec<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_state: Option<DomState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
    pub network: Vec<NetworkRequest>,
}

/// One collector instance per page session.
pub struct ContextCollector {
    facts: PageFacts,
    errors: Mutex<VecDeque<ErrorInfo>>,
    requests: Mutex<VecDeque<NetworkRequest>>,
    performance: Mutex<Option<PerformanceMetrics>>,
    dom_state: Mutex<Option<DomState>>,
}

impl ContextCollector {
    pub fn new(facts: PageFacts) -> Self {
        Self {
            facts,
            errors: Mutex::new(VecDeque::with_capacity(ERROR_LOG_CAPACITY)),
            requests: Mutex::new(VecDeque::with_capacity(NETWORK_LOG_CAPACITY)),
            performance: Mutex::new(None),
            dom_state: Mutex::new(None),
        }
    }

    pub fn page(&self) -> &PageFacts {
        &self.facts
    }

    /// Record an observed runtime error. Oldest entries are dropped once
    /// the buffer is full.
    pub fn record_error(&self, error: ErrorInfo) {
        let mut errors = self.errors.lock().unwrap_or_else(|e| e.into_inner());
        if errors.len() == ERROR_LOG_CAPACITY {
            errors.pop_front();
        }
        errors.push_back(error);
    }

    /// Record an observed network request. Only the most recent
    /// [`NETWORK_LOG_CAPACITY`] entries are retained.
    pub fn record_request(&self, request: NetworkRequest) {
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        if requests.len() == NETWORK_LOG_CAPACITY {
            requests.pop_front();
        }
        requests.push_back(request);
    }

    /// Supply load/paint timing metrics measured by the host.
    pub fn set_performance(&self, metrics: PerformanceMetrics) {
        *self.performance.lock().unwrap_or_else(|e| e.into_inner()) = Some(metrics);
    }

    /// Supply the current focus/scroll state measured by the host.
    pub fn set_dom_state(&self, state: DomState) {
        *self.dom_state.lock().unwrap_or_else(|e| e.into_inner()) = Some(state);
    }

    /// Snapshot the environment facts. Static fields are identical across
    /// calls within one page session; only the timestamp differs.
    pub fn collect_environment(&self) -> EnvironmentData {
        let facts = &self.facts;
        EnvironmentData {
            user_agent: facts.user_agent.clone(),
            url: facts.url.clone(),
            referrer: facts
                .referrer
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| REFERRER_DIRECT.to_string()),
            viewport: format!("{}x{}", facts.viewport.0, facts.viewport.1),
            screen: format!("{}x{}", facts.screen.0, facts.screen.1),
            timestamp: iso_now(),
            language: facts.language.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            platform: facts.platform.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    /// Best-effort enriched snapshot: environment plus observed errors,
    /// host-supplied DOM and performance state, and the last ten network
    /// timings.
    pub fn collect_runtime_context(&self) -> RuntimeContext {
        RuntimeContext {
            environment: self.collect_environment(),
            errors: self
                .errors
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .cloned()
                .collect(),
            dom_state: self.dom_state.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            performance: *self.performance.lock().unwrap_or_else(|e| e.into_inner()),
            network: self
                .requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .cloned()
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> PageFacts {
        PageFacts {
            user_agent: "test-agent/1.0".into(),
            url: "https://app.example.com/checkout".into(),
            referrer: Some("https://example.com".into()),
            viewport: (1280, 720),
            screen: (1920, 1080),
            language: Some("en-US".into()),
            platform: Some("linux".into()),
        }
    }

    #[test]
    fn environment_static_fields_are_idempotent() {
        let collector = ContextCollector::new(facts());

        let first = collector.collect_environment();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = collector.collect_environment();

        assert_eq!(first.user_agent, second.user_agent);
        assert_eq!(first.url, second.url);
        assert_eq!(first.referrer, second.referrer);
        assert_eq!(first.viewport, second.viewport);
        assert_eq!(first.screen, second.screen);
        assert_eq!(first.language, second.language);
        assert_eq!(first.platform, second.platform);
        assert_ne!(first.timestamp, second.timestamp);
    }

    #[test]
    fn missing_referrer_becomes_direct_sentinel() {
        let mut f = facts();
        f.referrer = None;
        let collector = ContextCollector::new(f);
        assert_eq!(collector.collect_environment().referrer, "Direct");

        let mut f = facts();
        f.referrer = Some(String::new());
        let collector = ContextCollector::new(f);
        assert_eq!(collector.collect_environment().referrer, "Direct");
    }

    #[test]
    fn viewport_and_screen_formatted_as_dimensions() {
        let collector = ContextCollector::new(facts());
        let env = collector.collect_environment();
        assert_eq!(env.viewport, "1280x720");
        assert_eq!(env.screen, "1920x1080");
    }

    #[test]
    fn network_log_keeps_last_ten() {
        let collector = ContextCollector::new(facts());
        for i in 0..15 {
            collector.record_request(NetworkRequest {
                url: format!("https://api.example.com/resource/{i}"),
                method: "GET".into(),
                status: Some(200),
                duration_ms: Some(12.5),
                timestamp: iso_now(),
            });
        }

        let context = collector.collect_runtime_context();
        assert_eq!(context.network.len(), NETWORK_LOG_CAPACITY);
        // The five oldest entries were evicted.
        assert_eq!(context.network[0].url, "https://api.example.com/resource/5");
        assert_eq!(context.network[9].url, "https://api.example.com/resource/14");
    }

    #[test]
    fn error_log_is_bounded() {
        let collector = ContextCollector::new(facts());
        for i in 0..(ERROR_LOG_CAPACITY + 10) {
            collector.record_error(ErrorInfo::message(format!("error {i}")));
        }
        let context = collector.collect_runtime_context();
        assert_eq!(context.errors.len(), ERROR_LOG_CAPACITY);
        assert_eq!(context.errors[0].message, "error 10");
    }

    #[test]
    fn unavailable_submetrics_are_omitted() {
        let collector = ContextCollector::new(facts());
        collector.set_performance(PerformanceMetrics {
            load_time_ms: Some(420.0),
            ..Default::default()
        });

        let context = collector.collect_runtime_context();
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["performance"]["loadTimeMs"], 420.0);
        assert!(json["performance"].get("memory").is_none());
        assert!(json.get("domState").is_none());
    }
}
