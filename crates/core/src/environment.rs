//! Environment snapshot captured alongside every bug report.
//!
//! This is the wire shape shared by the widget (which produces it) and the
//! API (which stores it verbatim in the report's `environment` column).

use serde::{Deserialize, Serialize};

/// Sentinel used when the reporting page has no referrer.
pub const REFERRER_DIRECT: &str = "Direct";

/// Sentinel for environment facts the host could not supply.
pub const UNKNOWN: &str = "unknown";

/// A point-in-time snapshot of the reporting environment.
///
/// Captured once at submission time and never updated afterwards. Field
/// names are camelCase on the wire to match the widget protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentData {
    pub user_agent: String,
    pub url: String,
    pub referrer: String,
    /// Viewport size as `"WxH"`.
    pub viewport: String,
    /// Screen size as `"WxH"`.
    pub screen: String,
    /// ISO-8601 capture timestamp.
    pub timestamp: String,
    pub language: String,
    pub platform: String,
}
