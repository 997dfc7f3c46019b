//! Bug report severity, status constants, and validation helpers.
//!
//! Defines the severity scale shared by the widget and the API, the
//! dashboard status vocabulary, and the field validation used by both the
//! submission endpoint and the widget's pre-flight checks.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of a reported bug, as chosen by the reporting user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Initial status for a newly submitted bug report.
pub const STATUS_OPEN: &str = "open";
/// A developer is actively working on the report.
pub const STATUS_IN_PROGRESS: &str = "in-progress";
/// The underlying issue has been fixed.
pub const STATUS_RESOLVED: &str = "resolved";
/// The report has been closed (resolved and verified, or won't-fix).
pub const STATUS_CLOSED: &str = "closed";

/// All valid dashboard-side bug report statuses.
///
/// Widget fallback records carry their own single ad hoc `"pending"` marker;
/// that vocabulary never enters this one.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_OPEN,
    STATUS_IN_PROGRESS,
    STATUS_RESOLVED,
    STATUS_CLOSED,
];

/// Validate that a status string is one of the known statuses.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid bug report status '{}'. Must be one of: {:?}",
            status, VALID_STATUSES
        )))
    }
}

// ---------------------------------------------------------------------------
// Validation constants
// ---------------------------------------------------------------------------

/// Maximum length for the user-provided title field (characters).
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum length for the user-provided description field (characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum decoded size of a data-URL screenshot (bytes).
pub const MAX_SCREENSHOT_BYTES: usize = 1024 * 1024;

/// Validate the title: required, non-blank after trimming, bounded length.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Title is required".into()));
    }
    if trimmed.len() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title must be less than {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate the description: required, non-blank after trimming, bounded length.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Description is required".into()));
    }
    if trimmed.len() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description must be less than {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Estimate the decoded byte size of a base64 data-URL payload.
pub fn estimated_base64_bytes(encoded: &str) -> usize {
    encoded.len() * 3 / 4
}

/// Validate that a screenshot data URL stays within the size budget.
pub fn validate_screenshot(screenshot: &str) -> Result<(), CoreError> {
    if estimated_base64_bytes(screenshot) > MAX_SCREENSHOT_BYTES {
        return Err(CoreError::Validation(
            "Screenshot size exceeds 1MB limit".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        let parsed: Severity = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(parsed, Severity::High);
    }

    #[test]
    fn severity_defaults_to_medium() {
        assert_eq!(Severity::default(), Severity::Medium);
    }

    #[test]
    fn all_statuses_are_valid() {
        for s in VALID_STATUSES {
            assert!(validate_status(s).is_ok(), "Status '{s}' should be valid");
        }
    }

    #[test]
    fn unknown_status_is_invalid() {
        assert!(validate_status("pending").is_err());
        assert!(validate_status("triaged").is_err());
        assert!(validate_status("").is_err());
    }

    #[test]
    fn blank_title_is_invalid() {
        assert!(validate_title("").is_err());
        assert!(validate_title("   \t  ").is_err());
        assert!(validate_title("Login button broken").is_ok());
    }

    #[test]
    fn overlong_title_is_invalid() {
        let title = "a".repeat(MAX_TITLE_LENGTH + 1);
        assert!(validate_title(&title).is_err());
        assert!(validate_title(&"a".repeat(MAX_TITLE_LENGTH)).is_ok());
    }

    #[test]
    fn blank_description_is_invalid() {
        assert!(validate_description("  ").is_err());
        assert!(validate_description("Clicking login does nothing").is_ok());
    }

    #[test]
    fn overlong_description_is_invalid() {
        let desc = "a".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert!(validate_description(&desc).is_err());
    }

    #[test]
    fn screenshot_size_budget() {
        // ~768 KiB decoded -- fine.
        let small = "A".repeat(1024 * 1024);
        assert!(validate_screenshot(&small).is_ok());

        // ~1.5 MiB decoded -- rejected.
        let big = "A".repeat(2 * 1024 * 1024);
        assert!(validate_screenshot(&big).is_err());
    }
}
