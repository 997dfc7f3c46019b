//! Heuristic triage analysis for submitted bug reports.
//!
//! Keyword matching over the report text produces a coarse classification
//! (affected area, category), an effort estimate, and a confidence score.
//! The function is pure and synchronous; the API layer runs it as a
//! detached background task after the submission response and writes the
//! result back to the report row. Callers are shaped so this can later be
//! swapped for a real model call without touching them.

use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentData;
use crate::report::Severity;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Part of the stack the issue most likely lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Frontend,
    Backend,
    Fullstack,
}

impl Area {
    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Frontend => "frontend",
            Area::Backend => "backend",
            Area::Fullstack => "fullstack",
        }
    }
}

/// Coarse functional category of the issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Api,
    Auth,
    Ui,
    Performance,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Api => "api",
            Category::Auth => "auth",
            Category::Ui => "ui",
            Category::Performance => "performance",
            Category::Other => "other",
        }
    }
}

/// Triage analysis attached to a bug report. Serialized camelCase into the
/// report's `ai_analysis` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugAnalysis {
    pub area: Area,
    pub category: Category,
    pub estimated_hours: u32,
    pub confidence: f64,
    pub summary: String,
}

/// Input to [`analyze_report`]. Borrowed from the submitted report.
#[derive(Debug)]
pub struct AnalysisInput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub severity: Severity,
    pub environment: Option<&'a EnvironmentData>,
    pub steps: &'a [String],
    pub tags: &'a [String],
}

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

const CONFIDENCE_BASE: f64 = 0.6;
const CONFIDENCE_MIN: f64 = 0.5;
const CONFIDENCE_MAX: f64 = 0.95;

/// Classify a bug report from its text and severity.
pub fn analyze_report(input: &AnalysisInput<'_>) -> BugAnalysis {
    let text = format!(
        "{}\n{}\n{}\n{}",
        input.title,
        input.description,
        input.steps.join("\n"),
        input.tags.join(" ")
    )
    .to_lowercase();

    let contains = |needle: &str| text.contains(needle);

    let category = if contains("auth")
        || contains("login")
        || contains("signup")
        || contains("password")
    {
        Category::Auth
    } else if contains("api")
        || contains("request")
        || contains("fetch")
        || contains("network")
        || contains("graphql")
    {
        Category::Api
    } else if contains("layout")
        || contains("css")
        || contains("style")
        || contains("responsive")
        || contains("ux")
    {
        Category::Ui
    } else if contains("slow") || contains("timeout") || contains("performance") || contains("lag")
    {
        Category::Performance
    } else {
        Category::Other
    };

    let area = if contains("500")
        || contains("internal server error")
        || contains("database")
        || contains("db")
    {
        Area::Backend
    } else if contains("api") || contains("network") || contains("server") {
        Area::Fullstack
    } else {
        Area::Frontend
    };

    let estimated_hours = match input.severity {
        Severity::Low => 1,
        Severity::Medium => 2,
        Severity::High => 4,
        Severity::Critical => 8,
    };

    let mut confidence = CONFIDENCE_BASE;
    if category != Category::Other {
        confidence += 0.15;
    }
    if area == Area::Fullstack {
        confidence -= 0.05;
    }
    let confidence = confidence.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX);

    let browser = input
        .environment
        .map(|env| env.user_agent.as_str())
        .filter(|ua| !ua.is_empty())
        .unwrap_or("unknown");
    let os = input
        .environment
        .map(|env| env.platform.as_str())
        .filter(|p| !p.is_empty())
        .unwrap_or("unknown");

    let summary = format!(
        "{} issue likely in {} | category: {} | env: {} on {}",
        input.severity.as_str().to_uppercase(),
        area.as_str(),
        category.as_str(),
        browser,
        os,
    );

    BugAnalysis {
        area,
        category,
        estimated_hours,
        confidence,
        summary,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(title: &'a str, description: &'a str, severity: Severity) -> AnalysisInput<'a> {
        AnalysisInput {
            title,
            description,
            severity,
            environment: None,
            steps: &[],
            tags: &[],
        }
    }

    #[test]
    fn login_issue_categorized_as_auth() {
        let result = analyze_report(&input(
            "Cannot login",
            "Pressing the login button shows a spinner forever",
            Severity::High,
        ));
        assert_eq!(result.category, Category::Auth);
        assert_eq!(result.estimated_hours, 4);
    }

    #[test]
    fn css_issue_categorized_as_ui_frontend() {
        let result = analyze_report(&input(
            "Broken layout on mobile",
            "The sidebar css overlaps the content",
            Severity::Low,
        ));
        assert_eq!(result.category, Category::Ui);
        assert_eq!(result.area, Area::Frontend);
        assert_eq!(result.estimated_hours, 1);
    }

    #[test]
    fn server_error_flagged_backend() {
        let result = analyze_report(&input(
            "Save fails",
            "Saving returns 500 internal server error",
            Severity::Critical,
        ));
        assert_eq!(result.area, Area::Backend);
        assert_eq!(result.estimated_hours, 8);
    }

    #[test]
    fn network_text_flagged_fullstack_with_lower_confidence() {
        let result = analyze_report(&input(
            "Requests fail",
            "The api request times out on the settings page",
            Severity::Medium,
        ));
        assert_eq!(result.area, Area::Fullstack);
        // Categorized (+0.15) but fullstack (-0.05).
        assert!((result.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn uncategorized_report_keeps_base_confidence() {
        let result = analyze_report(&input(
            "Something odd",
            "It feels wrong sometimes",
            Severity::Medium,
        ));
        assert_eq!(result.category, Category::Other);
        assert!((result.confidence - CONFIDENCE_BASE).abs() < 1e-9);
    }

    #[test]
    fn confidence_stays_in_bounds() {
        let result = analyze_report(&input("auth", "login password signup", Severity::Low));
        assert!(result.confidence >= CONFIDENCE_MIN && result.confidence <= CONFIDENCE_MAX);
    }

    #[test]
    fn summary_names_environment() {
        let env = EnvironmentData {
            user_agent: "Firefox".into(),
            url: "https://example.com".into(),
            referrer: "Direct".into(),
            viewport: "800x600".into(),
            screen: "1920x1080".into(),
            timestamp: "2026-01-01T00:00:00Z".into(),
            language: "en".into(),
            platform: "linux".into(),
        };
        let result = analyze_report(&AnalysisInput {
            title: "Slow dashboard",
            description: "Loading lags badly",
            severity: Severity::Medium,
            environment: Some(&env),
            steps: &[],
            tags: &[],
        });
        assert!(result.summary.contains("Firefox on linux"));
        assert!(result.summary.starts_with("MEDIUM issue"));
    }

    #[test]
    fn steps_and_tags_feed_classification() {
        let steps = vec!["Open the page".to_string(), "Watch the fetch fail".to_string()];
        let result = analyze_report(&AnalysisInput {
            title: "Blank page",
            description: "Nothing renders",
            severity: Severity::Medium,
            environment: None,
            steps: &steps,
            tags: &[],
        });
        assert_eq!(result.category, Category::Api);
    }
}
