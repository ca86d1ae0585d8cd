//! Analysis reports
//!
//! Every per-item failure is visible in these structures; nothing is
//! silently dropped.

use chrono::{DateTime, Utc};
use eeat_core::{BlogInsights, CredibilityScore, EvidenceSet};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of analyzing one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PageStatus {
    Analyzed,
    Skipped,
}

/// Result for a single URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub url: String,
    pub status: PageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<CredibilityScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageReport {
    pub fn skipped(url: &str, error: &str) -> Self {
        Self {
            url: url.to_string(),
            status: PageStatus::Skipped,
            title: None,
            published_at: None,
            modified_at: None,
            score: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_analyzed(&self) -> bool {
        self.status == PageStatus::Analyzed
    }
}

/// Result for a list of URLs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub analyzed: usize,
    pub skipped: usize,
    /// One report per input URL, in input order
    pub reports: Vec<PageReport>,
}

/// Result for a blog
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogReport {
    pub root: String,
    pub insights: BlogInsights,
    pub evidence: EvidenceSet,
    pub score: CredibilityScore,
}

/// Result for a site: its landing page plus its blog
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteReport {
    pub url: String,
    pub page: PageReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog: Option<BlogReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_error: Option<String>,
    /// Score over page and blog evidence together
    pub score: CredibilityScore,
}
