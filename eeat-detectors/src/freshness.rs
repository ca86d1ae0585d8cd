//! E5: content freshness
//!
//! Confidence decays linearly from 1 (dated now) to 0 (`max_age_days` old).

use chrono::{DateTime, Duration, Utc};
use eeat_core::{Evidence, EvidenceReason};
use serde::{Deserialize, Serialize};

use crate::{Detector, DetectorError, Subject, SubjectKind};

pub const FRESHNESS_DETECTOR_ID: &str = "E5";

/// Dates further in the future than this are treated as bogus
const FUTURE_TOLERANCE_HOURS: i64 = 24;

/// Freshness tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Age at which confidence reaches zero
    pub max_age_days: i64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self { max_age_days: 730 }
    }
}

/// Freshness detector
#[derive(Debug, Clone, Default)]
pub struct FreshnessDetector {
    config: FreshnessConfig,
    reference: Option<DateTime<Utc>>,
}

impl FreshnessDetector {
    pub fn new(config: FreshnessConfig) -> Self {
        Self {
            config,
            reference: None,
        }
    }

    /// Measure age against a fixed instant instead of the current time
    pub fn at(mut self, reference: DateTime<Utc>) -> Self {
        self.reference = Some(reference);
        self
    }
}

impl Detector for FreshnessDetector {
    fn id(&self) -> &str {
        FRESHNESS_DETECTOR_ID
    }

    fn name(&self) -> &str {
        "freshness"
    }

    fn subject_kind(&self) -> SubjectKind {
        SubjectKind::Page
    }

    fn detect(&self, subject: Subject<'_>) -> Result<Evidence, DetectorError> {
        let page = subject.page(self.id())?;
        if self.config.max_age_days <= 0 {
            return Err(DetectorError::InvalidInput(format!(
                "max_age_days must be positive, got {}",
                self.config.max_age_days
            )));
        }

        let reference = self.reference.unwrap_or_else(Utc::now);
        let latest_allowed = reference + Duration::hours(FUTURE_TOLERANCE_HOURS);

        // Every candidate, so a future-dated key cannot hide a valid one
        let newest = page
            .modified_dates()
            .into_iter()
            .chain(page.published_dates())
            .filter(|d| d.at <= latest_allowed)
            .max_by_key(|d| d.at);

        let Some(date) = newest else {
            return Ok(Evidence::unmatched(self.id(), EvidenceReason::NoMatch));
        };

        let age_days = ((reference - date.at).num_seconds().max(0) as f64) / 86_400.0;
        let confidence = 1.0 - age_days / self.config.max_age_days as f64;
        let source = serde_json::to_value(&date.source).unwrap_or_default();

        if confidence <= 0.0 {
            return Ok(Evidence::unmatched(self.id(), EvidenceReason::Stale)
                .with_meta("date", date.at.to_rfc3339())
                .with_meta("ageDays", age_days.floor()));
        }

        Ok(Evidence::matched(self.id(), confidence)
            .with_raw_match(&date.raw)
            .with_meta("date", date.at.to_rfc3339())
            .with_meta("ageDays", age_days.floor())
            .with_meta("source", source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eeat_core::PageData;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn detect(page: &PageData) -> Evidence {
        FreshnessDetector::default()
            .at(reference())
            .detect(Subject::Page(page))
            .unwrap()
    }

    #[test]
    fn test_recent_modification_is_fresh() {
        let page = PageData::builder("https://example.com")
            .meta("article:published_time", "2020-01-01")
            .meta("article:modified_time", "2024-12-31")
            .build();

        let evidence = detect(&page);
        assert!(evidence.is_matched());
        assert!(evidence.confidence() > 0.99);
        assert_eq!(evidence.raw_match(), Some("2024-12-31"));
    }

    #[test]
    fn test_half_life() {
        // 365 days before the reference, with max age 730
        let page = PageData::builder("https://example.com")
            .meta("article:published_time", "2024-01-02")
            .build();

        let evidence = detect(&page);
        assert!((evidence.confidence() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stale_content() {
        let page = PageData::builder("https://example.com")
            .meta("article:published_time", "2015-06-01")
            .build();

        let evidence = detect(&page);
        assert!(!evidence.is_matched());
        assert_eq!(evidence.reason(), Some("stale"));
    }

    #[test]
    fn test_far_future_date_is_ignored() {
        let page = PageData::builder("https://example.com")
            .meta("article:modified_time", "2030-01-01")
            .meta("article:published_time", "2024-01-02")
            .build();

        let evidence = detect(&page);
        assert_eq!(evidence.raw_match(), Some("2024-01-02"));
    }

    #[test]
    fn test_future_modified_key_falls_back_to_later_key() {
        let page = PageData::builder("https://example.com")
            .meta("article:modified_time", "2030-01-01")
            .meta("last-modified", "Sun, 01 Dec 2024 00:00:00 GMT")
            .meta("article:published_time", "2020-01-01")
            .build();

        let evidence = detect(&page);
        assert!(evidence.is_matched());
        assert_eq!(evidence.raw_match(), Some("Sun, 01 Dec 2024 00:00:00 GMT"));
        assert_eq!(evidence.metadata()["ageDays"], 31.0);
    }

    #[test]
    fn test_undated_page() {
        let page = PageData::builder("https://example.com").build();
        assert_eq!(detect(&page).reason(), Some("noMatch"));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let page = PageData::builder("https://example.com").build();
        let result = FreshnessDetector::new(FreshnessConfig { max_age_days: 0 })
            .detect(Subject::Page(&page));
        assert!(matches!(result, Err(DetectorError::InvalidInput(_))));
    }
}
