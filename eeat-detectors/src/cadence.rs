//! E6: blog publishing cadence

use eeat_core::{Evidence, EvidenceReason, SampleStatus};
use serde::{Deserialize, Serialize};

use crate::{Detector, DetectorError, Subject, SubjectKind};

pub const CADENCE_DETECTOR_ID: &str = "E6";

/// Cadence tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    /// Posts per month that earn full frequency credit
    pub target_posts_per_month: f64,
    /// Dated posts needed before the sample earns full credit
    pub full_sample: usize,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            target_posts_per_month: 4.0,
            full_sample: 6,
        }
    }
}

/// Publishing cadence detector
#[derive(Debug, Clone, Default)]
pub struct CadenceDetector {
    config: CadenceConfig,
}

impl CadenceDetector {
    pub fn new(config: CadenceConfig) -> Self {
        Self { config }
    }
}

/// `value / full`, capped at 1; a non-positive `full` gives full credit
fn ratio(value: f64, full: f64) -> f64 {
    if full <= 0.0 {
        1.0
    } else {
        (value / full).min(1.0)
    }
}

impl Detector for CadenceDetector {
    fn id(&self) -> &str {
        CADENCE_DETECTOR_ID
    }

    fn name(&self) -> &str {
        "blog cadence"
    }

    fn subject_kind(&self) -> SubjectKind {
        SubjectKind::Blog
    }

    fn detect(&self, subject: Subject<'_>) -> Result<Evidence, DetectorError> {
        let blog = subject.blog(self.id())?;
        let freq = blog.publishing_frequency();

        let evidence = match freq.sample {
            SampleStatus::InsufficientSample => {
                Evidence::unmatched(self.id(), EvidenceReason::InsufficientSample)
            }
            SampleStatus::ZeroSpan => Evidence::unmatched(self.id(), EvidenceReason::ZeroSpan),
            SampleStatus::Ok if freq.posts_per_month > 0.0 => {
                let confidence = ratio(freq.posts_per_month, self.config.target_posts_per_month)
                    * ratio(
                        freq.total_posts_with_dates as f64,
                        self.config.full_sample as f64,
                    );
                Evidence::matched(self.id(), confidence)
                    .with_raw_match(&format!("{:.2} posts/month", freq.posts_per_month))
            }
            SampleStatus::Ok => Evidence::unmatched(self.id(), EvidenceReason::NoMatch),
        };

        Ok(evidence
            .with_meta("postsPerMonth", freq.posts_per_month)
            .with_meta("spanMonths", freq.span_months)
            .with_meta("totalPostsWithDates", freq.total_posts_with_dates)
            .with_meta("totalPosts", freq.total_posts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use eeat_core::{aggregate, BlogPost, PageData};

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn post(i: usize, at: DateTime<Utc>) -> BlogPost {
        BlogPost::dated(&format!("https://example.com/blog/{i}"), at)
    }

    #[test]
    fn test_single_dated_post_is_insufficient() {
        let insights = aggregate(vec![post(0, utc(2010, 1, 1))]);
        let evidence = CadenceDetector::default()
            .detect(Subject::Blog(&insights))
            .unwrap();

        assert!(!evidence.is_matched());
        assert_eq!(evidence.confidence(), 0.0);
        assert_eq!(evidence.reason(), Some("insufficientSample"));
        assert_eq!(evidence.metadata()["postsPerMonth"], 0.0);
    }

    #[test]
    fn test_zero_span() {
        let insights = aggregate(vec![post(0, utc(2024, 5, 1)), post(1, utc(2024, 5, 1))]);
        let evidence = CadenceDetector::default()
            .detect(Subject::Blog(&insights))
            .unwrap();
        assert_eq!(evidence.reason(), Some("zeroSpan"));
    }

    #[test]
    fn test_two_posts_two_months_apart() {
        let insights = aggregate(vec![post(0, utc(2024, 1, 15)), post(1, utc(2024, 3, 15))]);
        let evidence = CadenceDetector::default()
            .detect(Subject::Blog(&insights))
            .unwrap();

        // 1 post/month of a 4 target, 2 of 6 dated posts
        assert!(evidence.is_matched());
        assert!((evidence.confidence() - 0.25 * (2.0 / 6.0)).abs() < 1e-9);
        assert_eq!(evidence.metadata()["postsPerMonth"], 1.0);
    }

    #[test]
    fn test_busy_blog_earns_full_credit() {
        let posts = (0..8).map(|i| post(i, utc(2024, 1, 1 + i as u32))).collect();
        let insights = aggregate(posts);
        let evidence = CadenceDetector::default()
            .detect(Subject::Blog(&insights))
            .unwrap();
        assert_eq!(evidence.confidence(), 1.0);
    }

    #[test]
    fn test_page_subject_is_rejected() {
        let page = PageData::builder("https://example.com").build();
        assert!(CadenceDetector::default().detect(Subject::Page(&page)).is_err());
    }
}
