//! E3: visible dates

use eeat_core::{parse_date, Evidence, EvidenceReason};

use crate::{Detector, DetectorError, Subject, SubjectKind};

pub const VISIBLE_DATES_DETECTOR_ID: &str = "E3";

const TIME_DATETIME_CONFIDENCE: f64 = 0.9;
const TIME_TEXT_CONFIDENCE: f64 = 0.6;
const META_ONLY_CONFIDENCE: f64 = 0.5;

/// Meta tags that carry a page date
const DATED_META_KEYS: &[&str] = &[
    "article:modified_time",
    "article:published_time",
    "dc.date",
    "last-modified",
];

/// Visible date detector
#[derive(Debug, Default)]
pub struct VisibleDatesDetector;

impl VisibleDatesDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for VisibleDatesDetector {
    fn id(&self) -> &str {
        VISIBLE_DATES_DETECTOR_ID
    }

    fn name(&self) -> &str {
        "visible dates"
    }

    fn subject_kind(&self) -> SubjectKind {
        SubjectKind::Page
    }

    fn detect(&self, subject: Subject<'_>) -> Result<Evidence, DetectorError> {
        let page = subject.page(self.id())?;
        let times = page.time_elements();

        let machine_readable = times
            .iter()
            .filter_map(|t| t.datetime.as_deref())
            .find(|raw| parse_date(raw).is_some());
        if let Some(raw) = machine_readable {
            return Ok(Evidence::matched(self.id(), TIME_DATETIME_CONFIDENCE)
                .with_raw_match(raw)
                .with_meta("source", "timeElement")
                .with_meta("timeElements", times.len()));
        }

        if let Some(time) = times.iter().find(|t| !t.text.is_empty()) {
            return Ok(Evidence::matched(self.id(), TIME_TEXT_CONFIDENCE)
                .with_raw_match(&time.text)
                .with_meta("source", "timeText")
                .with_meta("timeElements", times.len()));
        }

        let dated_meta = DATED_META_KEYS.iter().find_map(|key| {
            page.meta(key)
                .filter(|raw| parse_date(raw).is_some())
                .map(|raw| (*key, raw))
        });
        if let Some((key, raw)) = dated_meta {
            return Ok(Evidence::matched(self.id(), META_ONLY_CONFIDENCE)
                .with_raw_match(raw)
                .with_meta("source", "meta")
                .with_meta("key", key));
        }

        Ok(Evidence::unmatched(self.id(), EvidenceReason::NoMatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeat_core::PageData;

    #[test]
    fn test_time_with_datetime() {
        let page = PageData::builder("https://example.com")
            .time_element(None, "gestern")
            .time_element(Some("2024-04-02T08:00:00Z"), "2. April")
            .build();

        let evidence = VisibleDatesDetector::new().detect(Subject::Page(&page)).unwrap();
        assert_eq!(evidence.confidence(), 0.9);
        assert_eq!(evidence.raw_match(), Some("2024-04-02T08:00:00Z"));
    }

    #[test]
    fn test_time_text_only() {
        let page = PageData::builder("https://example.com")
            .time_element(Some("soon"), "Spring 2024")
            .build();

        let evidence = VisibleDatesDetector::new().detect(Subject::Page(&page)).unwrap();
        assert_eq!(evidence.confidence(), 0.6);
        assert_eq!(evidence.raw_match(), Some("Spring 2024"));
    }

    #[test]
    fn test_meta_only() {
        let page = PageData::builder("https://example.com")
            .meta("DC.date", "2023-09-01")
            .build();

        let evidence = VisibleDatesDetector::new().detect(Subject::Page(&page)).unwrap();
        assert_eq!(evidence.confidence(), 0.5);
        assert_eq!(evidence.metadata()["key"], "dc.date");
    }

    #[test]
    fn test_nothing_dated() {
        let page = PageData::builder("https://example.com")
            .meta("dc.date", "unknown")
            .build();

        let evidence = VisibleDatesDetector::new().detect(Subject::Page(&page)).unwrap();
        assert!(!evidence.is_matched());
    }
}
