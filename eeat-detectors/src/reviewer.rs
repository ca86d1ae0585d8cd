//! E2: reviewer statement
//!
//! Matches locale reviewer phrases ("medically reviewed by", "fachlich
//! geprüft von") in the visible text, corroborated by JSON-LD `reviewedBy`
//! or `lastReviewed` when present.

use eeat_core::{property_text, Evidence, EvidenceReason, PatternRegistry, PhraseKind, PhraseMatch};
use std::sync::Arc;

use crate::{Detector, DetectorError, Subject, SubjectKind};

pub const REVIEWER_DETECTOR_ID: &str = "E2";

const PHRASE_CONFIDENCE: f64 = 0.85;
const CORROBORATED_CONFIDENCE: f64 = 0.95;
const JSON_LD_ONLY_CONFIDENCE: f64 = 0.9;

const JSON_LD_REVIEW_KEYS: &[&str] = &["reviewedBy", "lastReviewed"];

/// Reviewer statement detector
pub struct ReviewerDetector {
    patterns: Arc<PatternRegistry>,
}

impl ReviewerDetector {
    pub fn new(patterns: Arc<PatternRegistry>) -> Self {
        Self { patterns }
    }
}

/// Drop matches that overlap an earlier one, so a single statement counts once
fn distinct_statements(matches: Vec<PhraseMatch>) -> Vec<PhraseMatch> {
    let mut distinct: Vec<PhraseMatch> = Vec::new();
    for m in matches {
        if distinct.last().map_or(true, |prev| m.start >= prev.end) {
            distinct.push(m);
        }
    }
    distinct
}

impl Detector for ReviewerDetector {
    fn id(&self) -> &str {
        REVIEWER_DETECTOR_ID
    }

    fn name(&self) -> &str {
        "reviewer statement"
    }

    fn subject_kind(&self) -> SubjectKind {
        SubjectKind::Page
    }

    fn detect(&self, subject: Subject<'_>) -> Result<Evidence, DetectorError> {
        let page = subject.page(self.id())?;

        let structured = page.json_ld_objects().into_iter().find_map(|object| {
            JSON_LD_REVIEW_KEYS
                .iter()
                .find_map(|key| property_text(object, key).map(|value| (*key, value)))
        });

        let statements =
            distinct_statements(self.patterns.find_all(PhraseKind::Reviewer, page.visible_text()));

        if let Some(first) = statements.first() {
            let confidence = if statements.len() > 1 || structured.is_some() {
                CORROBORATED_CONFIDENCE
            } else {
                PHRASE_CONFIDENCE
            };

            let mut evidence = Evidence::matched(self.id(), confidence)
                .with_raw_match(&first.text)
                .with_meta("source", "text")
                .with_meta("locale", first.locale.as_str())
                .with_meta("pattern", first.pattern.as_str())
                .with_meta("matchCount", statements.len());
            if let Some((key, value)) = structured {
                evidence = evidence.with_meta(key, value);
            }
            return Ok(evidence);
        }

        if let Some((key, value)) = structured {
            return Ok(Evidence::matched(self.id(), JSON_LD_ONLY_CONFIDENCE)
                .with_raw_match(&value)
                .with_meta("source", "jsonLd")
                .with_meta("property", key));
        }

        Ok(Evidence::unmatched(self.id(), EvidenceReason::NoMatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeat_core::PageData;
    use serde_json::json;

    fn detector() -> ReviewerDetector {
        ReviewerDetector::new(Arc::new(PatternRegistry::load_embedded()))
    }

    fn page_with_text(text: &str) -> PageData {
        PageData::builder("https://example.com").visible_text(text).build()
    }

    #[test]
    fn test_german_reviewer_with_umlaut() {
        let page = page_with_text("Medizinisch überprüft von Dr. Müller.");
        let evidence = detector().detect(Subject::Page(&page)).unwrap();

        assert!(evidence.is_matched());
        assert!(evidence.raw_match().unwrap().contains("überprüft von"));
        assert_eq!(evidence.metadata()["locale"], "de");
        assert_eq!(evidence.metadata()["matchCount"], 1);
        assert_eq!(evidence.confidence(), 0.85);
    }

    #[test]
    fn test_raw_match_keeps_original_case() {
        let page = page_with_text("Last updated May 2024. MEDICALLY REVIEWED BY Dr. Lee, MD.");
        let evidence = detector().detect(Subject::Page(&page)).unwrap();
        assert_eq!(evidence.raw_match(), Some("MEDICALLY REVIEWED BY"));
    }

    #[test]
    fn test_multiple_statements_raise_confidence() {
        let page = page_with_text("Reviewed by Dr. A. Also fact-checked by B. Team.");
        let evidence = detector().detect(Subject::Page(&page)).unwrap();

        assert_eq!(evidence.metadata()["matchCount"], 2);
        assert_eq!(evidence.confidence(), 0.95);
    }

    #[test]
    fn test_json_ld_only() {
        let page = PageData::builder("https://example.com")
            .json_ld_block(json!({
                "@type": "MedicalWebPage",
                "reviewedBy": {"@type": "Person", "name": "Dr. Schmidt"}
            }))
            .build();

        let evidence = detector().detect(Subject::Page(&page)).unwrap();
        assert_eq!(evidence.confidence(), 0.9);
        assert_eq!(evidence.raw_match(), Some("Dr. Schmidt"));
    }

    #[test]
    fn test_word_boundary_prevents_partial_match() {
        let page = page_with_text("Die Unterlagen wurden vorgeprüft von Amts wegen.");
        let evidence = detector().detect(Subject::Page(&page)).unwrap();
        assert!(!evidence.is_matched());
        assert_eq!(evidence.confidence(), 0.0);
    }

    #[test]
    fn test_blog_subject_is_rejected() {
        let insights = eeat_core::aggregate(Vec::new());
        let result = detector().detect(Subject::Blog(&insights));
        assert!(matches!(result, Err(DetectorError::WrongSubject { .. })));
    }
}
