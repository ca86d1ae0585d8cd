//! E1: author attribution
//!
//! Looks for a named author in JSON-LD, then in meta tags, then for a
//! locale byline phrase in the visible text. A byline inside a reviewer
//! statement ("reviewed by ...", "geprüft von ...") names the reviewer, not
//! the author, and is ignored.

use eeat_core::{
    property_text, type_names, Evidence, EvidenceReason, PatternRegistry, PhraseKind,
    PhraseMatch,
};
use std::sync::Arc;
use tracing::debug;

use crate::{Detector, DetectorError, Subject, SubjectKind};

pub const AUTHOR_DETECTOR_ID: &str = "E1";

const JSON_LD_CONFIDENCE: f64 = 0.9;
const META_CONFIDENCE: f64 = 0.7;
const BYLINE_CONFIDENCE: f64 = 0.6;

/// Meta tags naming an author, in priority order
const AUTHOR_META_KEYS: &[&str] = &["author", "article:author", "dc.creator", "dcterms.creator"];

/// Author attribution detector
pub struct AuthorDetector {
    patterns: Arc<PatternRegistry>,
}

impl AuthorDetector {
    pub fn new(patterns: Arc<PatternRegistry>) -> Self {
        Self { patterns }
    }

    /// Earliest byline that is not part of a reviewer statement
    fn byline(&self, text: &str) -> Option<PhraseMatch> {
        let reviewer = self.patterns.find_all(PhraseKind::Reviewer, text);
        self.patterns
            .find_all(PhraseKind::Byline, text)
            .into_iter()
            .find(|byline| !reviewer.iter().any(|r| r.overlaps(byline)))
    }
}

impl Detector for AuthorDetector {
    fn id(&self) -> &str {
        AUTHOR_DETECTOR_ID
    }

    fn name(&self) -> &str {
        "author attribution"
    }

    fn subject_kind(&self) -> SubjectKind {
        SubjectKind::Page
    }

    fn detect(&self, subject: Subject<'_>) -> Result<Evidence, DetectorError> {
        let page = subject.page(self.id())?;

        let from_json_ld = page.json_ld_objects().into_iter().find_map(|object| {
            property_text(object, "author").map(|name| (name, type_names(object).join(",")))
        });
        if let Some((name, schema_type)) = from_json_ld {
            debug!("Author from JSON-LD on {}: {}", page.url(), name);
            return Ok(Evidence::matched(self.id(), JSON_LD_CONFIDENCE)
                .with_raw_match(&name)
                .with_meta("source", "jsonLd")
                .with_meta("schemaType", schema_type));
        }

        if let Some((key, name)) = AUTHOR_META_KEYS
            .iter()
            .find_map(|key| page.meta(key).map(|name| (*key, name)))
        {
            return Ok(Evidence::matched(self.id(), META_CONFIDENCE)
                .with_raw_match(name)
                .with_meta("source", "meta")
                .with_meta("key", key));
        }

        if let Some(byline) = self.byline(page.visible_text()) {
            return Ok(Evidence::matched(self.id(), BYLINE_CONFIDENCE)
                .with_raw_match(&byline.text)
                .with_meta("source", "byline")
                .with_meta("locale", byline.locale)
                .with_meta("pattern", byline.pattern));
        }

        Ok(Evidence::unmatched(self.id(), EvidenceReason::NoMatch))
    }
}
