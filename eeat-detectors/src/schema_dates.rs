//! E4: schema.org dates
//!
//! Inspects every normalized JSON-LD object (array elements and `@graph`
//! members included) for `datePublished` and `dateModified`.

use eeat_core::{property_text, type_names, Evidence, EvidenceReason};
use serde_json::Value;

use crate::{Detector, DetectorError, Subject, SubjectKind};

pub const SCHEMA_DATES_DETECTOR_ID: &str = "E4";

const BOTH_DATES_CONFIDENCE: f64 = 1.0;
const ONE_DATE_CONFIDENCE: f64 = 0.75;

/// Schema date detector
#[derive(Debug, Default)]
pub struct SchemaDatesDetector;

impl SchemaDatesDetector {
    pub fn new() -> Self {
        Self
    }
}

struct DatedObject {
    schema_type: String,
    published: Option<String>,
    modified: Option<String>,
}

impl DatedObject {
    fn date_count(&self) -> usize {
        usize::from(self.published.is_some()) + usize::from(self.modified.is_some())
    }
}

impl Detector for SchemaDatesDetector {
    fn id(&self) -> &str {
        SCHEMA_DATES_DETECTOR_ID
    }

    fn name(&self) -> &str {
        "schema dates"
    }

    fn subject_kind(&self) -> SubjectKind {
        SubjectKind::Page
    }

    fn detect(&self, subject: Subject<'_>) -> Result<Evidence, DetectorError> {
        let page = subject.page(self.id())?;
        let objects = page.json_ld_objects();
        let inspected = objects.len();
        let parse_errors = page.json_ld_errors().len();

        // First object with both dates, else the first with either
        let mut best: Option<DatedObject> = None;
        for object in objects {
            let candidate = DatedObject {
                schema_type: type_names(object).join(","),
                published: property_text(object, "datePublished"),
                modified: property_text(object, "dateModified"),
            };
            let better = match &best {
                None => candidate.date_count() > 0,
                Some(current) => candidate.date_count() > current.date_count(),
            };
            if better {
                let complete = candidate.date_count() == 2;
                best = Some(candidate);
                if complete {
                    break;
                }
            }
        }

        let Some(found) = best else {
            return Ok(Evidence::unmatched(self.id(), EvidenceReason::NoMatch)
                .with_meta("objectsInspected", inspected)
                .with_meta("parseErrors", parse_errors));
        };

        let confidence = if found.date_count() == 2 {
            BOTH_DATES_CONFIDENCE
        } else {
            ONE_DATE_CONFIDENCE
        };
        let raw = found.modified.as_deref().or(found.published.as_deref()).unwrap_or_default();
        let to_value = |date: Option<String>| date.map(Value::String).unwrap_or(Value::Null);

        Ok(Evidence::matched(self.id(), confidence)
            .with_raw_match(raw)
            .with_meta("schemaType", found.schema_type.as_str())
            .with_meta("datePublished", to_value(found.published.clone()))
            .with_meta("dateModified", to_value(found.modified.clone()))
            .with_meta("objectsInspected", inspected)
            .with_meta("parseErrors", parse_errors))
    }
}
