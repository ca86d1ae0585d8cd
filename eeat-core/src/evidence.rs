//! Evidence emitted by detectors
//!
//! Evidence records are:
//! - Produced once per detector per subject
//! - Never mutated after a detector returns them
//! - Confidence-bearing, with `matched = false` forcing confidence to zero

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{MAX_CONFIDENCE, MIN_CONFIDENCE};

/// Why a detector did not match (or matched weakly)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EvidenceReason {
    /// Nothing in the subject matched
    NoMatch,
    /// Fewer dated posts than a frequency needs
    InsufficientSample,
    /// All dated posts share one instant
    ZeroSpan,
    /// A date was found but is too old to count
    Stale,
    /// The subject could not be fetched
    Skipped,
    /// The detector itself failed
    DetectorError,
}

impl EvidenceReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceReason::NoMatch => "noMatch",
            EvidenceReason::InsufficientSample => "insufficientSample",
            EvidenceReason::ZeroSpan => "zeroSpan",
            EvidenceReason::Stale => "stale",
            EvidenceReason::Skipped => "skipped",
            EvidenceReason::DetectorError => "detectorError",
        }
    }
}

/// Result of running one detector over one subject
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    detector_id: String,
    matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_match: Option<String>,
    confidence: f64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

impl Evidence {
    /// A positive result with the given confidence (clamped to [0, 1])
    pub fn matched(detector_id: &str, confidence: f64) -> Self {
        Self {
            detector_id: detector_id.to_string(),
            matched: true,
            raw_match: None,
            confidence: clamp_confidence(confidence),
            metadata: Map::new(),
        }
    }

    /// A negative result; confidence is always zero
    pub fn unmatched(detector_id: &str, reason: EvidenceReason) -> Self {
        Self {
            detector_id: detector_id.to_string(),
            matched: false,
            raw_match: None,
            confidence: MIN_CONFIDENCE,
            metadata: Map::new(),
        }
        .with_meta("reason", reason.as_str())
    }

    /// Placeholder for a detector whose subject could not be fetched
    pub fn skipped(detector_id: &str, error: &str) -> Self {
        Self::unmatched(detector_id, EvidenceReason::Skipped).with_meta("error", error)
    }

    /// Evidence for a detector that returned an error
    pub fn failed(detector_id: &str, error: &str) -> Self {
        Self::unmatched(detector_id, EvidenceReason::DetectorError).with_meta("error", error)
    }

    pub fn with_raw_match(mut self, raw: &str) -> Self {
        self.raw_match = Some(raw.to_string());
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn detector_id(&self) -> &str {
        &self.detector_id
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    pub fn raw_match(&self) -> Option<&str> {
        self.raw_match.as_deref()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// The `reason` metadata entry, if any
    pub fn reason(&self) -> Option<&str> {
        self.metadata.get("reason").and_then(Value::as_str)
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        MIN_CONFIDENCE
    } else {
        confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

/// Evidence keyed by detector id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EvidenceSet {
    items: BTreeMap<String, Evidence>,
}

impl EvidenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert evidence, returning any previous record for the same detector
    pub fn insert(&mut self, evidence: Evidence) -> Option<Evidence> {
        self.items.insert(evidence.detector_id.clone(), evidence)
    }

    /// Merge another set into this one; later records replace earlier ones
    pub fn merge(&mut self, other: EvidenceSet) {
        self.items.extend(other.items);
    }

    pub fn get(&self, detector_id: &str) -> Option<&Evidence> {
        self.items.get(detector_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Evidence> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count of matched records
    pub fn matched_count(&self) -> usize {
        self.items.values().filter(|e| e.matched).count()
    }

    pub fn into_map(self) -> BTreeMap<String, Evidence> {
        self.items
    }
}

impl FromIterator<Evidence> for EvidenceSet {
    fn from_iter<I: IntoIterator<Item = Evidence>>(iter: I) -> Self {
        let mut set = EvidenceSet::new();
        for evidence in iter {
            set.insert(evidence);
        }
        set
    }
}
