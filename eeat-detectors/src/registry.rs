//! Ordered detector registry

use chrono::{DateTime, Utc};
use eeat_core::{Evidence, EvidenceSet, PatternRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    AuthorDetector, CadenceDetector, Detector, DetectorConfig, FreshnessDetector,
    ReviewerDetector, SchemaDatesDetector, Subject, SubjectKind, VisibleDatesDetector,
};

/// Registry of detectors, run in registration order
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the enabled built-in detectors
    pub fn with_defaults(config: &DetectorConfig, patterns: Arc<PatternRegistry>) -> Self {
        Self::build(config, patterns, None)
    }

    /// Like [`with_defaults`](Self::with_defaults), measuring freshness against `reference`
    pub fn with_defaults_at(
        config: &DetectorConfig,
        patterns: Arc<PatternRegistry>,
        reference: DateTime<Utc>,
    ) -> Self {
        Self::build(config, patterns, Some(reference))
    }

    fn build(
        config: &DetectorConfig,
        patterns: Arc<PatternRegistry>,
        reference: Option<DateTime<Utc>>,
    ) -> Self {
        let mut freshness = FreshnessDetector::new(config.freshness.clone());
        if let Some(reference) = reference {
            freshness = freshness.at(reference);
        }

        let builtins: Vec<Box<dyn Detector>> = vec![
            Box::new(AuthorDetector::new(Arc::clone(&patterns))),
            Box::new(ReviewerDetector::new(patterns)),
            Box::new(VisibleDatesDetector::new()),
            Box::new(SchemaDatesDetector::new()),
            Box::new(freshness),
            Box::new(CadenceDetector::new(config.cadence.clone())),
        ];

        let mut registry = Self::new();
        for detector in builtins {
            if config.is_enabled(detector.id()) {
                registry.register(detector);
            } else {
                debug!("Detector {} disabled", detector.id());
            }
        }
        registry
    }

    /// Register a detector, replacing any detector with the same id
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        match self.detectors.iter_mut().find(|d| d.id() == detector.id()) {
            Some(existing) => *existing = detector,
            None => self.detectors.push(detector),
        }
    }

    /// Detector ids, in order
    pub fn ids(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.id()).collect()
    }

    /// Ids of the detectors that inspect `kind`
    pub fn ids_for(&self, kind: SubjectKind) -> Vec<&str> {
        self.detectors
            .iter()
            .filter(|d| d.subject_kind() == kind)
            .map(|d| d.id())
            .collect()
    }

    /// Run every detector that accepts the subject.
    ///
    /// A detector error becomes unmatched evidence with reason
    /// `detectorError`; it never stops the other detectors.
    pub fn run(&self, subject: Subject<'_>) -> EvidenceSet {
        let mut evidence = EvidenceSet::new();

        for detector in self
            .detectors
            .iter()
            .filter(|d| d.subject_kind() == subject.kind())
        {
            match detector.detect(subject) {
                Ok(e) => {
                    debug!(
                        "{} matched={} confidence={:.2}",
                        detector.id(),
                        e.is_matched(),
                        e.confidence()
                    );
                    evidence.insert(e);
                }
                Err(e) => {
                    warn!("Detector {} failed: {}", detector.id(), e);
                    evidence.insert(Evidence::failed(detector.id(), &e.to_string()));
                }
            }
        }

        evidence
    }

    /// Skipped-evidence placeholders for every detector of `kind`
    pub fn skipped(&self, kind: SubjectKind, error: &str) -> EvidenceSet {
        self.ids_for(kind)
            .into_iter()
            .map(|id| Evidence::skipped(id, error))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}
