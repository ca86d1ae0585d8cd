//! Weighted credibility scoring
//!
//! `overall = Σ w·c / Σ w` over every detector in the weight table. A
//! detector that produced no evidence contributes zero confidence but keeps
//! its weight in the denominator, so missing signals always cost points.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::{Evidence, EvidenceSet, Weights, MAX_CONFIDENCE, MIN_CONFIDENCE};

/// Final score with its per-detector breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredibilityScore {
    pub overall: f64,
    pub breakdown: BTreeMap<String, Evidence>,
    pub weights: BTreeMap<String, f64>,
    pub missing: Vec<String>,
}

impl CredibilityScore {
    /// Confidence recorded for a detector, zero when absent
    pub fn confidence(&self, detector_id: &str) -> f64 {
        self.breakdown
            .get(detector_id)
            .map(Evidence::confidence)
            .unwrap_or(MIN_CONFIDENCE)
    }

    pub fn is_missing(&self, detector_id: &str) -> bool {
        self.missing.iter().any(|id| id == detector_id)
    }
}

/// Combines evidence into a score using a weight table
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: Weights,
}

impl Scorer {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn score(&self, evidence: &EvidenceSet) -> CredibilityScore {
        score(evidence, &self.weights)
    }
}

/// Score an evidence set against a weight table
pub fn score(evidence: &EvidenceSet, weights: &Weights) -> CredibilityScore {
    let mut weighted = 0.0;
    let mut missing = Vec::new();

    for (id, weight) in weights.iter() {
        match evidence.get(id) {
            Some(e) => weighted += weight * e.confidence(),
            None => missing.push(id.to_string()),
        }
    }

    let total = weights.total();
    let overall = if total > 0.0 {
        (weighted / total).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    } else {
        MIN_CONFIDENCE
    };

    CredibilityScore {
        overall,
        breakdown: evidence
            .iter()
            .map(|e| (e.detector_id().to_string(), e.clone()))
            .collect(),
        weights: weights.iter().map(|(id, w)| (id.to_string(), w)).collect(),
        missing,
    }
}
