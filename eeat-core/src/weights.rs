//! Detector weight table
//!
//! Weights need not sum to one; the scorer normalizes by their total.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A built-in detector and its default weight
#[derive(Debug, Clone, Serialize)]
pub struct DetectorWeight {
    /// Detector id (`E1`..`E6`)
    pub id: &'static str,
    /// Short human-readable name
    pub name: &'static str,
    /// Default weight
    pub weight: f64,
}

/// Default weights for the built-in detectors
pub static DEFAULT_WEIGHTS: &[DetectorWeight] = &[
    DetectorWeight {
        id: "E1",
        name: "author attribution",
        weight: 1.0,
    },
    DetectorWeight {
        id: "E2",
        name: "reviewer statement",
        weight: 1.5,
    },
    DetectorWeight {
        id: "E3",
        name: "visible dates",
        weight: 0.75,
    },
    DetectorWeight {
        id: "E4",
        name: "schema dates",
        weight: 1.0,
    },
    DetectorWeight {
        id: "E5",
        name: "freshness",
        weight: 0.5,
    },
    DetectorWeight {
        id: "E6",
        name: "blog cadence",
        weight: 1.0,
    },
];

/// Look up a built-in detector by id
pub fn default_weight(id: &str) -> Option<&'static DetectorWeight> {
    DEFAULT_WEIGHTS.iter().find(|w| w.id == id)
}

/// Weight per detector id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights {
    table: BTreeMap<String, f64>,
}

impl Default for Weights {
    fn default() -> Self {
        DEFAULT_WEIGHTS.iter().map(|w| (w.id, w.weight)).collect()
    }
}

impl Weights {
    /// An empty table
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Set a weight; negative and non-finite values become zero
    pub fn set(&mut self, id: &str, weight: f64) {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self.table.insert(id.to_string(), weight);
    }

    pub fn with(mut self, id: &str, weight: f64) -> Self {
        self.set(id, weight);
        self
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.table.get(id).copied()
    }

    pub fn remove(&mut self, id: &str) -> Option<f64> {
        self.table.remove(id)
    }

    /// Apply overrides on top of this table
    pub fn merge(&mut self, overrides: &Weights) {
        for (id, weight) in overrides.iter() {
            self.set(id, weight);
        }
    }

    /// Keep only the listed detector ids
    pub fn retain(&mut self, ids: &[&str]) {
        self.table.retain(|id, _| ids.contains(&id.as_str()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.table.iter().map(|(id, w)| (id.as_str(), *w))
    }

    pub fn total(&self) -> f64 {
        self.table.values().sum()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for Weights {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut weights = Weights::empty();
        for (id, weight) in iter {
            weights.set(id, weight);
        }
        weights
    }
}
