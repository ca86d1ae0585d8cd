//! Detector configuration

use serde::{Deserialize, Serialize};

use crate::{CadenceConfig, FreshnessConfig};

/// Ids of the built-in detectors, in registration order
pub const BUILTIN_DETECTORS: &[&str] = &["E1", "E2", "E3", "E4", "E5", "E6"];

/// Which detectors run and how they are tuned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Enabled detector ids
    pub enabled: Vec<String>,
    /// Locales whose phrase patterns are used; empty means all loaded locales
    pub locales: Vec<String>,
    pub freshness: FreshnessConfig,
    pub cadence: CadenceConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            enabled: BUILTIN_DETECTORS.iter().map(|id| id.to_string()).collect(),
            locales: Vec::new(),
            freshness: FreshnessConfig::default(),
            cadence: CadenceConfig::default(),
        }
    }
}

impl DetectorConfig {
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.iter().any(|e| e.eq_ignore_ascii_case(id))
    }

    pub fn with_enabled(mut self, ids: &[&str]) -> Self {
        self.enabled = ids.iter().map(|id| id.to_string()).collect();
        self
    }
}
