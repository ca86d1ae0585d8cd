//! Analyzer configuration
//!
//! Every section is optional in the TOML file; missing values fall back to
//! the built-in defaults.
//!
//! ```toml
//! patterns_dir = "patterns"
//!
//! [fetch]
//! timeout_secs = 20
//! proxy = "socks5h://127.0.0.1:9050"
//!
//! [pipeline]
//! max_concurrent = 4
//!
//! [scoring.weights]
//! E2 = 2.0
//!
//! [detectors]
//! enabled = ["E1", "E2", "E4", "E6"]
//! ```

use eeat_core::{PatternError, PatternRegistry, Weights};
use eeat_detectors::DetectorConfig;
use eeat_web::{FetchConfig, DEFAULT_MAX_POSTS};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Patterns(#[from] PatternError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Pipeline tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fetches in flight at once
    pub max_concurrent: usize,
    /// Hard deadline per fetch, retries included
    pub fetch_deadline_ms: u64,
    /// Cap on posts discovered from a blog index
    pub max_posts: usize,
    /// Cache successful fetches for the lifetime of the analyzer
    pub cache: bool,
    /// Blog path tried by site analysis when no blog root is given
    pub default_blog_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            fetch_deadline_ms: 60_000,
            max_posts: DEFAULT_MAX_POSTS,
            cache: true,
            default_blog_path: "/blog/".to_string(),
        }
    }
}

/// Scoring configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Detector weights; entries in the file override the defaults
    #[serde(deserialize_with = "merge_with_default_weights")]
    pub weights: Weights,
}

fn merge_with_default_weights<'de, D: Deserializer<'de>>(d: D) -> Result<Weights, D::Error> {
    let overrides = Weights::deserialize(d)?;
    let mut weights = Weights::default();
    weights.merge(&overrides);
    Ok(weights)
}

/// Full analyzer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub fetch: FetchConfig,
    pub pipeline: PipelineConfig,
    pub scoring: ScoringConfig,
    pub detectors: DetectorConfig,
    /// Extra locale pattern files, merged over the embedded ones
    pub patterns_dir: Option<PathBuf>,
}

impl AnalyzerConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.pipeline.fetch_deadline_ms == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.fetch_deadline_ms must be positive".to_string(),
            ));
        }
        if self.detectors.freshness.max_age_days <= 0 {
            return Err(ConfigError::Invalid(
                "detectors.freshness.max_age_days must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Embedded patterns, extended by `patterns_dir` and filtered by `detectors.locales`
    pub fn pattern_registry(&self) -> Result<PatternRegistry, ConfigError> {
        let mut registry = PatternRegistry::load_embedded();
        if let Some(dir) = &self.patterns_dir {
            let read = registry.merge_dir(dir)?;
            info!("Loaded {} pattern files from {}", read, dir.display());
        }
        if !self.detectors.locales.is_empty() {
            registry.retain_locales(&self.detectors.locales);
        }
        Ok(registry)
    }

    /// Weights restricted to enabled detectors
    pub fn effective_weights(&self) -> Weights {
        let mut weights = self.scoring.weights.clone();
        let enabled: Vec<String> = weights
            .iter()
            .filter(|(id, _)| self.detectors.is_enabled(id))
            .map(|(id, _)| id.to_string())
            .collect();
        weights.retain(&enabled.iter().map(String::as_str).collect::<Vec<_>>());
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.pipeline.max_concurrent, 4);
        assert_eq!(config.fetch.timeout_secs, 20);
        assert_eq!(config.scoring.weights, Weights::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AnalyzerConfig = toml::from_str(
            r#"
            [pipeline]
            max_concurrent = 8

            [scoring.weights]
            E2 = 3.0

            [detectors.freshness]
            max_age_days = 365
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.max_concurrent, 8);
        assert_eq!(config.pipeline.max_posts, 30);
        assert_eq!(config.scoring.weights.get("E2"), Some(3.0));
        assert_eq!(config.scoring.weights.get("E1"), Some(1.0));
        assert_eq!(config.detectors.freshness.max_age_days, 365);
    }

    #[test]
    fn test_effective_weights_follow_enabled_detectors() {
        let config: AnalyzerConfig = toml::from_str(
            r#"
            [detectors]
            enabled = ["E1", "E4"]
            "#,
        )
        .unwrap();

        let weights = config.effective_weights();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights.get("E6"), None);
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut config = AnalyzerConfig::default();
        config.pipeline.max_concurrent = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = AnalyzerConfig::load("/nonexistent/eeat.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_locale_filter() {
        let mut config = AnalyzerConfig::default();
        config.detectors.locales = vec!["de".to_string()];
        let registry = config.pattern_registry().unwrap();
        assert_eq!(registry.locales(), vec!["de"]);
    }
}
