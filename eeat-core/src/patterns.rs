//! Locale phrase patterns
//!
//! Reviewer and byline phrases are data, not code. Each locale is a TOML
//! file with two lists of regular expressions; English and German ship
//! embedded and a directory of extra files can add or replace locales.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while loading phrase patterns
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid pattern {pattern:?} in locale {locale}: {source}")]
    InvalidRegex {
        locale: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A locale pattern file as written on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalePatterns {
    pub locale: String,
    #[serde(default)]
    pub reviewer: Vec<String>,
    #[serde(default)]
    pub byline: Vec<String>,
}

/// Which phrase list a lookup uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhraseKind {
    Reviewer,
    Byline,
}

/// A compiled pattern with its origin
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub locale: String,
    pub kind: PhraseKind,
    pub source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile a pattern as a case-insensitive, whole-word match
    pub fn compile(locale: &str, kind: PhraseKind, pattern: &str) -> Result<Self, PatternError> {
        let wrapped = format!(r"\b{{start-half}}(?:{pattern})\b{{end-half}}");
        let regex = RegexBuilder::new(&wrapped)
            .case_insensitive(true)
            .unicode(true)
            .build()
            .map_err(|source| PatternError::InvalidRegex {
                locale: locale.to_string(),
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            locale: locale.to_string(),
            kind,
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// One occurrence of a phrase in a text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseMatch {
    pub locale: String,
    pub pattern: String,
    /// Byte offset of the match start
    pub start: usize,
    /// Byte offset one past the match end
    pub end: usize,
    /// The matched slice as it appears in the text
    pub text: String,
}

impl PhraseMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the two matches share any byte of the text
    pub fn overlaps(&self, other: &PhraseMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone)]
struct CompiledLocale {
    raw: LocalePatterns,
    reviewer: Vec<CompiledPattern>,
    byline: Vec<CompiledPattern>,
}

impl CompiledLocale {
    fn compile(raw: LocalePatterns) -> Result<Self, PatternError> {
        let compile_all = |kind, patterns: &[String]| {
            patterns
                .iter()
                .map(|p| CompiledPattern::compile(&raw.locale, kind, p))
                .collect::<Result<Vec<_>, _>>()
        };
        let reviewer = compile_all(PhraseKind::Reviewer, &raw.reviewer)?;
        let byline = compile_all(PhraseKind::Byline, &raw.byline)?;
        Ok(Self {
            raw,
            reviewer,
            byline,
        })
    }

    fn patterns(&self, kind: PhraseKind) -> &[CompiledPattern] {
        match kind {
            PhraseKind::Reviewer => &self.reviewer,
            PhraseKind::Byline => &self.byline,
        }
    }
}

const EMBEDDED: &[(&str, &str)] = &[
    ("en.toml", include_str!("../patterns/en.toml")),
    ("de.toml", include_str!("../patterns/de.toml")),
];

/// Registry of compiled locale patterns, in registration order
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    locales: Vec<CompiledLocale>,
}

impl PatternRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the built-in English and German patterns
    pub fn load_embedded() -> Self {
        let mut registry = Self::new();

        for (name, toml_str) in EMBEDDED {
            match toml::from_str::<LocalePatterns>(toml_str) {
                Ok(patterns) => {
                    if let Err(e) = registry.register(patterns) {
                        warn!("Skipping embedded patterns {}: {}", name, e);
                    }
                }
                Err(e) => warn!("Skipping embedded patterns {}: {}", name, e),
            }
        }

        registry
    }

    /// Load every `*.toml` file in a directory into an empty registry
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, PatternError> {
        let mut registry = Self::new();
        registry.merge_dir(dir)?;
        Ok(registry)
    }

    /// Add or replace locales from a directory; returns how many files were read
    pub fn merge_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize, PatternError> {
        let dir = dir.as_ref();
        let io_err = |source| PatternError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        // read_dir order is platform dependent
        paths.sort();

        for path in &paths {
            let content = std::fs::read_to_string(path).map_err(|source| PatternError::Io {
                path: path.clone(),
                source,
            })?;
            let patterns =
                toml::from_str::<LocalePatterns>(&content).map_err(|source| PatternError::Toml {
                    path: path.clone(),
                    source,
                })?;
            debug!("Loaded {} patterns from {}", patterns.locale, path.display());
            self.register(patterns)?;
        }

        Ok(paths.len())
    }

    /// Register a locale, replacing any existing locale of the same name
    pub fn register(&mut self, patterns: LocalePatterns) -> Result<(), PatternError> {
        let compiled = CompiledLocale::compile(patterns)?;
        match self
            .locales
            .iter_mut()
            .find(|l| l.raw.locale == compiled.raw.locale)
        {
            Some(existing) => *existing = compiled,
            None => self.locales.push(compiled),
        }
        Ok(())
    }

    /// Keep only the named locales
    pub fn retain_locales(&mut self, keep: &[String]) {
        self.locales.retain(|l| keep.contains(&l.raw.locale));
    }

    /// Every match of every pattern of `kind` in `text`
    pub fn find_all(&self, kind: PhraseKind, text: &str) -> Vec<PhraseMatch> {
        let mut matches = Vec::new();
        for locale in &self.locales {
            for pattern in locale.patterns(kind) {
                for m in pattern.regex.find_iter(text) {
                    matches.push(PhraseMatch {
                        locale: pattern.locale.clone(),
                        pattern: pattern.source.clone(),
                        start: m.start(),
                        end: m.end(),
                        text: m.as_str().to_string(),
                    });
                }
            }
        }
        matches.sort_by(|a, b| a.start.cmp(&b.start).then(b.len().cmp(&a.len())));
        matches
    }

    /// The earliest match in `text`, the longest one when several start together
    pub fn earliest(&self, kind: PhraseKind, text: &str) -> Option<PhraseMatch> {
        self.find_all(kind, text).into_iter().next()
    }

    /// Registered locale names, in order
    pub fn locales(&self) -> Vec<&str> {
        self.locales.iter().map(|l| l.raw.locale.as_str()).collect()
    }

    /// Raw pattern definitions, in order
    pub fn patterns(&self) -> Vec<&LocalePatterns> {
        self.locales.iter().map(|l| &l.raw).collect()
    }

    /// Number of registered locales
    pub fn len(&self) -> usize {
        self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }
}
