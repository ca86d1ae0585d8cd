//! Common traits for signal detectors

use eeat_core::{BlogInsights, Evidence, PageData};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from detector operations
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Detector {detector} cannot inspect a {found:?} subject")]
    WrongSubject {
        detector: String,
        found: SubjectKind,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// What a detector inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubjectKind {
    Page,
    Blog,
}

/// The input handed to a detector
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Page(&'a PageData),
    Blog(&'a BlogInsights),
}

impl<'a> Subject<'a> {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Page(_) => SubjectKind::Page,
            Subject::Blog(_) => SubjectKind::Blog,
        }
    }

    /// The page, or a `WrongSubject` error naming `detector`
    pub fn page(self, detector: &str) -> Result<&'a PageData, DetectorError> {
        match self {
            Subject::Page(page) => Ok(page),
            other => Err(DetectorError::WrongSubject {
                detector: detector.to_string(),
                found: other.kind(),
            }),
        }
    }

    /// The blog insights, or a `WrongSubject` error naming `detector`
    pub fn blog(self, detector: &str) -> Result<&'a BlogInsights, DetectorError> {
        match self {
            Subject::Blog(blog) => Ok(blog),
            other => Err(DetectorError::WrongSubject {
                detector: detector.to_string(),
                found: other.kind(),
            }),
        }
    }
}

/// Common interface for all signal detectors.
///
/// Detectors hold only immutable configuration, never read each other's
/// output and return exactly one `Evidence` per subject.
pub trait Detector: Send + Sync {
    /// Unique detector identifier (`E1`..`E6` for the built-ins)
    fn id(&self) -> &str;

    /// Short human-readable name
    fn name(&self) -> &str;

    /// Which subject this detector inspects
    fn subject_kind(&self) -> SubjectKind;

    /// Inspect a subject
    fn detect(&self, subject: Subject<'_>) -> Result<Evidence, DetectorError>;
}
