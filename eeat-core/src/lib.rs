//! EEAT Core - data model and pure computations for content credibility analysis
//!
//! This crate provides the foundational primitives:
//! - Page data produced by the DOM extractor
//! - Evidence records emitted by detectors
//! - Data-driven locale phrase patterns
//! - Blog publishing-frequency aggregation
//! - Weighted credibility scoring

pub mod blog;
pub mod dates;
pub mod evidence;
pub mod jsonld;
pub mod page;
pub mod patterns;
pub mod score;
pub mod weights;

pub use blog::*;
pub use dates::*;
pub use evidence::*;
pub use jsonld::*;
pub use page::*;
pub use patterns::*;
pub use score::*;
pub use weights::*;

/// Minimum number of dated posts before a publishing frequency is meaningful
pub const MIN_DATED_POSTS: usize = 2;

/// Minimum confidence value
pub const MIN_CONFIDENCE: f64 = 0.0;

/// Maximum confidence value
pub const MAX_CONFIDENCE: f64 = 1.0;
