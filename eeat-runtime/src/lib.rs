//! EEAT Runtime
//!
//! Drives the analysis pipeline:
//! - Single pages, batches of URLs, blogs and whole sites
//! - Bounded, order-preserving concurrency with per-fetch deadlines
//! - Failure isolation: a failed fetch only affects its own item
//! - TOML configuration for fetching, scoring and detectors

pub mod analyzer;
pub mod config;
pub mod report;

pub use analyzer::*;
pub use config::*;
pub use report::*;
