//! EEAT Detectors
//!
//! Pure signal detectors, each turning one subject into one `Evidence`:
//! - **E1** author attribution
//! - **E2** reviewer statement
//! - **E3** visible dates
//! - **E4** schema.org dates
//! - **E5** content freshness
//! - **E6** blog publishing cadence
//!
//! Detectors are collected in a [`DetectorRegistry`]; adding one requires no
//! change to the scorer.

pub mod author;
pub mod cadence;
pub mod config;
pub mod freshness;
pub mod registry;
pub mod reviewer;
pub mod schema_dates;
pub mod traits;
pub mod visible_dates;

pub use author::*;
pub use cadence::*;
pub use config::*;
pub use freshness::*;
pub use registry::*;
pub use reviewer::*;
pub use schema_dates::*;
pub use traits::*;
pub use visible_dates::*;
