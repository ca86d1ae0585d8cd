//! EEAT Web Layer
//!
//! Everything that touches HTML or the network:
//! - HTTP page fetching with retries, proxy support and user-agent rotation
//! - An in-memory fetch cache
//! - DOM extraction into `PageData`
//! - Blog post discovery from an index page

pub mod cache;
pub mod client;
pub mod discovery;
pub mod extractor;

pub use cache::*;
pub use client::*;
pub use discovery::*;
pub use extractor::*;
