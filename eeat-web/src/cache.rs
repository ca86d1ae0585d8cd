//! In-memory fetch cache
//!
//! Successful fetches are cached by URL. Failures are never cached, so a
//! transient error does not stick.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::{FetchError, FetchedPage, PageSource};

/// `PageSource` decorator that remembers successful fetches
pub struct CachingSource<S> {
    inner: S,
    pages: DashMap<String, FetchedPage>,
}

impl<S: PageSource> CachingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pages: DashMap::new(),
        }
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&self) {
        self.pages.clear();
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PageSource> PageSource for CachingSource<S> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if let Some(hit) = self.pages.get(url) {
            debug!("Cache hit: {}", url);
            return Ok(hit.value().clone());
        }

        let page = self.inner.fetch(url).await?;
        self.pages.insert(url.to_string(), page.clone());
        Ok(page)
    }
}
