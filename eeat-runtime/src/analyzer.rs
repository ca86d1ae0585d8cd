//! Analysis pipeline
//!
//! URL → fetch → extract → detectors → score. Batches and blog posts are
//! fetched with bounded concurrency; each fetch has its own deadline so a
//! stalled page cannot hold up unrelated URLs.

use anyhow::Context;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use eeat_core::{aggregate, score, BlogPost, DateSource, EvidenceSet, PageData, Weights};
use eeat_detectors::{DetectorRegistry, Subject, SubjectKind};
use eeat_web::{
    discover_posts, parse_fetched, validate_url, CachingSource, DiscoveredPost, FetchError,
    HttpSource, PageSource,
};

use crate::{
    AnalyzerConfig, BatchReport, BlogReport, PageReport, PageStatus, PipelineConfig, SiteReport,
};

/// The content credibility analyzer
pub struct Analyzer {
    source: Arc<dyn PageSource>,
    detectors: DetectorRegistry,
    weights: Weights,
    pipeline: PipelineConfig,
}

impl Analyzer {
    /// Create an analyzer that fetches over HTTP
    pub fn new(config: &AnalyzerConfig) -> Result<Self, anyhow::Error> {
        let http = HttpSource::new(config.fetch.clone()).context("failed to create HTTP client")?;
        let source: Arc<dyn PageSource> = if config.pipeline.cache {
            Arc::new(CachingSource::new(http))
        } else {
            Arc::new(http)
        };
        Self::with_source(config, source)
    }

    /// Create an analyzer over any page source
    pub fn with_source(
        config: &AnalyzerConfig,
        source: Arc<dyn PageSource>,
    ) -> Result<Self, anyhow::Error> {
        config.validate()?;
        let patterns = config
            .pattern_registry()
            .context("failed to load phrase patterns")?;
        let detectors = DetectorRegistry::with_defaults(&config.detectors, Arc::new(patterns));

        info!(
            "Analyzer ready with detectors {:?}",
            detectors.ids()
        );

        Ok(Self {
            source,
            detectors,
            weights: config.effective_weights(),
            pipeline: config.pipeline.clone(),
        })
    }

    /// Replace the detector registry
    pub fn with_detectors(mut self, detectors: DetectorRegistry) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn detectors(&self) -> &DetectorRegistry {
        &self.detectors
    }

    /// Weight table for the detectors that inspect `kind`
    fn weights_for(&self, kind: SubjectKind) -> Weights {
        let mut weights = self.weights.clone();
        weights.retain(&self.detectors.ids_for(kind));
        weights
    }

    async fn fetch_page(&self, url: &str) -> Result<PageData, FetchError> {
        let deadline_ms = self.pipeline.fetch_deadline_ms;
        match tokio::time::timeout(Duration::from_millis(deadline_ms), self.source.fetch(url)).await
        {
            Ok(Ok(page)) => Ok(parse_fetched(&page)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                after_ms: deadline_ms,
            }),
        }
    }

    async fn page_evidence(&self, url: &str) -> Result<(PageData, EvidenceSet), FetchError> {
        validate_url(url)?;
        let page = self.fetch_page(url).await?;
        let evidence = self.detectors.run(Subject::Page(&page));
        Ok((page, evidence))
    }

    fn page_report(&self, url: &str, page: &PageData, evidence: &EvidenceSet) -> PageReport {
        PageReport {
            url: url.to_string(),
            status: PageStatus::Analyzed,
            title: page.title().map(str::to_string),
            published_at: page.published_at().map(|d| d.at),
            modified_at: page.modified_at().map(|d| d.at),
            score: Some(score(evidence, &self.weights_for(SubjectKind::Page))),
            error: None,
        }
    }

    /// Analyze a single page
    pub async fn analyze_page(&self, url: &str) -> PageReport {
        match self.page_evidence(url).await {
            Ok((page, evidence)) => {
                let report = self.page_report(url, &page, &evidence);
                debug!(
                    "Analyzed {} (overall {:.3})",
                    url,
                    report.score.as_ref().map_or(0.0, |s| s.overall)
                );
                report
            }
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                PageReport::skipped(url, &e.to_string())
            }
        }
    }

    /// Analyze many pages; reports come back in input order
    pub async fn analyze_batch(&self, urls: &[String]) -> BatchReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("Batch {} starting with {} URLs", run_id, urls.len());

        let reports = bounded(urls, self.pipeline.max_concurrent, |url| {
            self.analyze_page(url)
        })
        .await;

        let analyzed = reports.iter().filter(|r| r.is_analyzed()).count();
        let skipped = reports.len() - analyzed;
        info!(
            "Batch {} finished: {} analyzed, {} skipped",
            run_id, analyzed, skipped
        );

        BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            analyzed,
            skipped,
            reports,
        }
    }

    /// Analyze a blog's publishing cadence.
    ///
    /// Post URLs are discovered from the index at `root` unless given.
    /// Only a failure to fetch the index itself is an error; failed posts
    /// are recorded in the insights.
    pub async fn analyze_blog(
        &self,
        root: &str,
        posts: Option<&[String]>,
    ) -> Result<BlogReport, FetchError> {
        validate_url(root)?;

        let targets = match posts {
            Some(urls) => urls
                .iter()
                .map(|url| DiscoveredPost {
                    url: url.clone(),
                    published_hint: None,
                })
                .collect(),
            None => {
                let index = self.fetch_page(root).await?;
                // Links resolve against where the index actually lives
                if index.url() != root {
                    debug!("Blog index {} redirected to {}", root, index.url());
                }
                let found = discover_posts(index.url(), &index, self.pipeline.max_posts)?;
                if found.is_empty() {
                    warn!("No posts found on blog index {}", index.url());
                }
                found
            }
        };
        info!("Analyzing {} posts under {}", targets.len(), root);

        let blog_posts: Vec<BlogPost> = bounded(targets, self.pipeline.max_concurrent, |post| {
            self.resolve_post(post)
        })
        .await;

        let insights = aggregate(blog_posts);
        let evidence = self.detectors.run(Subject::Blog(&insights));
        let score = score(&evidence, &self.weights_for(SubjectKind::Blog));

        Ok(BlogReport {
            root: root.to_string(),
            insights,
            evidence,
            score,
        })
    }

    async fn resolve_post(&self, post: DiscoveredPost) -> BlogPost {
        match self.fetch_page(&post.url).await {
            Ok(page) => match (page.published_at(), post.published_hint) {
                (Some(date), _) => BlogPost::dated(&post.url, date.at).with_source(date.source),
                (None, Some(hint)) => {
                    BlogPost::dated(&post.url, hint).with_source(DateSource::IndexHint)
                }
                (None, None) => BlogPost::undated(&post.url),
            },
            Err(e) => {
                warn!("Post {} failed: {}", post.url, e);
                BlogPost::failed(&post.url, &e.to_string())
            }
        }
    }

    /// Analyze a site's landing page together with its blog.
    ///
    /// Without an explicit blog root, the configured default blog path
    /// under the site URL is tried.
    pub async fn analyze_site(&self, url: &str, blog_root: Option<&str>) -> SiteReport {
        let (page, mut evidence) = match self.page_evidence(url).await {
            Ok((page, evidence)) => (self.page_report(url, &page, &evidence), evidence),
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                let error = e.to_string();
                (
                    PageReport::skipped(url, &error),
                    self.detectors.skipped(SubjectKind::Page, &error),
                )
            }
        };

        let blog_result = match blog_root {
            Some(root) => Ok(root.to_string()),
            None => default_blog_root(url, &self.pipeline.default_blog_path),
        };
        let blog_result = match blog_result {
            Ok(root) => self.analyze_blog(&root, None).await,
            Err(e) => Err(e),
        };

        let (blog, blog_error) = match blog_result {
            Ok(report) => {
                evidence.merge(report.evidence.clone());
                (Some(report), None)
            }
            Err(e) => {
                warn!("Blog analysis for {} failed: {}", url, e);
                (None, Some(e.to_string()))
            }
        };

        SiteReport {
            url: url.to_string(),
            page,
            blog,
            blog_error,
            score: score(&evidence, &self.weights),
        }
    }
}

/// Run `work` over `items` with at most `limit` in flight.
///
/// Items finish in any order and a finished item frees its slot at once;
/// results come back in input order.
async fn bounded<I, T, F, Fut>(items: I, limit: usize, work: F) -> Vec<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    let mut results: Vec<(usize, T)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let task = work(item);
            async move { (index, task.await) }
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

fn default_blog_root(url: &str, blog_path: &str) -> Result<String, FetchError> {
    let base = validate_url(url)?;
    base.join(blog_path)
        .map(|u| u.to_string())
        .map_err(|_| FetchError::InvalidUrl(blog_path.to_string()))
}
