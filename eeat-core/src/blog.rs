//! Blog publishing-frequency aggregation
//!
//! `BlogInsights` is always derived from scratch from a post list. There is
//! no way to patch one in place: adding a post produces a new aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{months_between, DateSource, MIN_DATED_POSTS};

/// Outcome of fetching a blog post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PostStatus {
    Ok,
    Failed,
}

/// A blog post and its publish date, if one could be determined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_source: Option<DateSource>,
    pub status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BlogPost {
    pub fn dated(url: &str, published_at: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            published_at: Some(published_at),
            date_source: None,
            status: PostStatus::Ok,
            error: None,
        }
    }

    pub fn undated(url: &str) -> Self {
        Self {
            url: url.to_string(),
            published_at: None,
            date_source: None,
            status: PostStatus::Ok,
            error: None,
        }
    }

    /// A post whose fetch failed; it carries no date
    pub fn failed(url: &str, error: &str) -> Self {
        Self {
            url: url.to_string(),
            published_at: None,
            date_source: None,
            status: PostStatus::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn with_source(mut self, source: DateSource) -> Self {
        self.date_source = Some(source);
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Whether the dated sample supports a frequency estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleStatus {
    Ok,
    /// Fewer than two dated posts
    InsufficientSample,
    /// Two or more dated posts, all on the same instant
    ZeroSpan,
}

/// Publishing frequency statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingFrequency {
    pub posts_per_month: f64,
    pub span_months: f64,
    pub total_posts_with_dates: usize,
    pub total_posts: usize,
    pub sample: SampleStatus,
}

impl PublishingFrequency {
    /// True when `posts_per_month` is backed by a usable sample
    pub fn is_reliable(&self) -> bool {
        self.sample == SampleStatus::Ok
    }
}

/// Aggregate statistics over a site's blog posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogInsights {
    posts: Vec<BlogPost>,
    publishing_frequency: PublishingFrequency,
    first_published: Option<DateTime<Utc>>,
    last_published: Option<DateTime<Utc>>,
}

impl BlogInsights {
    /// Derive insights from a post list
    pub fn aggregate(posts: Vec<BlogPost>) -> Self {
        let dates: Vec<DateTime<Utc>> = posts.iter().filter_map(|p| p.published_at).collect();
        let first_published = dates.iter().min().copied();
        let last_published = dates.iter().max().copied();

        let span_months = match (first_published, last_published) {
            (Some(first), Some(last)) => months_between(first, last),
            _ => 0.0,
        };

        let dated = dates.len();
        let sample = if dated < MIN_DATED_POSTS {
            SampleStatus::InsufficientSample
        } else if span_months <= 0.0 {
            SampleStatus::ZeroSpan
        } else {
            SampleStatus::Ok
        };

        let posts_per_month = match sample {
            SampleStatus::Ok => dated as f64 / span_months,
            _ => 0.0,
        };

        Self {
            publishing_frequency: PublishingFrequency {
                posts_per_month,
                span_months,
                total_posts_with_dates: dated,
                total_posts: posts.len(),
                sample,
            },
            posts,
            first_published,
            last_published,
        }
    }

    /// A new aggregate with one more post
    pub fn with_post(self, post: BlogPost) -> Self {
        let mut posts = self.posts;
        posts.push(post);
        Self::aggregate(posts)
    }

    pub fn posts(&self) -> &[BlogPost] {
        &self.posts
    }

    pub fn publishing_frequency(&self) -> &PublishingFrequency {
        &self.publishing_frequency
    }

    pub fn first_published(&self) -> Option<DateTime<Utc>> {
        self.first_published
    }

    pub fn last_published(&self) -> Option<DateTime<Utc>> {
        self.last_published
    }

    /// Posts whose fetch failed
    pub fn failed_posts(&self) -> impl Iterator<Item = &BlogPost> {
        self.posts.iter().filter(|p| p.status == PostStatus::Failed)
    }
}

/// Convenience wrapper around [`BlogInsights::aggregate`]
pub fn aggregate(posts: Vec<BlogPost>) -> BlogInsights {
    BlogInsights::aggregate(posts)
}
