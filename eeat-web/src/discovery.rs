//! Blog post discovery
//!
//! Finds post links on a blog index page: same host, below the blog root,
//! not an archive or feed. The first `<time>` in a link's enclosing
//! `article`/`li` is kept as a publish-date hint.

use chrono::{DateTime, Utc};
use eeat_core::{parse_date, PageData};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::{validate_url, FetchError};

static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time").unwrap());

/// Default cap on discovered posts
pub const DEFAULT_MAX_POSTS: usize = 30;

/// Path segments that mark listing, archive or feed pages
const ARCHIVE_SEGMENTS: &[&str] = &[
    "page", "tag", "tags", "category", "categories", "author", "authors", "feed", "rss",
    "atom", "archive", "archives", "search", "kategorie", "schlagwort", "autor", "seite",
];

/// File extensions that are never posts
const SKIPPED_EXTENSIONS: &[&str] = &[
    ".xml", ".rss", ".atom", ".json", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".pdf",
    ".zip",
];

/// A post link found on a blog index
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredPost {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_hint: Option<DateTime<Utc>>,
}

/// Discover post URLs on a blog index page
pub fn discover_posts(
    blog_root: &str,
    page: &PageData,
    max_posts: usize,
) -> Result<Vec<DiscoveredPost>, FetchError> {
    let root = validate_url(blog_root)?;
    let root_prefix = directory_prefix(root.path());
    let document = Html::parse_document(page.html());

    let mut seen: HashSet<String> = HashSet::new();
    let mut posts = Vec::new();

    for link in document.select(&LINK) {
        if posts.len() >= max_posts {
            break;
        }

        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(url) = post_url(&root, &root_prefix, href) else {
            continue;
        };

        let normalized = url.trim_end_matches('/').to_lowercase();
        if !seen.insert(normalized) {
            continue;
        }

        posts.push(DiscoveredPost {
            url,
            published_hint: enclosing_time(link),
        });
    }

    debug!("Discovered {} posts under {}", posts.len(), blog_root);
    Ok(posts)
}

/// Resolve and filter one `href`
fn post_url(root: &Url, root_prefix: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = root.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    if !same_host(root, &url) {
        return None;
    }

    url.set_fragment(None);
    url.set_query(None);

    let path = url.path().to_string();
    let relative = path.strip_prefix(root_prefix)?;
    let relative = relative.trim_matches('/');
    if relative.is_empty() {
        return None;
    }

    let lower = relative.to_lowercase();
    if lower
        .split('/')
        .any(|segment| ARCHIVE_SEGMENTS.contains(&segment))
    {
        return None;
    }
    if SKIPPED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return None;
    }

    Some(url.to_string())
}

fn same_host(a: &Url, b: &Url) -> bool {
    let host = |u: &Url| {
        u.host_str()
            .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
    };
    host(a).is_some() && host(a) == host(b)
}

/// The root path as a directory prefix, always ending in `/`
fn directory_prefix(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// First parseable `<time>` in the nearest enclosing `article` or `li`
fn enclosing_time(link: ElementRef) -> Option<DateTime<Utc>> {
    let container = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| matches!(el.value().name(), "article" | "li"))?;

    container.select(&TIME).find_map(|time| {
        time.value()
            .attr("datetime")
            .and_then(parse_date)
            .or_else(|| parse_date(&time.text().collect::<String>()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn index(html: &str) -> PageData {
        PageData::builder("https://example.com/blog/").html(html).build()
    }

    #[test]
    fn test_keeps_posts_below_root() {
        let page = index(
            r#"<body>
                <a href="/blog/first-post">First</a>
                <a href="https://example.com/blog/second-post/">Second</a>
                <a href="https://www.example.com/blog/third">Third</a>
                <a href="/about">About</a>
                <a href="/blog/">Blog home</a>
                <a href="https://other.com/blog/elsewhere">Elsewhere</a>
                <a href="mailto:hello@example.com">Mail</a>
            </body>"#,
        );

        let posts = discover_posts("https://example.com/blog", &page, 30).unwrap();
        let urls: Vec<_> = posts.iter().map(|p| p.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://example.com/blog/first-post",
                "https://example.com/blog/second-post/",
                "https://www.example.com/blog/third",
            ]
        );
    }

    #[test]
    fn test_ignores_archive_and_feed_links() {
        let page = index(
            r#"<body>
                <a href="/blog/tag/health">Tag</a>
                <a href="/blog/category/news/">Category</a>
                <a href="/blog/author/jane">Author</a>
                <a href="/blog/page/2">Older</a>
                <a href="/blog/feed">Feed</a>
                <a href="/blog/sitemap.xml">Sitemap</a>
                <a href="/blog/kategorie/gesundheit">Kategorie</a>
                <a href="/blog/real-post">Real</a>
            </body>"#,
        );

        let posts = discover_posts("https://example.com/blog/", &page, 30).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, "https://example.com/blog/real-post");
    }

    #[test]
    fn test_dedupes_fragments_and_queries() {
        let page = index(
            r##"<body>
                <a href="/blog/post-a">A</a>
                <a href="/blog/post-a#comments">A comments</a>
                <a href="/blog/post-a?utm_source=x">A tracked</a>
                <a href="#top">Top</a>
                <a href="/blog/?page=2">Next</a>
            </body>"##,
        );

        let posts = discover_posts("https://example.com/blog/", &page, 30).unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[test]
    fn test_caps_at_max_posts() {
        let links: String = (0..50)
            .map(|i| format!(r#"<a href="/blog/post-{i}">Post {i}</a>"#))
            .collect();
        let page = index(&format!("<body>{links}</body>"));

        let posts = discover_posts("https://example.com/blog/", &page, DEFAULT_MAX_POSTS).unwrap();
        assert_eq!(posts.len(), 30);
        assert_eq!(posts[0].url, "https://example.com/blog/post-0");
    }

    #[test]
    fn test_time_hint_from_enclosing_article() {
        let page = index(
            r#"<body>
                <article>
                    <h2><a href="/blog/dated">Dated</a></h2>
                    <time datetime="2024-02-10">Feb 10</time>
                </article>
                <ul><li><a href="/blog/listed">Listed</a> <time>2023-11-05</time></li></ul>
                <a href="/blog/bare">Bare</a>
            </body>"#,
        );

        let posts = discover_posts("https://example.com/blog/", &page, 30).unwrap();

        assert_eq!(
            posts[0].published_hint,
            Some(Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(
            posts[1].published_hint,
            Some(Utc.with_ymd_and_hms(2023, 11, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(posts[2].published_hint, None);
    }

    #[test]
    fn test_invalid_root() {
        let page = index("<body></body>");
        assert!(matches!(
            discover_posts("not a url", &page, 30),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
