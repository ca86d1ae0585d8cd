//! DOM extraction
//!
//! Turns raw HTML into `PageData`. Extraction never fails: every field is
//! optional, and a malformed JSON-LD block is recorded without affecting
//! the others.

use eeat_core::{PageData, PageDataBuilder};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::FetchedPage;

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").unwrap());
static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script[type]").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time").unwrap());

/// Elements whose text is never visible
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Attributes that name a meta tag, in lookup order
const META_NAME_ATTRS: &[&str] = &["name", "property", "itemprop", "http-equiv"];

/// Extract page data from HTML
pub fn parse(url: &str, html: &str) -> PageData {
    extract(url, html).build()
}

/// Extract page data from a fetched page.
///
/// The `Last-Modified` response header is recorded as the `last-modified`
/// meta entry unless the page declares one itself.
pub fn parse_fetched(page: &FetchedPage) -> PageData {
    let builder = extract(&page.final_url, &page.html);
    match &page.last_modified {
        Some(last_modified) => builder.meta("last-modified", last_modified).build(),
        None => builder.build(),
    }
}

fn extract(url: &str, html: &str) -> PageDataBuilder {
    let document = Html::parse_document(html);
    let mut builder = PageData::builder(url).html(html);

    if let Some(title) = document.select(&TITLE).next() {
        builder = builder.title(&element_text(title));
    }

    builder = extract_meta(&document, builder);
    builder = extract_json_ld(&document, builder);

    for time in document.select(&TIME) {
        builder = builder.time_element(time.value().attr("datetime"), &element_text(time));
    }

    if let Some(body) = document.select(&BODY).next() {
        builder = builder.visible_text(&visible_text(body));
    }

    builder
}

fn extract_meta(document: &Html, mut builder: PageDataBuilder) -> PageDataBuilder {
    for meta in document.select(&META) {
        let element = meta.value();
        let name = META_NAME_ATTRS.iter().find_map(|attr| element.attr(attr));
        if let (Some(name), Some(content)) = (name, element.attr("content")) {
            builder = builder.meta(name, content);
        }
    }
    builder
}

fn extract_json_ld(document: &Html, mut builder: PageDataBuilder) -> PageDataBuilder {
    let blocks = document.select(&SCRIPT).filter(|script| {
        script
            .value()
            .attr("type")
            .map(|t| t.trim().to_ascii_lowercase().starts_with("application/ld+json"))
            .unwrap_or(false)
    });

    for (index, script) in blocks.enumerate() {
        let raw: String = script.text().collect();
        let payload = strip_cdata(&raw);

        if payload.is_empty() {
            builder = builder.json_ld_error(index, "empty JSON-LD block");
            continue;
        }

        match serde_json::from_str(payload) {
            Ok(value) => builder = builder.json_ld_block(value),
            Err(e) => {
                debug!("Malformed JSON-LD block {}: {}", index, e);
                builder = builder.json_ld_error(index, &e.to_string());
            }
        }
    }
    builder
}

/// Strip CDATA markers, including the commented-out forms
fn strip_cdata(raw: &str) -> &str {
    let mut s = raw.trim();
    for prefix in ["//<![CDATA[", "/*<![CDATA[*/", "<![CDATA["] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim();
            break;
        }
    }
    for suffix in ["//]]>", "/*]]>*/", "]]>"] {
        if let Some(rest) = s.strip_suffix(suffix) {
            s = rest.trim();
            break;
        }
    }
    s
}

/// Text under an element, skipping hidden subtrees
fn visible_text(root: ElementRef) -> String {
    let mut parts = Vec::new();

    for node_ref in root.descendants() {
        if let Node::Text(text_node) = node_ref.value() {
            let hidden = node_ref.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                    .unwrap_or(false)
            });

            if !hidden {
                let trimmed = text_node.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
        }
    }

    normalize_whitespace(&parts.join(" "))
}

fn element_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeat_core::DateSource;

    #[test]
    fn test_extract_title_and_visible_text() {
        let html = r#"
            <html>
            <head><title> Test   Page </title></head>
            <body>
                <script>var x = 1;</script>
                <h1>Hello World</h1>
                <p>This is test content.</p>
                <style>.x { color: red; }</style>
                <noscript>Enable JavaScript</noscript>
                <template><p>Hidden template</p></template>
            </body>
            </html>
        "#;

        let page = parse("https://example.com", html);

        assert_eq!(page.title(), Some("Test Page"));
        assert!(page.visible_text().contains("Hello World"));
        assert!(page.visible_text().contains("test content"));
        assert!(!page.visible_text().contains("var x"));
        assert!(!page.visible_text().contains("color: red"));
        assert!(!page.visible_text().contains("Enable JavaScript"));
        assert!(!page.visible_text().contains("Hidden template"));
    }

    #[test]
    fn test_extract_meta_tags() {
        let html = r#"
            <html><head>
                <meta property="article:modified_time" content="2024-05-01T10:00:00Z">
                <meta name="DC.date" content="2024-01-02">
                <meta http-equiv="last-modified" content="2024-05-02">
                <meta name="author" content="Jane Doe">
                <meta charset="utf-8">
            </head><body></body></html>
        "#;

        let page = parse("https://example.com", html);

        assert_eq!(page.meta("article:modified_time"), Some("2024-05-01T10:00:00Z"));
        assert_eq!(page.meta("dc.date"), Some("2024-01-02"));
        assert_eq!(page.meta("Last-Modified"), Some("2024-05-02"));
        assert_eq!(page.meta("author"), Some("Jane Doe"));
        assert_eq!(page.meta_tags().len(), 4);
    }

    #[test]
    fn test_malformed_json_ld_does_not_block_others() {
        let html = r#"
            <html><head>
                <script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>
                <script type="application/ld+json">{"@type": "Article", "datePublished": </script>
                <script type="application/ld+json">
                    <![CDATA[ {"@type": "BreadcrumbList"} ]]>
                </script>
            </head><body><p>Body text</p></body></html>
        "#;

        let page = parse("https://example.com", html);

        assert_eq!(page.json_ld_blocks().len(), 2);
        assert_eq!(page.json_ld_errors().len(), 1);
        assert_eq!(page.json_ld_errors()[0].index, 1);
        assert!(page.visible_text().contains("Body text"));
    }

    #[test]
    fn test_json_ld_type_with_parameters() {
        let html = r#"<script type="Application/LD+JSON; charset=utf-8">{"@type":"WebPage"}</script>
            <script type="text/javascript">var a = {};</script>"#;

        let page = parse("https://example.com", html);
        assert_eq!(page.json_ld_blocks().len(), 1);
        assert!(page.json_ld_errors().is_empty());
    }

    #[test]
    fn test_time_elements() {
        let html = r#"<body>
            <time datetime="2024-03-01">1. März 2024</time>
            <time>yesterday</time>
        </body>"#;

        let page = parse("https://example.com", html);
        let times = page.time_elements();

        assert_eq!(times.len(), 2);
        assert_eq!(times[0].datetime.as_deref(), Some("2024-03-01"));
        assert_eq!(times[0].text, "1. März 2024");
        assert_eq!(times[1].datetime, None);
    }

    #[test]
    fn test_last_modified_header_becomes_meta() {
        let mut fetched = FetchedPage::new("https://example.com/a", "<html><body>x</body></html>");
        fetched.last_modified = Some("Wed, 21 Oct 2015 07:28:00 GMT".to_string());

        let page = parse_fetched(&fetched);
        let modified = page.modified_at().unwrap();
        assert_eq!(modified.source, DateSource::MetaTag("last-modified".to_string()));
        assert_eq!(page.visible_text(), "x");
    }

    #[test]
    fn test_page_declared_last_modified_wins() {
        let mut fetched = FetchedPage::new(
            "https://example.com/a",
            r#"<meta http-equiv="last-modified" content="2024-01-01">"#,
        );
        fetched.last_modified = Some("Wed, 21 Oct 2015 07:28:00 GMT".to_string());

        let page = parse_fetched(&fetched);
        assert_eq!(page.meta("last-modified"), Some("2024-01-01"));
    }

    #[test]
    fn test_strip_cdata_forms() {
        assert_eq!(strip_cdata("  <![CDATA[ {} ]]> "), "{}");
        assert_eq!(strip_cdata("//<![CDATA[\n{}\n//]]>"), "{}");
        assert_eq!(strip_cdata("{}"), "{}");
    }

    #[test]
    fn test_normalize_whitespace() {
        let input = "  hello   world  \n\t  test  ";
        assert_eq!(normalize_whitespace(input), "hello world test");
    }
}
