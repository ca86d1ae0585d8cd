//! Page data produced by the DOM extractor
//!
//! `PageData` is immutable once built: detectors only ever borrow it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{parse_date, property_text, typed_objects};

/// A `<time>` element found in the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeElement {
    /// The `datetime` attribute, if present
    pub datetime: Option<String>,
    /// Inner text, whitespace-normalized
    pub text: String,
}

/// A JSON-LD block that failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonLdError {
    /// Position of the `<script>` block in document order
    pub index: usize,
    /// Parser message
    pub message: String,
}

/// Where a resolved date came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "camelCase")]
pub enum DateSource {
    /// A JSON-LD property (`datePublished` / `dateModified`)
    JsonLd(String),
    /// A meta tag, keyed by its lower-cased name
    MetaTag(String),
    /// A `<time datetime>` element
    TimeElement,
    /// A date shown next to the link on a blog index page
    IndexHint,
}

/// A date resolved from page data, with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDate {
    pub at: DateTime<Utc>,
    pub source: DateSource,
    pub raw: String,
}

/// Meta tags consulted for the publish date, in priority order
const PUBLISHED_META_KEYS: &[&str] = &[
    "article:published_time",
    "dc.date",
    "dc.date.issued",
    "dcterms.created",
    "date",
    "datepublished",
];

/// Meta tags consulted for the modification date, in priority order
const MODIFIED_META_KEYS: &[&str] = &[
    "article:modified_time",
    "og:updated_time",
    "dcterms.modified",
    "datemodified",
    "last-modified",
];

/// Structured data extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    url: String,
    #[serde(skip_serializing, default)]
    html: String,
    title: Option<String>,
    meta_tags: BTreeMap<String, String>,
    json_ld_blocks: Vec<Value>,
    json_ld_errors: Vec<JsonLdError>,
    visible_text: String,
    time_elements: Vec<TimeElement>,
}

impl PageData {
    /// Create a new page data builder
    pub fn builder(url: &str) -> PageDataBuilder {
        PageDataBuilder::new(url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// All meta tags, keys lower-cased
    pub fn meta_tags(&self) -> &BTreeMap<String, String> {
        &self.meta_tags
    }

    /// Look up a meta tag case-insensitively
    pub fn meta(&self, name: &str) -> Option<&str> {
        self.meta_tags
            .get(&name.to_lowercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Successfully parsed JSON-LD payloads, one per `<script>` block
    pub fn json_ld_blocks(&self) -> &[Value] {
        &self.json_ld_blocks
    }

    /// Blocks that failed to parse
    pub fn json_ld_errors(&self) -> &[JsonLdError] {
        &self.json_ld_errors
    }

    /// All JSON-LD objects across every block, arrays and `@graph` flattened
    pub fn json_ld_objects(&self) -> Vec<&Map<String, Value>> {
        self.json_ld_blocks.iter().flat_map(typed_objects).collect()
    }

    pub fn visible_text(&self) -> &str {
        &self.visible_text
    }

    pub fn time_elements(&self) -> &[TimeElement] {
        &self.time_elements
    }

    /// Best-effort publish date: JSON-LD, then meta tags, then `<time>`
    pub fn published_at(&self) -> Option<ResolvedDate> {
        self.published_dates().into_iter().next()
    }

    /// Best-effort modification date: JSON-LD, then meta tags
    pub fn modified_at(&self) -> Option<ResolvedDate> {
        self.modified_dates().into_iter().next()
    }

    /// Every parseable publish date, in `published_at` priority order
    pub fn published_dates(&self) -> Vec<ResolvedDate> {
        let mut dates = self.json_ld_dates("datePublished");
        dates.extend(self.meta_dates(PUBLISHED_META_KEYS));
        dates.extend(self.time_element_dates());
        dates
    }

    /// Every parseable modification date, in `modified_at` priority order
    pub fn modified_dates(&self) -> Vec<ResolvedDate> {
        let mut dates = self.json_ld_dates("dateModified");
        dates.extend(self.meta_dates(MODIFIED_META_KEYS));
        dates
    }

    fn json_ld_dates(&self, key: &str) -> Vec<ResolvedDate> {
        self.json_ld_objects()
            .into_iter()
            .filter_map(|object| {
                let raw = property_text(object, key)?;
                let at = parse_date(&raw)?;
                Some(ResolvedDate {
                    at,
                    source: DateSource::JsonLd(key.to_string()),
                    raw,
                })
            })
            .collect()
    }

    fn meta_dates(&self, keys: &[&str]) -> Vec<ResolvedDate> {
        keys.iter()
            .filter_map(|key| {
                let raw = self.meta(key)?;
                let at = parse_date(raw)?;
                Some(ResolvedDate {
                    at,
                    source: DateSource::MetaTag(key.to_string()),
                    raw: raw.to_string(),
                })
            })
            .collect()
    }

    fn time_element_dates(&self) -> Vec<ResolvedDate> {
        self.time_elements
            .iter()
            .filter_map(|el| {
                let raw = el.datetime.as_deref()?;
                let at = parse_date(raw)?;
                Some(ResolvedDate {
                    at,
                    source: DateSource::TimeElement,
                    raw: raw.to_string(),
                })
            })
            .collect()
    }
}

/// Builder for page data
pub struct PageDataBuilder {
    page: PageData,
}

impl PageDataBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            page: PageData {
                url: url.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn html(mut self, html: &str) -> Self {
        self.page.html = html.to_string();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        let title = title.trim();
        if !title.is_empty() {
            self.page.title = Some(title.to_string());
        }
        self
    }

    /// Add a meta tag; the first non-empty value for a key wins
    pub fn meta(mut self, name: &str, content: &str) -> Self {
        if name.trim().is_empty() || content.trim().is_empty() {
            return self;
        }
        self.page
            .meta_tags
            .entry(name.trim().to_lowercase())
            .or_insert_with(|| content.trim().to_string());
        self
    }

    pub fn json_ld_block(mut self, block: Value) -> Self {
        self.page.json_ld_blocks.push(block);
        self
    }

    pub fn json_ld_error(mut self, index: usize, message: &str) -> Self {
        self.page.json_ld_errors.push(JsonLdError {
            index,
            message: message.to_string(),
        });
        self
    }

    pub fn visible_text(mut self, text: &str) -> Self {
        self.page.visible_text = text.to_string();
        self
    }

    pub fn time_element(mut self, datetime: Option<&str>, text: &str) -> Self {
        self.page.time_elements.push(TimeElement {
            datetime: datetime.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            text: text.trim().to_string(),
        });
        self
    }

    pub fn build(self) -> PageData {
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_meta_lookup_is_case_insensitive() {
        let page = PageData::builder("https://example.com")
            .meta("DC.date", "2024-02-01")
            .meta("dc.date", "1999-01-01")
            .build();

        assert_eq!(page.meta("dc.DATE"), Some("2024-02-01"));
        assert_eq!(page.meta_tags().len(), 1);
    }

    #[test]
    fn test_published_prefers_json_ld() {
        let page = PageData::builder("https://example.com")
            .meta("article:published_time", "2020-01-01")
            .json_ld_block(json!([
                {"@type": "Organization"},
                {"@type": "Article", "datePublished": "2023-05-04"}
            ]))
            .build();

        let published = page.published_at().unwrap();
        assert_eq!(published.at, Utc.with_ymd_and_hms(2023, 5, 4, 0, 0, 0).unwrap());
        assert_eq!(published.source, DateSource::JsonLd("datePublished".to_string()));
    }

    #[test]
    fn test_published_falls_back_to_time_element() {
        let page = PageData::builder("https://example.com")
            .time_element(None, "yesterday")
            .time_element(Some("2022-12-24"), "Dec 24")
            .build();

        let published = page.published_at().unwrap();
        assert_eq!(published.source, DateSource::TimeElement);
        assert_eq!(published.raw, "2022-12-24");
    }

    #[test]
    fn test_modified_from_last_modified_meta() {
        let page = PageData::builder("https://example.com")
            .meta("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT")
            .build();

        let modified = page.modified_at().unwrap();
        assert_eq!(modified.source, DateSource::MetaTag("last-modified".to_string()));
    }

    #[test]
    fn test_modified_dates_lists_every_key_in_order() {
        let page = PageData::builder("https://example.com")
            .meta("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT")
            .meta("article:modified_time", "2030-01-01")
            .meta("og:updated_time", "not a date")
            .build();

        let dates = page.modified_dates();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].source, DateSource::MetaTag("article:modified_time".to_string()));
        assert_eq!(dates[1].source, DateSource::MetaTag("last-modified".to_string()));
        assert_eq!(page.modified_at(), Some(dates[0].clone()));
    }

    #[test]
    fn test_empty_time_datetime_is_none() {
        let page = PageData::builder("https://example.com")
            .time_element(Some("  "), "Heute")
            .build();
        assert_eq!(page.time_elements()[0].datetime, None);
    }
}
