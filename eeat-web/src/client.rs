//! HTTP page fetching
//!
//! Creates browser-like HTTP clients and retries transient failures.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, LAST_MODIFIED};
use reqwest::{redirect, Client, Proxy, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Fetcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Fixed user agent; a random browser agent is used when unset
    pub user_agent: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures
    pub max_retries: u32,
    /// Base delay between retries in milliseconds, multiplied by the attempt number
    pub retry_backoff_ms: u64,
    /// HTTP or SOCKS proxy URL (e.g. `socks5h://127.0.0.1:9050`)
    pub proxy: Option<String>,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: 20,
            max_retries: 2,
            retry_backoff_ms: 500,
            proxy: None,
            max_redirects: 10,
        }
    }
}

/// Errors from fetching a page
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Timed out fetching {url} after {after_ms}ms")]
    Timeout { url: String, after_ms: u64 },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether a retry might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Request(_) => true,
            FetchError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            FetchError::ClientBuild(_) | FetchError::InvalidUrl(_) => false,
        }
    }

    fn from_reqwest(url: &str, after_ms: u64, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                after_ms,
            }
        } else if e.is_builder() {
            FetchError::InvalidUrl(url.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// A successfully fetched HTML page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// URL as requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    pub html: String,
    /// Raw `Last-Modified` response header
    pub last_modified: Option<String>,
}

impl FetchedPage {
    /// A page with no redirect and no headers, mostly for tests and replays
    pub fn new(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            html: html.to_string(),
            last_modified: None,
        }
    }
}

/// Anything that can produce HTML for a URL
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        (**self).fetch(url).await
    }
}

/// User agents for rotation
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:137.0) Gecko/20100101 Firefox/137.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.4 Safari/605.1.15",
];

/// Get a random user agent
pub fn random_user_agent() -> &'static str {
    use rand::Rng;
    let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// Create an HTTP client for page fetching
pub fn create_client(config: &FetchConfig) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en,de;q=0.8"));

    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| random_user_agent().to_string());

    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(user_agent)
        .default_headers(headers)
        .redirect(redirect::Policy::limited(config.max_redirects));

    if let Some(proxy) = &config.proxy {
        let proxy = Proxy::all(proxy).map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| FetchError::ClientBuild(e.to_string()))
}

/// Check that a URL is absolute http(s)
pub fn validate_url(raw: &str) -> Result<url::Url, FetchError> {
    let parsed = url::Url::parse(raw.trim()).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(FetchError::InvalidUrl(raw.to_string())),
    }
}

/// `PageSource` over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    config: FetchConfig,
}

impl HttpSource {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = create_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let timeout_ms = self.config.timeout_secs * 1000;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, timeout_ms, e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, timeout_ms, e))?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            html,
            last_modified,
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        validate_url(url)?;

        let mut attempt = 0;
        loop {
            debug!("Fetching {} (attempt {})", url, attempt + 1);
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!("Fetch of {} failed ({}), retrying", url, e);
                    let delay = self.config.retry_backoff_ms * u64::from(attempt);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn quick_config() -> FetchConfig {
        FetchConfig {
            timeout_secs: 5,
            max_retries: 2,
            retry_backoff_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout_secs, 20);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_random_user_agent() {
        let ua = random_user_agent();
        assert!(ua.contains("Mozilla"));
    }

    #[test]
    fn test_transient_classification() {
        let status = |status| FetchError::Status {
            status,
            url: "https://example.com".to_string(),
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(!FetchError::InvalidUrl("x".to_string()).is_transient());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_fetch_returns_html_and_last_modified() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/article");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .header("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT")
                .body("<html><body>hi</body></html>");
        });

        let source = HttpSource::new(quick_config()).unwrap();
        let page = source.fetch(&server.url("/article")).await.unwrap();
        mock.assert();

        assert_eq!(page.status, 200);
        assert!(page.html.contains("hi"));
        assert_eq!(page.last_modified.as_deref(), Some("Wed, 21 Oct 2015 07:28:00 GMT"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let source = HttpSource::new(quick_config()).unwrap();
        let err = source.fetch(&server.url("/missing")).await.unwrap_err();

        mock.assert_hits(1);
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });

        let source = HttpSource::new(quick_config()).unwrap();
        let err = source.fetch(&server.url("/flaky")).await.unwrap_err();

        mock.assert_hits(3);
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_fast() {
        let source = HttpSource::new(quick_config()).unwrap();
        let err = source.fetch("mailto:someone@example.com").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
