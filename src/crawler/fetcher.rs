//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the fixed request identity
//! - Building following-page URLs
//! - GET requests to fetch page content
//! - Error classification
//!
//! A failed fetch is never an error for the caller. It is logged and handed
//! back as [`FetchResult::Failure`] so the crawl loop can decide whether to
//! retry.

use crate::config::HttpConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client};
use std::fmt;

/// Maximum number of redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// Class of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request did not complete within the timeout
    Timeout,

    /// Connection refused, DNS failure, TLS error
    Connect,

    /// The server answered with a non-2xx status
    Status(u16),

    /// Redirect loop or too many redirects
    Redirect,

    /// The response body could not be read
    Body,

    /// Anything reqwest does not classify further
    Other,
}

impl FailureKind {
    /// Classifies a reqwest error
    pub fn from_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect
        } else if error.is_redirect() {
            Self::Redirect
        } else if let Some(status) = error.status() {
            Self::Status(status.as_u16())
        } else if error.is_body() || error.is_decode() {
            Self::Body
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connect => write!(f, "connect"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Redirect => write!(f, "redirect"),
            Self::Body => write!(f, "body"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Page body content
        body: String,
    },

    /// The page could not be fetched
    Failure {
        /// The requested URL
        url: String,
        /// Why the fetch failed
        kind: FailureKind,
    },
}

impl FetchResult {
    /// The page body, if the fetch succeeded
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body } => Some(body),
            Self::Failure { .. } => None,
        }
    }
}

/// Source of following pages
///
/// The crawl loop only talks to this trait, so tests can script page
/// sequences without a network.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches page `page` (1-based) of `user`'s following list
    async fn fetch_page(&self, user: &str, page: u32) -> FetchResult;
}

/// Builds the URL of one following page
///
/// The pattern is `<base>/<user>following/page/<page>/`. Slashes are
/// normalised so that each part is separated by exactly one `/`.
///
/// # Example
///
/// ```
/// use follow_ripple::crawler::following_url;
///
/// assert_eq!(
///     following_url("https://example.com/", "/alice/", 2),
///     "https://example.com/alice/following/page/2/"
/// );
/// ```
pub fn following_url(base_url: &str, user: &str, page: u32) -> String {
    let base = base_url.trim_end_matches('/');
    let user = user.trim_matches('/');
    format!("{}/{}/following/page/{}/", base, user, page)
}

/// Builds an HTTP client with the configured request identity
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(CrawlError)` - A header value is invalid or the client failed to build
pub fn build_http_client(config: &HttpConfig) -> crate::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language)?,
    );

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches a URL and classifies any failure
///
/// Failures are logged with the target URL and the failure class.
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let result = match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            if response.url().as_str() != url {
                tracing::trace!("{} redirected to {}", url, response.url());
            }

            if !status.is_success() {
                FetchResult::Failure {
                    url: url.to_string(),
                    kind: FailureKind::Status(status.as_u16()),
                }
            } else {
                match response.text().await {
                    Ok(body) => FetchResult::Success { body },
                    Err(e) => FetchResult::Failure {
                        url: url.to_string(),
                        kind: FailureKind::from_error(&e),
                    },
                }
            }
        }
        Err(e) => FetchResult::Failure {
            url: url.to_string(),
            kind: FailureKind::from_error(&e),
        },
    };

    if let FetchResult::Failure { url, kind } = &result {
        tracing::warn!("Fetch failed for {}: {}", url, kind);
    }

    result
}

/// Page source backed by a real HTTP client
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    base_url: String,
}

impl HttpPageSource {
    /// Creates a page source from the HTTP configuration
    pub fn new(config: &HttpConfig) -> crate::Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, user: &str, page: u32) -> FetchResult {
        let url = following_url(&self.base_url, user, page);
        tracing::trace!("GET {}", url);
        fetch_url(&self.client, &url).await
    }
}
