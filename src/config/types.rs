use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Follow-Ripple
///
/// Every section and key is optional; missing values fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub data: DataConfig,
}

/// Crawl loop behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Highest page number fetched for a single user
    pub max_page: u32,

    /// Number of seed users crawled at the same time
    pub concurrency: usize,

    /// Fetch attempts per page before the user is given up on
    pub max_attempts: u32,

    /// Delay before the first retry of a page (milliseconds)
    pub retry_base_delay_ms: u64,

    /// Upper bound on the delay between retries (milliseconds)
    pub retry_max_delay_ms: u64,

    /// CSS selector matching the user links on a following page
    pub selector: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_page: 256,
            concurrency: 1,
            max_attempts: 5,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 30_000,
            selector: ".name".to_string(),
        }
    }
}

/// HTTP request identity configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Site root that following pages are resolved against
    pub base_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Accept-Language header sent with every request
    pub accept_language: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://letterboxd.com".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Record collection locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DataConfig {
    /// Primary users collection (seed list, read only)
    pub users_path: String,

    /// Discovered followers collection (append only)
    pub followers_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            users_path: "data/users.csv".to_string(),
            followers_path: "data/user_followers.csv".to_string(),
        }
    }
}
