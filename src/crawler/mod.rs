//! Crawler module for following-list pagination
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and failure classification
//! - Identifier extraction from following pages
//! - Retry policy for failed fetches
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod retry;

pub use coordinator::{CrawlReport, Crawler, UserOutcome};
pub use fetcher::{
    build_http_client, fetch_url, following_url, FailureKind, FetchResult, HttpPageSource,
    PageSource,
};
pub use parser::{extract_identifiers, IdentifierSelector, DEFAULT_SELECTOR};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::store::open_store;
use crate::CrawlError;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the seed list and the known set from both collections
/// 2. Open the discovered followers collection for appending
/// 3. Build the HTTP client
/// 4. Page through every seed user's following list
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Every seed user was crawled
/// * `Err(CrawlError)` - A collection could not be read or written
///
/// # Example
///
/// ```no_run
/// use follow_ripple::config::load_config;
/// use follow_ripple::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = crawl(&config).await?;
/// println!("{} new identifiers", report.discovered);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config) -> Result<CrawlReport, CrawlError> {
    let (registry, seeds) = open_store(&config.data)?;
    let source = HttpPageSource::new(&config.http)?;

    let crawler = Crawler::new(source, Arc::new(registry), &config.crawler)?;
    crawler.run(&seeds).await
}
