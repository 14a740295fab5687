//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that pages through every seed user's
//! following list:
//! - Fetching pages through a [`PageSource`]
//! - Extracting identifiers from each page
//! - Recording new identifiers in the shared [`Registry`]
//! - Retrying failed fetches and stopping each user at its termination signal

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchResult, PageSource};
use crate::crawler::parser::{extract_identifiers, IdentifierSelector};
use crate::crawler::retry::RetryPolicy;
use crate::state::CrawlState;
use crate::store::Registry;
use crate::{ConfigError, CrawlError, Identifier};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

/// What happened while crawling one seed user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOutcome {
    /// The seed user
    pub user: Identifier,

    /// Terminal state the user ended in
    pub state: CrawlState,

    /// Pages fetched and processed (pages with at least one identifier)
    pub pages_processed: u32,

    /// Identifiers appended to the discovered collection
    pub discovered: usize,

    /// Failed fetch attempts across all pages
    pub fetch_failures: u32,
}

impl UserOutcome {
    fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
            state: CrawlState::start(),
            pages_processed: 0,
            discovered: 0,
            fetch_failures: 0,
        }
    }
}

/// Aggregated result of a crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Seed users crawled
    pub users: usize,

    /// Users whose following list ended with an empty page
    pub exhausted: usize,

    /// Users stopped by the page ceiling
    pub max_reached: usize,

    /// Users given up on after repeated fetch failures
    pub failed: Vec<Identifier>,

    /// Pages processed over all users
    pub pages_processed: u64,

    /// Identifiers appended to the discovered collection
    pub discovered: usize,

    /// Failed fetch attempts over all users
    pub fetch_failures: u64,
}

impl CrawlReport {
    /// Folds one user outcome into the report
    pub fn add(&mut self, outcome: &UserOutcome) {
        self.users += 1;
        match outcome.state {
            CrawlState::Empty { .. } => self.exhausted += 1,
            CrawlState::MaxReached { .. } => self.max_reached += 1,
            CrawlState::Failed { .. } => self.failed.push(outcome.user.clone()),
            _ => {}
        }
        self.pages_processed += u64::from(outcome.pages_processed);
        self.discovered += outcome.discovered;
        self.fetch_failures += u64::from(outcome.fetch_failures);
    }
}

/// Main crawler structure
///
/// The registry is shared: several crawlers (or several users of the same
/// crawler) can record into it at once.
pub struct Crawler<S: PageSource> {
    source: S,
    registry: Arc<Registry>,
    selector: IdentifierSelector,
    retry: RetryPolicy,
    max_page: u32,
    concurrency: usize,
}

impl<S: PageSource> Crawler<S> {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `source` - Where pages come from
    /// * `registry` - Known set and discovered collection
    /// * `config` - Crawl loop settings
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(ConfigError)` - The configured selector is invalid
    pub fn new(
        source: S,
        registry: Arc<Registry>,
        config: &CrawlerConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            source,
            registry,
            selector: IdentifierSelector::parse(&config.selector)?,
            retry: RetryPolicy::from_config(config),
            max_page: config.max_page,
            concurrency: config.concurrency.max(1),
        })
    }

    /// The registry this crawler records into
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Crawls the following list of every seed user
    ///
    /// Users are crawled `concurrency` at a time; with a concurrency of one
    /// they are crawled strictly in seed order.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Every seed user reached a terminal state
    /// * `Err(CrawlError)` - Recording an identifier failed; the run stops
    pub async fn run(&self, seeds: &[Identifier]) -> Result<CrawlReport, CrawlError> {
        tracing::info!(
            "Starting crawl of {} seed users ({} at a time)",
            seeds.len(),
            self.concurrency
        );
        let start_time = Instant::now();

        let mut outcomes = stream::iter(seeds)
            .map(|user| self.crawl_user(user))
            .buffer_unordered(self.concurrency);

        let mut report = CrawlReport::default();
        while let Some(outcome) = outcomes.next().await {
            let outcome = outcome?;
            report.add(&outcome);

            if report.users % 10 == 0 {
                tracing::info!(
                    "Progress: {}/{} users crawled, {} new identifiers",
                    report.users,
                    seeds.len(),
                    report.discovered
                );
            }
        }

        tracing::info!(
            "Crawl completed in {:?}: {} users ({} exhausted, {} at page ceiling, {} failed), {} pages, {} new identifiers, {} fetch failures",
            start_time.elapsed(),
            report.users,
            report.exhausted,
            report.max_reached,
            report.failed.len(),
            report.pages_processed,
            report.discovered,
            report.fetch_failures
        );

        Ok(report)
    }

    /// Pages through one user's following list until a terminal state
    pub async fn crawl_user(&self, user: &str) -> Result<UserOutcome, CrawlError> {
        let mut outcome = UserOutcome::new(user);
        let mut state = CrawlState::start();
        let mut pending: Vec<Identifier> = Vec::new();

        while !state.is_terminal() {
            state = match state {
                CrawlState::Fetching { page } => {
                    self.fetch(user, page, 0, &mut pending, &mut outcome).await
                }

                CrawlState::Retry { page, attempt } => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(
                        "Retrying {} page {} in {:?} (attempt {} of {})",
                        user,
                        page,
                        delay,
                        attempt + 1,
                        self.retry.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    self.fetch(user, page, attempt, &mut pending, &mut outcome)
                        .await
                }

                CrawlState::Processing { page, found } => {
                    let mut new_on_page = 0;
                    for identifier in pending.drain(..) {
                        if self.registry.record(&identifier)? {
                            tracing::trace!("Discovered {}", identifier);
                            new_on_page += 1;
                        } else {
                            tracing::trace!("Skipping known {}", identifier);
                        }
                    }

                    outcome.pages_processed += 1;
                    outcome.discovered += new_on_page;
                    tracing::info!(
                        "Processed {} page {} ({} found, {} new)",
                        user,
                        page,
                        found,
                        new_on_page
                    );

                    CrawlState::after_processing(page, self.max_page)
                }

                terminal => terminal,
            };
        }

        match state {
            CrawlState::Empty { page } => {
                tracing::info!("Following list of {} exhausted at page {}", user, page);
            }
            CrawlState::MaxReached { pages } => {
                tracing::info!("Reached page ceiling for {} after {} pages", user, pages);
            }
            CrawlState::Failed { page, attempts } => {
                tracing::warn!(
                    "Giving up on {} after {} failed attempts at page {}",
                    user,
                    attempts,
                    page
                );
            }
            _ => {}
        }

        outcome.state = state;
        Ok(outcome)
    }

    /// Issues one fetch of `page` and computes the next state
    ///
    /// `failures` is the number of failed attempts for this page so far.
    async fn fetch(
        &self,
        user: &str,
        page: u32,
        failures: u32,
        pending: &mut Vec<Identifier>,
        outcome: &mut UserOutcome,
    ) -> CrawlState {
        match self.source.fetch_page(user, page).await {
            FetchResult::Success { body } => {
                *pending = extract_identifiers(&body, &self.selector);
                CrawlState::after_extraction(page, pending.len())
            }
            FetchResult::Failure { .. } => {
                outcome.fetch_failures += 1;
                CrawlState::after_fetch_failure(page, failures + 1, self.retry.max_attempts)
            }
        }
    }
}
