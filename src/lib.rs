//! Follow-Ripple: an incremental "following" graph crawler
//!
//! This crate pages through the following list of every user recorded in a
//! primary CSV collection, extracts the user identifiers referenced on each
//! page and appends the ones it has never seen before to a discovered
//! followers collection. Identifiers already present in either collection are
//! never written again, so repeated runs only add new work.

pub mod config;
pub mod crawler;
pub mod state;
pub mod store;

use thiserror::Error;

/// Opaque user identifier (a URL path fragment such as `/alice/`)
pub type Identifier = String;

/// Main error type for Follow-Ripple operations
///
/// Every variant is fatal for a run. Recoverable conditions such as a failed
/// page fetch are reported through [`crawler::FetchResult`] instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Follow-Ripple operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Crawler, UserOutcome};
pub use state::CrawlState;
pub use store::Registry;
