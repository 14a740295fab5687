use crate::config::types::{Config, CrawlerConfig, DataConfig, HttpConfig};
use crate::crawler::IdentifierSelector;
use crate::ConfigError;
use url::Url;

const MAX_CONCURRENCY: usize = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_data_config(&config.data)?;
    Ok(())
}

/// Validates crawl loop configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_page < 1 {
        return Err(ConfigError::Validation(
            "max_page must be >= 1, got 0".to_string(),
        ));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max_attempts must be >= 1, got 0".to_string(),
        ));
    }

    if config.retry_base_delay_ms > config.retry_max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry_base_delay_ms ({}) cannot exceed retry_max_delay_ms ({})",
            config.retry_base_delay_ms, config.retry_max_delay_ms
        )));
    }

    IdentifierSelector::parse(&config.selector)?;

    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1, got 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates record collection paths
fn validate_data_config(config: &DataConfig) -> Result<(), ConfigError> {
    if config.users_path.is_empty() {
        return Err(ConfigError::Validation(
            "users_path cannot be empty".to_string(),
        ));
    }

    if config.followers_path.is_empty() {
        return Err(ConfigError::Validation(
            "followers_path cannot be empty".to_string(),
        ));
    }

    // The primary collection is read only
    if config.users_path == config.followers_path {
        return Err(ConfigError::Validation(format!(
            "users_path and followers_path must differ, both are '{}'",
            config.users_path
        )));
    }

    Ok(())
}
