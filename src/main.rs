//! Follow-Ripple main entry point
//!
//! This is the command-line interface for the Follow-Ripple crawler.

use anyhow::Context;
use clap::Parser;
use follow_ripple::config::{load_config_with_hash, Config};
use follow_ripple::crawler::crawl;
use follow_ripple::store::{load_seed_list, load_stats, print_stats};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Follow-Ripple: an incremental following-graph crawler
///
/// Follow-Ripple pages through the following list of every user in the users
/// collection and appends each identifier it has never seen before to the
/// discovered followers collection.
#[derive(Parser, Debug)]
#[command(name = "follow-ripple")]
#[command(version = "1.0.0")]
#[command(about = "An incremental following-graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show collection statistics and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("follow_ripple=info,warn"),
            1 => EnvFilter::new("follow_ripple=debug,info"),
            2 => EnvFilter::new("follow_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved config and the seed list size
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Follow-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max page: {}", config.crawler.max_page);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Max attempts per page: {}", config.crawler.max_attempts);
    println!(
        "  Retry delay: {}ms doubling up to {}ms",
        config.crawler.retry_base_delay_ms, config.crawler.retry_max_delay_ms
    );
    println!("  Selector: {}", config.crawler.selector);

    println!("\nHTTP:");
    println!("  Base URL: {}", config.http.base_url);
    println!("  User agent: {}", config.http.user_agent);
    println!("  Accept language: {}", config.http.accept_language);
    println!("  Timeout: {}s", config.http.timeout_secs);

    println!("\nData:");
    println!("  Users: {}", config.data.users_path);
    println!("  Discovered followers: {}", config.data.followers_path);

    let seeds = load_seed_list(Path::new(&config.data.users_path))
        .context("Failed to read users collection")?;

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl the following lists of {} users", seeds.len());

    Ok(())
}

/// Handles the --stats mode: shows collection counts
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let stats = load_stats(&config.data).context("Failed to read collections")?;
    print_stats(&stats);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    match crawl(config).await {
        Ok(report) => {
            if !report.failed.is_empty() {
                tracing::warn!(
                    "{} users could not be crawled: {}",
                    report.failed.len(),
                    report.failed.join(", ")
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
