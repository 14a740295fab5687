//! Identifier store
//!
//! This module handles the two CSV record collections the crawler works with:
//! - Loading the primary users collection (the seed list)
//! - Loading the discovered followers collection
//! - Building the known set from both
//! - Appending newly discovered identifiers exactly once

mod records;
mod registry;
mod traits;

pub use records::{load_existing, load_seed_list, union, FollowerLog, USER_ID_FIELD};
pub use registry::Registry;
pub use traits::{RecordSink, StoreError, StoreResult};

use crate::config::DataConfig;
use crate::Identifier;
use std::path::Path;

/// Opens both collections and prepares the registry for a crawl
///
/// # Arguments
///
/// * `data` - Locations of the users and followers collections
///
/// # Returns
///
/// * `Ok((Registry, Vec<Identifier>))` - The registry holding the known set and
///   the ordered seed list from the users collection
/// * `Err(StoreError)` - Either collection is unreadable or malformed
pub fn open_store(data: &DataConfig) -> StoreResult<(Registry, Vec<Identifier>)> {
    let users_path = Path::new(&data.users_path);
    let followers_path = Path::new(&data.followers_path);

    let seeds = load_seed_list(users_path)?;
    let discovered = load_existing(followers_path)?;
    let discovered_count = discovered.len();

    let known = union(seeds.iter().cloned().collect(), discovered);
    tracing::info!(
        "Loaded {} existing identifiers ({} users, {} discovered followers)",
        known.len(),
        seeds.len(),
        discovered_count
    );

    let log = FollowerLog::open(followers_path)?;
    Ok((Registry::new(known, log), seeds))
}

/// Record counts of both collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Distinct identifiers in the users collection
    pub users: usize,

    /// Distinct identifiers in the discovered followers collection
    pub discovered: usize,

    /// Size of the union of both collections
    pub known: usize,
}

/// Loads record counts without opening anything for writing
pub fn load_stats(data: &DataConfig) -> StoreResult<StoreStats> {
    let users = load_existing(Path::new(&data.users_path))?;
    let discovered = load_existing(Path::new(&data.followers_path))?;
    let (users_count, discovered_count) = (users.len(), discovered.len());

    Ok(StoreStats {
        users: users_count,
        discovered: discovered_count,
        known: union(users, discovered).len(),
    })
}

/// Prints store statistics to stdout
pub fn print_stats(stats: &StoreStats) {
    println!("=== Collection Statistics ===\n");
    println!("Users:                {}", stats.users);
    println!("Discovered followers: {}", stats.discovered);
    println!("Known (union):        {}", stats.known);
    println!(
        "Overlap:              {}",
        stats.users + stats.discovered - stats.known
    );
}
