//! Store traits and error types
//!
//! This module defines the append-only sink interface behind the registry and
//! the error type shared by every store operation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations
///
/// Any of these stops the crawl: there is no partial recovery for an
/// unreadable collection or a failed append.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read collection {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },

    #[error("Failed to write collection {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Known set lock was poisoned by a panicking worker")]
    Poisoned,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only destination for newly discovered identifiers
///
/// Implementations must make the record durable (or fail) before returning,
/// since the caller marks the identifier as known right after.
pub trait RecordSink {
    /// Appends one identifier record
    fn append(&mut self, identifier: &str) -> StoreResult<()>;
}
