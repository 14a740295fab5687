//! State module for tracking crawl progress
//!
//! `CrawlState` is the per-user pagination state machine: fetching, retrying
//! and processing pages until one of the terminal states is reached.

mod crawl_state;

pub use crawl_state::CrawlState;
