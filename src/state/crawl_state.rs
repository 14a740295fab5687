/// Pagination state definitions for a single seed user
///
/// A user starts at `Fetching { page: 1 }` and only ever moves forward: the
/// page number never decreases and a terminal state is never left.
use std::fmt;

/// Represents the current state of one user's following-list crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// A request for `page` is about to be issued
    Fetching { page: u32 },

    /// The last `attempt` fetches of `page` failed; the same page is fetched again
    Retry { page: u32, attempt: u32 },

    /// `page` was fetched and yielded `found` identifiers to record
    Processing { page: u32, found: usize },

    // ===== Terminal Success States =====
    /// `page` yielded no identifiers: the following list is exhausted
    Empty { page: u32 },

    /// The page ceiling was hit after `pages` processed pages
    MaxReached { pages: u32 },

    // ===== Terminal Error States =====
    /// `page` could not be fetched within the attempt budget
    Failed { page: u32, attempts: u32 },
}

impl CrawlState {
    /// The state every user starts in
    pub fn start() -> Self {
        Self::Fetching { page: 1 }
    }

    /// Transition taken when a fetch of `page` fails for the `attempt`-th time
    pub fn after_fetch_failure(page: u32, attempt: u32, max_attempts: u32) -> Self {
        if attempt >= max_attempts {
            Self::Failed {
                page,
                attempts: attempt,
            }
        } else {
            Self::Retry { page, attempt }
        }
    }

    /// Transition taken when `page` was fetched and `found` identifiers extracted
    pub fn after_extraction(page: u32, found: usize) -> Self {
        if found == 0 {
            Self::Empty { page }
        } else {
            Self::Processing { page, found }
        }
    }

    /// Transition taken once every identifier of `page` has been recorded
    pub fn after_processing(page: u32, max_page: u32) -> Self {
        if page >= max_page {
            Self::MaxReached { pages: page }
        } else {
            Self::Fetching { page: page + 1 }
        }
    }

    /// Returns true if this is a terminal state (the user is done)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Empty { .. } | Self::MaxReached { .. } | Self::Failed { .. }
        )
    }

    /// The page this state refers to
    pub fn page(&self) -> u32 {
        match *self {
            Self::Fetching { page }
            | Self::Retry { page, .. }
            | Self::Processing { page, .. }
            | Self::Empty { page }
            | Self::Failed { page, .. } => page,
            Self::MaxReached { pages } => pages,
        }
    }

    /// Short name of the state, used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fetching { .. } => "fetching",
            Self::Retry { .. } => "retry",
            Self::Processing { .. } => "processing",
            Self::Empty { .. } => "empty",
            Self::MaxReached { .. } => "max_reached",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (page {})", self.label(), self.page())
    }
}
