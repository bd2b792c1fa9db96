//! Shared crawl state
//!
//! One `CrawlState` exists per crawl invocation and is shared by every task
//! the invocation spawns. The visited set is the sole deduplication gate:
//! whichever concurrent discoverer wins the insert race schedules the URL.

use crate::CrawlError;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Result of one crawl invocation
#[derive(Debug, Default)]
pub struct CrawlResult {
    /// URLs fetched successfully
    pub downloaded: HashSet<String>,

    /// Failure cause per URL that was discovered but not downloaded
    pub errors: HashMap<String, CrawlError>,
}

/// Concurrency-safe sets and maps for one crawl invocation
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: Mutex<HashSet<String>>,
    downloaded: Mutex<HashSet<String>>,
    errors: Mutex<HashMap<String, CrawlError>>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically marks a URL as visited
    ///
    /// Returns true if this caller is the first to discover the URL and is
    /// therefore responsible for scheduling it. Membership is write-once; a
    /// URL can never re-enter the frontier.
    pub fn mark_visited(&self, url: &str) -> bool {
        self.visited.lock().unwrap().insert(url.to_string())
    }

    /// Records a successful fetch
    pub fn record_downloaded(&self, url: &str) {
        self.downloaded.lock().unwrap().insert(url.to_string());
    }

    /// Records a failure for a URL
    ///
    /// At most one entry exists per URL; when concurrent failures race for
    /// the same slot the last write wins, with no deterministic tie-break.
    /// A URL is never both a success and a failure: an extraction error
    /// arriving after a successful fetch demotes the URL to the error map.
    pub fn record_error(&self, url: &str, cause: CrawlError) {
        self.downloaded.lock().unwrap().remove(url);
        self.errors.lock().unwrap().insert(url.to_string(), cause);
    }

    /// Drains the state into a result
    ///
    /// Called by the orchestrator after all levels have quiesced, when no
    /// task can mutate the state anymore.
    pub fn take_result(&self) -> CrawlResult {
        CrawlResult {
            downloaded: std::mem::take(&mut *self.downloaded.lock().unwrap()),
            errors: std::mem::take(&mut *self.errors.lock().unwrap()),
        }
    }

    #[cfg(test)]
    pub fn visited_count(&self) -> usize {
        self.visited.lock().unwrap().len()
    }
}
