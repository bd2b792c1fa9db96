//! Crawler core
//!
//! This module contains the concurrent traversal machinery:
//! - Two bounded worker pools, one for downloads and one for link extraction
//! - Per-host admission gates bounding concurrent downloads to a single host
//! - A dynamic-registration barrier that closes out each breadth-first level
//! - The orchestrator wiring them together around shared crawl state

mod barrier;
mod host_gate;
mod orchestrator;
mod pool;
mod state;

pub use barrier::LevelBarrier;
pub use host_gate::{HostGate, HostGates};
pub use orchestrator::WebCrawler;
pub use pool::{Job, JobSender, WorkerPool};
pub use state::{CrawlResult, CrawlState};
