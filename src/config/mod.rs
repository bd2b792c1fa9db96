//! Configuration for the crawler
//!
//! Pool sizes and the per-host limit can be loaded from a TOML file or built
//! directly. All limits are validated to be positive before a crawler is
//! constructed; an invalid configuration is a caller error, not a crawl
//! error.

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_WORKERS: usize = 10;
const DEFAULT_PER_HOST: usize = 10;
const DEFAULT_GRACE_MS: u64 = 1000;

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Number of concurrent download workers
    #[serde(rename = "download-workers", default = "default_workers")]
    pub download_workers: usize,

    /// Number of concurrent link-extraction workers
    #[serde(rename = "extract-workers", default = "default_workers")]
    pub extract_workers: usize,

    /// Maximum simultaneous downloads to a single host
    #[serde(rename = "per-host-limit", default = "default_per_host")]
    pub per_host_limit: usize,

    /// Milliseconds to wait for workers to exit on close
    #[serde(rename = "shutdown-grace-ms", default = "default_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_per_host() -> usize {
    DEFAULT_PER_HOST
}

fn default_grace_ms() -> u64 {
    DEFAULT_GRACE_MS
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            download_workers: DEFAULT_WORKERS,
            extract_workers: DEFAULT_WORKERS,
            per_host_limit: DEFAULT_PER_HOST,
            shutdown_grace_ms: DEFAULT_GRACE_MS,
        }
    }
}

impl CrawlConfig {
    /// Validates the configuration
    ///
    /// Every limit must be a positive integer; a zero-sized pool or host
    /// budget would silently stall the crawl, so it is rejected up front.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.download_workers == 0 {
            return Err(ConfigError::Validation(
                "download-workers must be at least 1".to_string(),
            ));
        }
        if self.extract_workers == 0 {
            return Err(ConfigError::Validation(
                "extract-workers must be at least 1".to_string(),
            ));
        }
        if self.per_host_limit == 0 {
            return Err(ConfigError::Validation(
                "per-host-limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The grace period workers get to observe cancellation on close
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Loads and validates a configuration file from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use fathom::config::load_config;
///
/// let config = load_config(Path::new("fathom.toml")).unwrap();
/// println!("Download workers: {}", config.download_workers);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<CrawlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: CrawlConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
