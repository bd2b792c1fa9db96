//! Fathom: a depth-bounded, breadth-first web crawler
//!
//! This crate implements a concurrent crawler core that fetches pages up to a
//! bounded depth while enforcing a global download cap, a global
//! link-extraction cap, and a per-host admission limit. The actual network
//! fetch and HTML parsing are injected as a [`fetch::Downloader`] capability;
//! an HTTP implementation backed by reqwest/scraper ships in [`fetch::http`].

pub mod config;
pub mod crawler;
pub mod fetch;
pub mod url;

use thiserror::Error;

/// Error returned by the `Downloader` capability for a single URL
///
/// Variants carry owned strings rather than source errors so that recorded
/// failures can be cloned into the crawl result and compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP status {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

/// Per-URL failure recorded in a crawl result
///
/// Every error is local to one URL; no variant ever aborts the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrawlError {
    #[error("malformed URL: {0}")]
    MalformedUrl(#[from] UrlError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("link extraction failed: {0}")]
    Extract(FetchError),
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
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{CrawlResult, WebCrawler};
pub use fetch::{Document, Downloader};
pub use self::url::extract_host;
