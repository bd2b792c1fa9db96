//! Downloader capability boundary
//!
//! The crawler core never talks to the network itself. It is handed a
//! [`Downloader`] that fetches a URL into a [`Document`], and documents know
//! how to extract their outgoing links. Production code uses the
//! reqwest-backed [`http::HttpDownloader`]; tests inject instrumented stubs.

pub mod http;

use crate::FetchError;
use async_trait::async_trait;

/// A fetched page that can report its outgoing links
///
/// Link extraction is CPU-bound parsing work and runs on the extraction
/// pool, so it is a plain synchronous call. Implementations resolve
/// relative references themselves; the crawler core passes extracted links
/// through verbatim.
pub trait Document: Send + Sync {
    /// Extracts the absolute URLs this document links to
    fn extract_links(&self) -> Result<Vec<String>, FetchError>;
}

/// Capability that downloads a URL into a [`Document`]
///
/// A failed fetch is an error local to that URL; the crawler records it and
/// moves on without retrying.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetches the given URL
    async fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError>;
}

pub use http::HttpDownloader;
