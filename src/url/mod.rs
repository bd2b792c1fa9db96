//! URL handling for fathom
//!
//! The crawler core treats URLs as opaque strings and performs no
//! normalization; the only thing it ever derives from a URL is the host used
//! as the grouping key for per-host admission control.

use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the lowercase host from a URL string
///
/// The host is used only as a grouping key for admission control, so ports
/// and credentials are ignored. URLs that cannot yield a host are reported
/// as errors and must never be scheduled for download.
///
/// # Examples
///
/// ```
/// use fathom::extract_host;
///
/// assert_eq!(extract_host("https://Example.COM/path").unwrap(), "example.com");
/// assert!(extract_host("not a url").is_err());
/// ```
pub fn extract_host(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
    parsed
        .host_str()
        .map(|h| h.to_lowercase())
        .ok_or_else(|| UrlError::MissingHost(url.to_string()))
}
