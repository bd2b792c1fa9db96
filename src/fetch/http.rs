//! HTTP implementation of the downloader capability
//!
//! Fetches pages with a shared reqwest client and extracts links with
//! scraper. Network failures are classified into the fetch error taxonomy;
//! the crawler never sees a reqwest error directly.

use crate::fetch::{Document, Downloader};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Downloader backed by a reqwest HTTP client
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Creates a downloader with a freshly built HTTP client
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }

    /// Creates a downloader around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Redirects may have moved us; relative links resolve against the
        // final URL, not the requested one.
        let final_url = response.url().clone();

        let body = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("Fetched {} ({} bytes)", url, body.len());

        Ok(Box::new(HtmlPage {
            base_url: final_url,
            body,
        }))
    }
}

/// A fetched HTML page
pub struct HtmlPage {
    base_url: Url,
    body: String,
}

impl HtmlPage {
    pub fn new(base_url: Url, body: String) -> Self {
        Self { base_url, body }
    }
}

impl Document for HtmlPage {
    fn extract_links(&self) -> Result<Vec<String>, FetchError> {
        let document = Html::parse_document(&self.body);

        let selector = Selector::parse("a[href]").map_err(|e| FetchError::Parse {
            url: self.base_url.to_string(),
            message: e.to_string(),
        })?;

        let mut links = Vec::new();
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, &self.base_url) {
                    links.push(absolute);
                }
            }
        }

        Ok(links)
    }
}

/// Resolves a link href to an absolute URL
///
/// Returns None for links that should never be crawled: javascript/mailto/
/// tel/data schemes, fragment-only references, and hrefs that fail to
/// resolve against the base URL.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let lower = trimmed.to_lowercase();
    for scheme in ["javascript:", "mailto:", "tel:", "data:"] {
        if lower.starts_with(scheme) {
            return None;
        }
    }

    let resolved = base_url.join(trimmed).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> HtmlPage {
        HtmlPage::new(Url::parse("https://example.com/dir/page").unwrap(), body.to_string())
    }

    #[test]
    fn test_build_downloader() {
        assert!(HttpDownloader::new("fathom-test/0.2").is_ok());
    }

    #[test]
    fn test_extract_absolute_links() {
        let p = page(r#"<a href="https://other.com/x">x</a>"#);
        assert_eq!(p.extract_links().unwrap(), vec!["https://other.com/x"]);
    }

    #[test]
    fn test_extract_relative_links() {
        let p = page(r#"<a href="sibling">s</a><a href="/root">r</a>"#);
        assert_eq!(
            p.extract_links().unwrap(),
            vec![
                "https://example.com/dir/sibling",
                "https://example.com/root"
            ]
        );
    }

    #[test]
    fn test_skip_non_crawlable_schemes() {
        let p = page(
            r##"<a href="javascript:void(0)">j</a>
               <a href="mailto:a@b.c">m</a>
               <a href="tel:+123">t</a>
               <a href="#frag">f</a>"##,
        );
        assert!(p.extract_links().unwrap().is_empty());
    }

    #[test]
    fn test_skip_download_attribute() {
        let p = page(r#"<a href="/file.zip" download>get</a>"#);
        assert!(p.extract_links().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_html_still_yields_links() {
        // html5ever recovers from broken markup rather than failing.
        let p = page(r#"<div><a href="/ok">ok</a><span>"#);
        assert_eq!(p.extract_links().unwrap(), vec!["https://example.com/ok"]);
    }
}
