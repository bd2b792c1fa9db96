//! Crawl orchestration
//!
//! The orchestrator drives the level-by-level traversal: it seeds the
//! frontier, submits one download per frontier URL through that URL's host
//! gate, and blocks on the level barrier until every task spawned during
//! the level — downloads plus the extractions they chain — has finished.
//! Then frontiers swap and the next level begins.

use crate::config::CrawlConfig;
use crate::crawler::barrier::LevelBarrier;
use crate::crawler::host_gate::HostGates;
use crate::crawler::pool::{Job, JobSender, WorkerPool};
use crate::crawler::state::{CrawlResult, CrawlState};
use crate::fetch::{Document, Downloader};
use crate::url::extract_host;
use crate::{ConfigError, CrawlError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Breadth-first web crawler with bounded download and extraction pools
///
/// The pools are spawned at construction and reused across crawl
/// invocations; [`WebCrawler::close`] tears them down. Must be constructed
/// inside a tokio runtime.
pub struct WebCrawler {
    downloader: Arc<dyn Downloader>,
    downloads: WorkerPool,
    extracts: WorkerPool,
    hosts: HostGates,
    shutdown_grace: Duration,
    closed: AtomicBool,
}

impl WebCrawler {
    /// Creates a crawler around the given downloader capability
    ///
    /// Fails if the configuration does not pass validation; a zero-sized
    /// pool or per-host limit is a caller error.
    pub fn new(downloader: Arc<dyn Downloader>, config: &CrawlConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let downloads = WorkerPool::new("downloads", config.download_workers);
        let extracts = WorkerPool::new("extracts", config.extract_workers);
        let hosts = HostGates::new(config.per_host_limit, downloads.sender());

        tracing::debug!(
            download_workers = config.download_workers,
            extract_workers = config.extract_workers,
            per_host_limit = config.per_host_limit,
            "crawler ready"
        );

        Ok(Self {
            downloader,
            downloads,
            extracts,
            hosts,
            shutdown_grace: config.shutdown_grace(),
            closed: AtomicBool::new(false),
        })
    }

    /// Crawls breadth-first from `start_url` up to `depth` levels
    ///
    /// Depth 1 fetches only the start URL and never extracts links; at
    /// greater depths every successful fetch except those on the final
    /// level hands its document to the extraction pool, and first-time
    /// discoveries form the next level's frontier.
    ///
    /// Every failure is local to one URL and recorded in the result; no
    /// single failure aborts the traversal.
    pub async fn crawl(&self, start_url: &str, depth: usize) -> CrawlResult {
        if self.closed.load(Ordering::Acquire) {
            tracing::error!("crawl() called on a closed crawler");
            return CrawlResult::default();
        }

        let state = Arc::new(CrawlState::new());
        let barrier = Arc::new(LevelBarrier::new());
        let next_frontier: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        state.mark_visited(start_url);
        let mut frontier = vec![start_url.to_string()];

        let mut remaining = depth;
        while remaining > 0 && !frontier.is_empty() {
            tracing::debug!(urls = frontier.len(), remaining, "level starting");
            for url in frontier.drain(..) {
                self.submit_download(url, remaining > 1, &state, &barrier, &next_frontier);
            }
            barrier.await_level().await;
            frontier = std::mem::take(&mut *next_frontier.lock().unwrap());
            remaining -= 1;
        }

        // All levels have quiesced; the state is safe to read.
        let result = state.take_result();
        tracing::info!(
            downloaded = result.downloaded.len(),
            errors = result.errors.len(),
            "crawl finished for {}",
            start_url
        );
        result
    }

    /// Builds a download job for one URL and admits it through its host gate
    ///
    /// The barrier registration happens before the gate sees the job, so
    /// the task cannot complete before the level knows about it. A download
    /// always releases its gate slot and arrives at the barrier when its
    /// fetch attempt finishes, success or failure.
    fn submit_download(
        &self,
        url: String,
        go_deeper: bool,
        state: &Arc<CrawlState>,
        barrier: &Arc<LevelBarrier>,
        next_frontier: &Arc<Mutex<Vec<String>>>,
    ) {
        let host = match extract_host(&url) {
            Ok(host) => host,
            Err(e) => {
                tracing::debug!("not scheduling {}: {}", url, e);
                state.record_error(&url, CrawlError::MalformedUrl(e));
                return;
            }
        };

        let gate = self.hosts.gate_for(&host);
        barrier.register();

        let downloader = Arc::clone(&self.downloader);
        let extracts = self.extracts.sender();
        let state = Arc::clone(state);
        let barrier = Arc::clone(barrier);
        let next_frontier = Arc::clone(next_frontier);
        let release_gate = Arc::clone(&gate);

        gate.submit(Box::pin(async move {
            match downloader.fetch(&url).await {
                Ok(document) => {
                    tracing::trace!("downloaded {}", url);
                    state.record_downloaded(&url);
                    if go_deeper {
                        submit_extract(&extracts, document, url, &state, &barrier, &next_frontier);
                    }
                }
                Err(e) => {
                    tracing::debug!("fetch failed for {}: {}", url, e);
                    state.record_error(&url, CrawlError::Fetch(e));
                }
            }
            release_gate.release();
            barrier.arrive();
        }));
    }

    /// Shuts down both pools, discarding queued and in-flight work
    ///
    /// Waits up to the configured grace period per pool for workers to
    /// observe cancellation; a timeout is logged, never escalated. Safe to
    /// call once; later calls are no-ops, and a closed crawler must not be
    /// reused for new crawls.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!("closing crawler");
        self.downloads.shutdown(self.shutdown_grace).await;
        self.extracts.shutdown(self.shutdown_grace).await;
    }
}

/// Registers and enqueues the extraction task chained to a download
///
/// Registration precedes the parent download's own arrival, so the level
/// stays open until the extraction finishes even if every download is
/// already done.
fn submit_extract(
    extracts: &JobSender,
    document: Box<dyn Document>,
    url: String,
    state: &Arc<CrawlState>,
    barrier: &Arc<LevelBarrier>,
    next_frontier: &Arc<Mutex<Vec<String>>>,
) {
    barrier.register();

    let state = Arc::clone(state);
    let job_barrier = Arc::clone(barrier);
    let next_frontier = Arc::clone(next_frontier);

    let job: Job = Box::pin(async move {
        match document.extract_links() {
            Ok(links) => {
                let mut frontier = next_frontier.lock().unwrap();
                for link in links {
                    if state.mark_visited(&link) {
                        frontier.push(link);
                    }
                }
            }
            Err(e) => {
                tracing::debug!("extraction failed for {}: {}", url, e);
                state.record_error(&url, CrawlError::Extract(e));
            }
        }
        job_barrier.arrive();
    });

    if extracts.send(job).is_err() {
        // Pool already shut down mid-crawl; balance the registration so the
        // orchestrator is not left waiting on a job that will never run.
        tracing::debug!("extraction job discarded: pool is shut down");
        barrier.arrive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::http::HtmlPage;
    use crate::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use url::Url;

    /// Downloader serving a fixed link graph from memory
    struct GraphDownloader {
        pages: HashMap<String, Vec<String>>,
        failing: Vec<String>,
    }

    impl GraphDownloader {
        fn new(graph: &[(&str, &[&str])]) -> Self {
            let pages = graph
                .iter()
                .map(|(url, links)| {
                    (
                        url.to_string(),
                        links.iter().map(|l| l.to_string()).collect(),
                    )
                })
                .collect();
            Self {
                pages,
                failing: Vec::new(),
            }
        }

        fn failing(mut self, url: &str) -> Self {
            self.failing.push(url.to_string());
            self
        }
    }

    #[async_trait]
    impl Downloader for GraphDownloader {
        async fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
            if self.failing.iter().any(|f| f == url) {
                return Err(FetchError::Http {
                    url: url.to_string(),
                    status: 500,
                });
            }
            let links = self.pages.get(url).cloned().unwrap_or_default();
            let body = links
                .iter()
                .map(|l| format!(r#"<a href="{}">link</a>"#, l))
                .collect::<String>();
            Ok(Box::new(HtmlPage::new(Url::parse(url).unwrap(), body)))
        }
    }

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            download_workers: 4,
            extract_workers: 2,
            per_host_limit: 4,
            shutdown_grace_ms: 200,
        }
    }

    #[tokio::test]
    async fn test_two_level_crawl() {
        let graph = GraphDownloader::new(&[
            ("https://a.com/", &["https://a.com/b", "https://c.com/"]),
            ("https://a.com/b", &["https://d.com/"]),
        ]);
        let crawler = WebCrawler::new(Arc::new(graph), &test_config()).unwrap();

        let result = crawler.crawl("https://a.com/", 2).await;
        // D is a level-2 discovery; depth 2 never schedules it.
        let expected: Vec<&str> = vec!["https://a.com/", "https://a.com/b", "https://c.com/"];
        assert_eq!(result.downloaded.len(), expected.len());
        for url in expected {
            assert!(result.downloaded.contains(url), "missing {}", url);
        }
        assert!(result.errors.is_empty());

        crawler.close().await;
    }

    #[tokio::test]
    async fn test_fetch_failure_recorded_and_crawl_continues() {
        let graph = GraphDownloader::new(&[(
            "https://a.com/",
            &["https://a.com/b", "https://c.com/"],
        )])
        .failing("https://c.com/");
        let crawler = WebCrawler::new(Arc::new(graph), &test_config()).unwrap();

        let result = crawler.crawl("https://a.com/", 2).await;
        assert!(result.downloaded.contains("https://a.com/"));
        assert!(result.downloaded.contains("https://a.com/b"));
        assert!(matches!(
            result.errors.get("https://c.com/"),
            Some(CrawlError::Fetch(FetchError::Http { status: 500, .. }))
        ));

        crawler.close().await;
    }

    #[tokio::test]
    async fn test_malformed_start_url() {
        let graph = GraphDownloader::new(&[]);
        let crawler = WebCrawler::new(Arc::new(graph), &test_config()).unwrap();

        let result = crawler.crawl("::not-a-url::", 3).await;
        assert!(result.downloaded.is_empty());
        assert!(matches!(
            result.errors.get("::not-a-url::"),
            Some(CrawlError::MalformedUrl(_))
        ));

        crawler.close().await;
    }

    #[tokio::test]
    async fn test_depth_zero_is_empty() {
        let graph = GraphDownloader::new(&[("https://a.com/", &[])]);
        let crawler = WebCrawler::new(Arc::new(graph), &test_config()).unwrap();

        let result = crawler.crawl("https://a.com/", 0).await;
        assert!(result.downloaded.is_empty());
        assert!(result.errors.is_empty());

        crawler.close().await;
    }

    #[tokio::test]
    async fn test_crawler_reusable_across_invocations() {
        let graph = GraphDownloader::new(&[("https://a.com/", &["https://a.com/b"])]);
        let crawler = WebCrawler::new(Arc::new(graph), &test_config()).unwrap();

        let first = crawler.crawl("https://a.com/", 2).await;
        let second = crawler.crawl("https://a.com/", 2).await;
        assert_eq!(first.downloaded, second.downloaded);

        crawler.close().await;
    }

    #[tokio::test]
    async fn test_closed_crawler_returns_empty_result() {
        let graph = GraphDownloader::new(&[("https://a.com/", &[])]);
        let crawler = WebCrawler::new(Arc::new(graph), &test_config()).unwrap();
        crawler.close().await;

        let result = crawler.crawl("https://a.com/", 1).await;
        assert!(result.downloaded.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let graph = GraphDownloader::new(&[]);
        let config = CrawlConfig {
            download_workers: 0,
            ..test_config()
        };
        assert!(matches!(
            WebCrawler::new(Arc::new(graph), &config),
            Err(ConfigError::Validation(_))
        ));
    }
}
