//! Fathom command-line entry point
//!
//! Crawls breadth-first from a start URL and prints every downloaded URL
//! along with the failures encountered on the way.

use anyhow::Context;
use clap::Parser;
use fathom::config::{load_config, CrawlConfig};
use fathom::fetch::HttpDownloader;
use fathom::WebCrawler;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Fathom: a depth-bounded breadth-first web crawler
#[derive(Parser, Debug)]
#[command(name = "fathom")]
#[command(about = "A depth-bounded breadth-first web crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// How many levels to crawl (1 fetches only the start URL)
    #[arg(value_name = "DEPTH")]
    depth: Option<usize>,

    /// Number of concurrent download workers
    #[arg(value_name = "DOWNLOADS")]
    downloads: Option<usize>,

    /// Number of concurrent link-extraction workers
    #[arg(value_name = "EXTRACTORS")]
    extractors: Option<usize>,

    /// Maximum simultaneous downloads to a single host
    #[arg(value_name = "PER_HOST")]
    per_host: Option<usize>,

    /// Path to a TOML configuration file (positional arguments override it)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => CrawlConfig::default(),
    };
    if let Some(n) = cli.downloads {
        config.download_workers = n;
    }
    if let Some(n) = cli.extractors {
        config.extract_workers = n;
    }
    if let Some(n) = cli.per_host {
        config.per_host_limit = n;
    }
    let depth = cli.depth.unwrap_or(1);

    let downloader = HttpDownloader::new(USER_AGENT).context("failed to build HTTP client")?;
    let crawler =
        WebCrawler::new(Arc::new(downloader), &config).context("invalid configuration")?;

    tracing::info!(
        depth,
        download_workers = config.download_workers,
        extract_workers = config.extract_workers,
        per_host_limit = config.per_host_limit,
        "crawling {}",
        cli.url
    );

    let result = crawler.crawl(&cli.url, depth).await;
    crawler.close().await;

    let mut downloaded: Vec<&String> = result.downloaded.iter().collect();
    downloaded.sort();
    println!("Downloaded {} page(s):", downloaded.len());
    for url in downloaded {
        println!("  {}", url);
    }

    if !result.errors.is_empty() {
        let mut errors: Vec<(&String, String)> = result
            .errors
            .iter()
            .map(|(url, cause)| (url, cause.to_string()))
            .collect();
        errors.sort();
        println!("Failed {} page(s):", errors.len());
        for (url, cause) in errors {
            println!("  {}: {}", url, cause);
        }
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fathom=info,warn"),
            1 => EnvFilter::new("fathom=debug,info"),
            2 => EnvFilter::new("fathom=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
