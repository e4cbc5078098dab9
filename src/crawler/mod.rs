//! Crawler module for page fetching and crawl control
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with browser-equivalent headers and retry logic
//! - Link and pagination discovery on listing pages
//! - Crawl-unit scheduling across a bounded worker pool
//! - Overall run orchestration and summary reporting

mod controller;
mod discover;
mod fetcher;
mod unit;

pub use controller::{Controller, RunSummary};
pub use discover::{find_detail_links, find_next_page};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use unit::{CrawlUnit, PageRole};

use crate::config::Config;
use crate::sink::RecordSink;
use crate::Result;

/// Runs a complete scrape operation
///
/// This is the main entry point for starting a scrape. It will:
/// 1. Build the HTTP client
/// 2. Resolve and seed the start URLs
/// 3. Fetch listing pages and follow product links
/// 4. Extract, merge, and emit product records into the sink
/// 5. Report the run summary
///
/// # Arguments
///
/// * `config` - The scraper configuration
/// * `sink` - Destination for emitted product records
///
/// # Returns
///
/// * `Ok(RunSummary)` - Scrape completed, with final counters
/// * `Err(ScrapeError)` - Scrape failed before or during the run
pub async fn scrape(config: Config, sink: Box<dyn RecordSink + Send>) -> Result<RunSummary> {
    let controller = Controller::new(config, sink)?;
    controller.run().await
}
