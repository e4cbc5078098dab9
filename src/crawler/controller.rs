//! Crawl orchestration
//!
//! The controller owns the run: it seeds the frontier from the resolved
//! start URLs, fans units out to a bounded worker pool, and routes each
//! fetched page through the listing or detail handler. Page failures are
//! logged and skipped; only infrastructure failures (client construction,
//! sink teardown, worker panics) abort the run.
//!
//! Budget accounting lives in [`CrawlState`]. Workers check the budget
//! before fetching a detail page, so at most one batch of in-flight pages
//! can overshoot the target.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Config;
use crate::crawler::discover::{find_detail_links, find_next_page};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::unit::{CrawlUnit, PageRole};
use crate::extract::{build_listing_record, extract_detail_record, listing_candidates};
use crate::record::ProductRecord;
use crate::sink::RecordSink;
use crate::state::{CrawlState, UNBOUNDED};
use crate::url::resolve_start_urls;
use crate::Result;

/// Counters reported after a run completes
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub products_saved: usize,
    pub pages_visited: usize,
    pub elapsed: Duration,
    /// Configured result target; [`UNBOUNDED`] when no limit was set
    pub target: usize,
}

impl RunSummary {
    pub fn target_label(&self) -> String {
        if self.target == UNBOUNDED {
            "unbounded".to_string()
        } else {
            self.target.to_string()
        }
    }
}

/// Orchestrates a scrape run
///
/// Cheap to clone; every worker task holds its own handle onto the shared
/// frontier, state, and sink.
#[derive(Clone)]
pub struct Controller {
    config: Arc<Config>,
    client: Client,
    state: Arc<CrawlState>,
    frontier: Arc<Mutex<VecDeque<CrawlUnit>>>,
    sink: Arc<Mutex<Box<dyn RecordSink + Send>>>,
}

impl Controller {
    /// Creates a controller for the given configuration and output sink
    pub fn new(config: Config, sink: Box<dyn RecordSink + Send>) -> Result<Self> {
        let client = build_http_client(&config.fetcher)?;
        let state = Arc::new(CrawlState::new(
            config.limits.effective_results_wanted(),
            config.limits.max_pages,
        ));

        Ok(Self {
            config: Arc::new(config),
            client,
            state,
            frontier: Arc::new(Mutex::new(VecDeque::new())),
            sink: Arc::new(Mutex::new(sink)),
        })
    }

    /// Runs the crawl to completion
    ///
    /// The run ends when the frontier is empty and no worker is in flight.
    /// The budget and page ceiling make that state reachable: listing pages
    /// stop paginating once either is hit, and detail units admitted past
    /// the budget return without fetching.
    pub async fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();

        let start_urls = resolve_start_urls(&self.config.search)?;
        info!(
            start_urls = start_urls.len(),
            target = %self.state.target_label(),
            max_pages = self.config.limits.max_pages,
            "Starting scrape"
        );

        {
            let mut frontier = self.frontier.lock().unwrap();
            for url in start_urls {
                if self.state.admit(url.as_str()) {
                    frontier.push_back(CrawlUnit::list(url, 1));
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.fetcher.concurrency));
        let mut workers: JoinSet<()> = JoinSet::new();

        loop {
            while let Some(joined) = workers.try_join_next() {
                joined?;
            }

            let unit = { self.frontier.lock().unwrap().pop_front() };

            match unit {
                Some(unit) => {
                    let Ok(permit) = semaphore.clone().acquire_owned().await else {
                        break;
                    };
                    let controller = self.clone();
                    workers.spawn(async move {
                        let _permit = permit;
                        controller.process_unit(unit).await;
                    });
                }
                None => match workers.join_next().await {
                    // a finishing worker may have queued more units
                    Some(joined) => joined?,
                    None => break,
                },
            }
        }

        self.sink.lock().unwrap().finish()?;

        let summary = RunSummary {
            products_saved: self.state.saved(),
            pages_visited: self.state.pages_visited(),
            elapsed: start.elapsed(),
            target: self.state.results_wanted(),
        };

        info!(
            products_saved = summary.products_saved,
            pages_visited = summary.pages_visited,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Scrape finished"
        );

        Ok(summary)
    }

    /// Fetches one unit and routes it to the matching page handler
    async fn process_unit(&self, unit: CrawlUnit) {
        if unit.role.is_detail() && self.state.budget_met() {
            debug!(url = %unit.url, "Budget already met, skipping detail page");
            return;
        }

        debug!(url = %unit.url, role = %unit.role, "Fetching");

        let result = fetch_url(
            &self.client,
            &unit.url,
            unit.referrer.as_ref(),
            self.config.fetcher.retries,
        )
        .await;

        let (final_url, body) = match result {
            FetchResult::Success {
                final_url,
                status_code,
                body,
            } => {
                debug!(status = status_code, url = %final_url, "Fetched");
                (final_url, body)
            }
            FetchResult::HttpError { status_code } => {
                warn!(url = %unit.url, role = %unit.role, status = status_code, "HTTP error, skipping page");
                return;
            }
            FetchResult::NetworkError { error, timed_out } => {
                warn!(url = %unit.url, role = %unit.role, timed_out, "Network error, skipping page: {}", error);
                return;
            }
        };

        // Redirects may move us to a different page URL; links resolve
        // against where the content actually came from
        let page_url = Url::parse(&final_url).unwrap_or_else(|_| unit.url.clone());

        match unit.role {
            PageRole::List => self.handle_list_page(&unit, &page_url, &body),
            PageRole::Detail => self.handle_detail_page(&page_url, &body),
        }
    }

    /// Processes a listing page: discover links, enqueue or extract, paginate
    fn handle_list_page(&self, unit: &CrawlUnit, page_url: &Url, body: &str) {
        let document = Html::parse_document(body);

        self.state.record_page_visited();

        let links = find_detail_links(&document, page_url);
        info!(
            page = unit.page_number,
            links = links.len(),
            url = %page_url,
            "Listing page scanned"
        );

        if links.is_empty() {
            let title = page_title(&document).unwrap_or_default();
            warn!(url = %page_url, title = %title, "No product links found on listing page");
        }

        if self.config.limits.collect_details {
            self.enqueue_details(&links, page_url);
        } else {
            self.extract_from_listing(&document, page_url);
        }

        if self.state.budget_met() {
            info!(page = unit.page_number, "Stopping pagination: target reached");
            return;
        }
        if self.state.page_ceiling_reached(unit.page_number) {
            info!(
                page = unit.page_number,
                max_pages = self.state.max_pages(),
                "Stopping pagination: page ceiling reached"
            );
            return;
        }
        if links.is_empty() {
            info!(page = unit.page_number, "Stopping pagination: page yielded no products");
            return;
        }

        if let Some(next_url) = find_next_page(&document, page_url, unit.page_number) {
            if self.state.admit(next_url.as_str()) {
                debug!(next = %next_url, "Queueing next listing page");
                self.frontier.lock().unwrap().push_back(CrawlUnit::next_list(
                    next_url,
                    unit.page_number + 1,
                    page_url.clone(),
                ));
            }
        }
    }

    /// Queues detail units for newly seen links, up to the remaining budget
    fn enqueue_details(&self, links: &[Url], referrer: &Url) {
        let remaining = self.state.remaining();
        if remaining == 0 {
            return;
        }

        let mut queued = 0;
        {
            let mut frontier = self.frontier.lock().unwrap();
            for link in links {
                if queued >= remaining {
                    break;
                }
                if !self.state.admit(link.as_str()) {
                    continue;
                }
                frontier.push_back(CrawlUnit::detail(link.clone(), referrer.clone()));
                queued += 1;
            }
        }

        debug!(queued, "Queued detail pages");
    }

    /// Emits lightweight records straight from the listing tiles
    fn extract_from_listing(&self, document: &Html, page_url: &Url) {
        let remaining = self.state.remaining();
        if remaining == 0 {
            return;
        }

        let mut records: Vec<ProductRecord> = Vec::new();
        for candidate in listing_candidates(document) {
            if records.len() >= remaining {
                break;
            }
            if let Some(record) = build_listing_record(candidate, page_url) {
                records.push(record);
            }
        }

        if records.is_empty() {
            return;
        }

        let count = records.len();
        let write = self.sink.lock().unwrap().write_batch(&records);
        match write {
            Ok(()) => {
                let total = self.state.record_saved_batch(count);
                info!(
                    count,
                    total,
                    target = %self.state.target_label(),
                    "Saved listing records"
                );
            }
            Err(e) => error!(url = %page_url, error = %e, "Failed to write listing records"),
        }
    }

    /// Processes a product page: extract, merge, validate, emit
    fn handle_detail_page(&self, page_url: &Url, body: &str) {
        let document = Html::parse_document(body);

        match extract_detail_record(&document, page_url) {
            Some(record) => {
                let name = record.name.clone();
                let write = self.sink.lock().unwrap().write_record(&record);
                match write {
                    Ok(()) => {
                        let total = self.state.record_saved();
                        info!(
                            total,
                            target = %self.state.target_label(),
                            "Saved product: {}",
                            name
                        );
                    }
                    Err(e) => error!(url = %page_url, error = %e, "Failed to write product record"),
                }
            }
            None => {
                warn!(url = %page_url, "No product data extracted from detail page");
            }
        }
    }
}

fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let element = document.select(&selector).next()?;
    let title = element.text().collect::<String>().trim().to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
