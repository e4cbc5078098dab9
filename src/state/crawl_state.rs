//! Shared crawl state: budget counters and the URL dedup set
//!
//! One `CrawlState` exists per run. It is shared (`Arc`) across all unit
//! handlers and provides the check-and-act operations the crawl loop relies
//! on: budget tests, counter updates, and first-time URL admission.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Budget sentinel meaning "no limit on emitted records"
pub const UNBOUNDED: usize = usize::MAX;

/// Process-wide crawl counters and the admitted-URL set
///
/// `saved` and `pages_visited` are atomics so concurrent unit handlers can
/// update them without locking. The budget check before a detail extraction
/// is a plain read, not a reservation: two handlers that both pass it may
/// jointly overshoot `results_wanted`, but never by more than the worker
/// pool width, and no record is ever counted twice.
pub struct CrawlState {
    /// Operator target for emitted records ([`UNBOUNDED`] disables the cap)
    results_wanted: usize,

    /// Per-branch ceiling on catalog page numbers
    max_pages: u32,

    /// Records emitted so far
    saved: AtomicUsize,

    /// Catalog (list) pages processed so far
    pages_visited: AtomicUsize,

    /// Absolute URLs already admitted for fetching in this run
    admitted: Mutex<HashSet<String>>,
}

impl CrawlState {
    /// Creates the shared state for a new run
    pub fn new(results_wanted: usize, max_pages: u32) -> Self {
        Self {
            results_wanted,
            max_pages,
            saved: AtomicUsize::new(0),
            pages_visited: AtomicUsize::new(0),
            admitted: Mutex::new(HashSet::new()),
        }
    }

    /// Admits a URL for fetching the first time it is seen
    ///
    /// # Returns
    ///
    /// * `true` - The URL was not seen before and is now recorded
    /// * `false` - The URL was already admitted in this run
    pub fn admit(&self, url: &str) -> bool {
        let mut admitted = self.admitted.lock().unwrap();
        admitted.insert(url.to_string())
    }

    /// Returns the number of records emitted so far
    pub fn saved(&self) -> usize {
        self.saved.load(Ordering::SeqCst)
    }

    /// Returns the number of list pages processed so far
    pub fn pages_visited(&self) -> usize {
        self.pages_visited.load(Ordering::SeqCst)
    }

    /// Returns true once the result budget has been reached
    pub fn budget_met(&self) -> bool {
        self.saved() >= self.results_wanted
    }

    /// Returns how many more records the budget allows right now
    ///
    /// The value is a snapshot; concurrent emissions may shrink it before
    /// the caller acts on it.
    pub fn remaining(&self) -> usize {
        self.results_wanted.saturating_sub(self.saved())
    }

    /// Returns true when `page_number` has reached the page ceiling
    pub fn page_ceiling_reached(&self, page_number: u32) -> bool {
        page_number >= self.max_pages
    }

    /// Records one emitted record and returns the running total
    pub fn record_saved(&self) -> usize {
        self.saved.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Records a batch of emitted records and returns the running total
    pub fn record_saved_batch(&self, count: usize) -> usize {
        self.saved.fetch_add(count, Ordering::SeqCst) + count
    }

    /// Records the start of a list-page visit and returns the running total
    pub fn record_page_visited(&self) -> usize {
        self.pages_visited.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the configured result target
    pub fn results_wanted(&self) -> usize {
        self.results_wanted
    }

    /// Returns the configured page ceiling
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Human-readable form of the result target for log lines
    pub fn target_label(&self) -> String {
        if self.results_wanted == UNBOUNDED {
            "unbounded".to_string()
        } else {
            self.results_wanted.to_string()
        }
    }
}
