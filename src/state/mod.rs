//! State module for tracking crawl progress
//!
//! This module provides the run-wide shared state: the result budget, the
//! page ceiling, and the set of URLs already admitted for fetching.

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlState, UNBOUNDED};
