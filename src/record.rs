//! Product record types emitted by the scraper
//!
//! This module defines the output entities: the normalized product record,
//! the merchant offer entries attached to it, and the provenance tag that
//! records which page kind produced the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Maximum number of merchant offers kept on a single record
pub const MAX_OFFERS: usize = 10;

/// Minimum number of characters a product name must have to be emitted
pub const MIN_NAME_CHARS: usize = 3;

/// Currency assumed when a page does not state one
pub const DEFAULT_CURRENCY: &str = "EUR";

/// A single merchant's price quote for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub merchant: String,
    pub price: f64,
    pub currency: String,
}

/// Which page kind a record was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapedFrom {
    /// Extracted directly from a listing-item container on a catalog page
    Listing,
    /// Extracted from the product's own page
    Detail,
}

impl ScrapedFrom {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Detail => "detail",
        }
    }
}

impl fmt::Display for ScrapedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized product record
///
/// Constructed once per document, validated, then emitted exactly once.
/// Optional members serialize as explicit nulls so every record carries the
/// full field set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub sku: Option<String>,

    /// Numeric token embedded in the product URL path
    pub product_id: Option<String>,

    pub price: Option<f64>,
    pub currency: String,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,

    /// Label -> value pairs from the specification block; absent when empty
    pub specifications: Option<HashMap<String, String>>,

    /// Merchant offers, unique by merchant, at most [`MAX_OFFERS`] entries
    pub offers: Option<Vec<Offer>>,
    pub offers_count: Option<usize>,

    /// Minimum price across `offers`, falling back to `price`
    pub lowest_price: Option<f64>,

    pub url: String,
    pub scraped_from: ScrapedFrom,
    pub scraped_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Returns true when the record satisfies the emission invariant:
    /// a name of at least [`MIN_NAME_CHARS`] characters.
    pub fn is_valid(&self) -> bool {
        self.name.chars().count() >= MIN_NAME_CHARS
    }
}
