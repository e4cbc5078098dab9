//! Product extraction pipeline
//!
//! Extraction runs as parallel passes over a parsed document:
//! - `structured` reads schema.org JSON-LD blocks
//! - `dom` falls back to CSS selectors with layered specificity
//! - `offers` scans the merchant offer table
//! - `merge` folds the passes into one validated [`ProductRecord`](crate::record::ProductRecord)
//!
//! `price` holds the shared number normalization for German-formatted text.

mod dom;
mod merge;
mod offers;
mod price;
mod structured;

pub use dom::{extract_dom, listing_candidates, DomProduct, ListingCandidate, MIN_DESCRIPTION_CHARS};
pub use merge::{
    build_detail_record, build_listing_record, combine_offers, extract_detail_record,
};
pub use offers::extract_offers;
pub use price::{parse_count, parse_decimal, parse_price};
pub use structured::{extract_structured, PrimaryOffer, StructuredProduct};
