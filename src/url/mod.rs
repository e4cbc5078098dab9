//! URL handling module
//!
//! This module provides link resolution, the product URL shape used to tell
//! product pages apart from navigation, and start-URL synthesis from the
//! configured search parameters.

mod build;
mod normalize;
mod product;

// Re-export main functions
pub use build::{build_search_url, country_domain, resolve_start_urls};
pub use normalize::resolve_link;
pub use product::{is_product_href, product_id};
