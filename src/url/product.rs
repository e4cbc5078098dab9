//! Product URL shape
//!
//! Geizhals product pages embed a numeric identifier in the final path
//! segment (`...-a<digits>.html`). That token distinguishes product links
//! from navigation and ads, and doubles as the record's `product_id`.

use regex::Regex;
use std::sync::LazyLock;

static PRODUCT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-a(\d+)\.html").expect("product token pattern compiles"));

/// Returns true when an href points at a product page
pub fn is_product_href(href: &str) -> bool {
    PRODUCT_TOKEN.is_match(href)
}

/// Extracts the numeric product identifier from a product URL
///
/// Returns None when the URL does not carry the `-a<digits>.html` token.
pub fn product_id(url: &str) -> Option<String> {
    PRODUCT_TOKEN
        .captures(url)
        .map(|caps| caps[1].to_string())
}
