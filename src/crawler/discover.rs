//! Link and pagination discovery on listing pages
//!
//! Listing markup differs between category browses and search results, so
//! discovery is layered:
//! - Detail links come from a selector scoped to known listing containers,
//!   with a page-wide scan as fallback when the scoped pass finds nothing
//! - The next listing page is found by pagination-link text, then by
//!   synthesizing the page-number query parameter, then by a `rel="next"`
//!   link
//!
//! Every strategy is a pure function over the parsed document; callers
//! decide what to do with the results.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::url::{is_product_href, resolve_link};

/// Query parameter the site uses for listing page numbers
const PAGE_PARAM: &str = "pg";

/// Words that mark a pagination link as "next" (checked case-insensitively)
const NEXT_PHRASES: &[&str] = &["nächste", "next"];

/// Single-glyph "next" labels, matched exactly
const NEXT_SYMBOLS: &[&str] = &["›", "»"];

static SCOPED_DETAIL_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#".productlist__item a[href*="-a"], .listview__item a[href*="-a"]"#)
        .expect("selector compiles")
});

static ALL_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("selector compiles"));

static PAGINATION_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".gpagenav a, .pagination a").expect("selector compiles"));

static REL_NEXT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[rel="next"]"#).expect("selector compiles"));

/// Finds product detail links on a listing page
///
/// The scoped pass keeps false positives (ads, navigation) out; when it
/// yields nothing the page-wide pass keeps a markup change from silently
/// producing zero results. Links are absolute, deduplicated, and in
/// document order.
pub fn find_detail_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let scoped = collect_product_links(document, &SCOPED_DETAIL_LINKS, base_url);
    if !scoped.is_empty() {
        return scoped;
    }
    collect_product_links(document, &ALL_LINKS, base_url)
}

fn collect_product_links(document: &Html, selector: &Selector, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !is_product_href(href) {
            continue;
        }
        let Some(resolved) = resolve_link(href, base_url) else {
            continue;
        };
        if seen.insert(resolved.to_string()) {
            links.push(resolved);
        }
    }

    links
}

/// Finds the next listing page, trying the strategies in order
///
/// The query-parameter strategy always produces a URL, so callers must
/// gate pagination on their own termination conditions (budget, page
/// ceiling, empty pages) rather than on this returning None.
pub fn find_next_page(document: &Html, current_url: &Url, current_page: u32) -> Option<Url> {
    next_by_phrase(document, current_url)
        .or_else(|| next_by_page_param(current_url, current_page))
        .or_else(|| next_by_rel(document, current_url))
}

/// A pagination link labelled "next" by its text or title attribute
pub fn next_by_phrase(document: &Html, base_url: &Url) -> Option<Url> {
    for anchor in document.select(&PAGINATION_LINKS) {
        let text: String = anchor.text().collect();
        let title = anchor.value().attr("title").unwrap_or("");

        if is_next_label(&text) || is_next_label(title) {
            if let Some(href) = anchor.value().attr("href") {
                if let Some(resolved) = resolve_link(href, base_url) {
                    return Some(resolved);
                }
            }
        }
    }
    None
}

fn is_next_label(text: &str) -> bool {
    let label = text.trim().to_lowercase();
    if label.is_empty() {
        return false;
    }
    NEXT_SYMBOLS.contains(&label.as_str()) || NEXT_PHRASES.iter().any(|p| label.contains(p))
}

/// The current URL with its page-number parameter set to `current_page + 1`
///
/// An existing `pg` pair is replaced; otherwise one is appended. All other
/// query parameters are kept.
pub fn next_by_page_param(current_url: &Url, current_page: u32) -> Option<Url> {
    let retained: Vec<(String, String)> = current_url
        .query_pairs()
        .filter(|(key, _)| key.as_ref() != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut next = current_url.clone();
    {
        let mut pairs = next.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(retained);
        pairs.append_pair(PAGE_PARAM, &(current_page + 1).to_string());
    }

    Some(next)
}

/// A standards-based `rel="next"` link
pub fn next_by_rel(document: &Html, base_url: &Url) -> Option<Url> {
    document
        .select(&REL_NEXT_LINK)
        .find_map(|anchor| anchor.value().attr("href"))
        .and_then(|href| resolve_link(href, base_url))
}
