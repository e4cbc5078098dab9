//! Link resolution against a page's own URL
//!
//! Discovered hrefs come straight out of site markup and may be relative,
//! empty, or pseudo-links. Resolution never fails the crawl: anything that
//! cannot become a fetchable absolute URL is simply dropped.

use url::Url;

/// Resolves a possibly-relative href against the page's own URL
///
/// Returns None for references that must be skipped rather than fetched:
/// - empty hrefs and bare fragments (same-page anchors)
/// - `javascript:`, `mailto:`, `tel:` and `data:` pseudo-links
/// - references that fail to resolve
/// - anything that resolves to a non-HTTP(S) scheme
///
/// # Arguments
///
/// * `href` - The raw href attribute value
/// * `base_url` - The URL of the page the href was found on
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}
