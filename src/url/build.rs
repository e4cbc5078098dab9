//! Start URL synthesis
//!
//! When the operator supplies no explicit start URLs, one is synthesized
//! from the search parameters: category (`cat`), free-text query (`fs`),
//! and the optional price window (`v=e&plz=<min>`, `plh=<max>`), on the
//! country-specific domain.

use crate::config::SearchConfig;
use crate::{UrlError, UrlResult};
use url::Url;

/// Maps a country code to the site domain (unknown codes fall back to .eu)
pub fn country_domain(country: &str) -> &'static str {
    match country {
        "at" => "geizhals.at",
        "de" => "geizhals.de",
        _ => "geizhals.eu",
    }
}

/// Builds a catalog search URL from the configured parameters
pub fn build_search_url(search: &SearchConfig) -> UrlResult<Url> {
    let base = format!("https://{}/", country_domain(&search.country));
    let mut url = Url::parse(&base).map_err(|e| UrlError::Parse(e.to_string()))?;

    {
        let mut pairs = url.query_pairs_mut();

        let category = search.category.trim();
        if !category.is_empty() {
            pairs.append_pair("cat", category);
        }

        let query = search.query.trim();
        if !query.is_empty() {
            pairs.append_pair("fs", query);
        }

        if search.min_price > 0.0 {
            pairs.append_pair("v", "e");
            pairs.append_pair("plz", &format_price(search.min_price));
        }

        if search.max_price > 0.0 {
            pairs.append_pair("plh", &format_price(search.max_price));
        }
    }

    Ok(url)
}

/// Resolves the full set of start URLs for a run
///
/// Explicit `start-urls` win; otherwise a search URL is synthesized. An
/// empty category and query with no explicit URLs is the one run-level
/// configuration failure.
///
/// # Returns
///
/// * `Ok(Vec<Url>)` - At least one absolute start URL
/// * `Err(UrlError)` - A malformed explicit URL, or nothing to start from
pub fn resolve_start_urls(search: &SearchConfig) -> UrlResult<Vec<Url>> {
    if !search.start_urls.is_empty() {
        return search
            .start_urls
            .iter()
            .map(|raw| Url::parse(raw).map_err(|_| UrlError::Parse(raw.clone())))
            .collect();
    }

    if search.category.trim().is_empty() && search.query.trim().is_empty() {
        return Err(UrlError::NoStartUrl);
    }

    Ok(vec![build_search_url(search)?])
}

/// Formats a price bound the way the site expects (no trailing `.0`)
fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        price.to_string()
    }
}
