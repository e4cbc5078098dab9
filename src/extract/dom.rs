//! CSS-based extraction from product and listing markup
//!
//! The DOM pass backs up the JSON-LD pass: every field is tried against an
//! ordered list of selectors, from the page-specific class names the site
//! uses today down to generic patterns that survive a redesign. The first
//! selector whose first match yields usable text wins.
//!
//! Listing pages get a lighter treatment: each product tile is scanned for
//! the handful of fields visible without opening the detail page.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::extract::price::{parse_count, parse_decimal, parse_price};
use crate::url::resolve_link;

/// Descriptions shorter than this are treated as noise
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Disclaimer text the site puts where a description should be
const DESCRIPTION_BOILERPLATE: &str = "Alle Angaben ohne Gewähr";

fn compile_all(patterns: &[&str]) -> Vec<Selector> {
    patterns
        .iter()
        .map(|p| Selector::parse(p).expect("selector compiles"))
        .collect()
}

static NAME_SELECTORS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile_all(&[r#"h1[class*="variant"]"#, r#"h1[class*="product"]"#, "h1"]));

static DESCRIPTION_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile_all(&[
        ".variant__description",
        ".product__description",
        r#"[class*="description"]"#,
    ])
});

static BRAND_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile_all(&[
        ".variant__header__manufacturer",
        ".product__brand",
        r#"[class*="brand"]"#,
        r#"[class*="manufacturer"]"#,
    ])
});

static IMAGE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile_all(&[
        r#"img[class*="variant"]"#,
        r#"img[class*="product"]"#,
        ".product img",
    ])
});

static PRICE_SELECTORS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile_all(&[".gh_price", ".offer__price", r#"[class*="price"]"#]));

static RATING_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile_all(&[
        ".variant__rating__value",
        ".rating__value",
        r#"[class*="rating"]"#,
    ])
});

static REVIEW_COUNT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile_all(&[
        ".variant__rating__count",
        ".rating__count",
        r#"[class*="review"]"#,
    ])
});

static SPEC_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile_all(&[
        ".variant__specs li",
        ".product__specs li",
        r#"[class*="specs"] li"#,
        ".specs dt",
        ".specs dd",
    ])
});

/// Splits a spec row like `"Sockel: AM5"` or `"Lüfter • 2x 120mm"`
static SPEC_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:•]+)[:|•]\s*(.+)$").expect("spec row pattern compiles"));

// ===== Detail pages =====

/// Product fields recovered from page markup
#[derive(Debug, Clone, Default)]
pub struct DomProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    /// Absolute image URL, already resolved against the page URL
    pub image: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub specifications: HashMap<String, String>,
}

/// Extracts product fields from a detail page's markup
///
/// Every field falls back through its selector list independently, so a
/// partially redesigned page still yields whatever it can. Fields that
/// cannot be recovered are simply None.
///
/// # Arguments
///
/// * `document` - The parsed detail page
/// * `base_url` - Page URL, used to absolutize the image source
pub fn extract_dom(document: &Html, base_url: &Url) -> DomProduct {
    DomProduct {
        name: first_text(document, &NAME_SELECTORS),
        description: extract_description(document),
        brand: first_text(document, &BRAND_SELECTORS),
        image: extract_image(document, base_url),
        price: first_text(document, &PRICE_SELECTORS).and_then(|t| parse_price(&t)),
        rating: first_text(document, &RATING_SELECTORS).and_then(|t| parse_decimal(&t)),
        review_count: first_text(document, &REVIEW_COUNT_SELECTORS).and_then(|t| parse_count(&t)),
        specifications: extract_specifications(document),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First selector whose first match has non-empty text
fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    for selector in selectors {
        if let Some(element) = document.select(selector).next() {
            let text = element_text(element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn extract_description(document: &Html) -> Option<String> {
    for selector in DESCRIPTION_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            let text = element_text(element);
            if text.chars().count() >= MIN_DESCRIPTION_CHARS
                && !text.contains(DESCRIPTION_BOILERPLATE)
            {
                return Some(text);
            }
        }
    }
    None
}

fn extract_image(document: &Html, base_url: &Url) -> Option<String> {
    for selector in IMAGE_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            let src = element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("data-src"));
            if let Some(src) = src {
                if let Some(absolute) = resolve_link(src, base_url) {
                    return Some(absolute.to_string());
                }
            }
        }
    }
    None
}

fn extract_specifications(document: &Html) -> HashMap<String, String> {
    let mut specs = HashMap::new();

    for selector in SPEC_SELECTORS.iter() {
        for element in document.select(selector) {
            let text = element_text(element);
            if let Some(captures) = SPEC_ROW.captures(&text) {
                let label = captures[1].trim().to_string();
                let value = captures[2].trim().to_string();
                if !label.is_empty() && !value.is_empty() {
                    specs.insert(label, value);
                }
            }
        }
    }

    specs
}

// ===== Listing pages =====

static LISTING_ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#".productlist__item, .listview__item, [class*="product"]"#)
        .expect("selector compiles")
});

static ITEM_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="-a"]"#).expect("selector compiles"));

static ITEM_NAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"h2, h3, [class*="name"], [class*="title"]"#).expect("selector compiles")
});

static ITEM_PRICE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#".gh_price, [class*="price"]"#).expect("selector compiles"));

static ITEM_BRAND_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[class*="manufacturer"], [class*="brand"]"#).expect("selector compiles")
});

static ITEM_IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("selector compiles"));

/// Fields visible on a single listing tile
///
/// The link target and image are raw href values; callers resolve them
/// against the page URL.
#[derive(Debug, Clone)]
pub struct ListingCandidate {
    pub href: String,
    pub name: String,
    pub price: Option<f64>,
    pub brand: Option<String>,
    pub image: Option<String>,
}

/// Scans a listing page for product tiles
///
/// A tile is any listing container that holds a product link. The name is
/// taken from the link text when present, otherwise from the first heading
/// or name-like element in the tile.
pub fn listing_candidates(document: &Html) -> Vec<ListingCandidate> {
    let mut candidates = Vec::new();

    for item in document.select(&LISTING_ITEM_SELECTOR) {
        let Some(link) = item.select(&ITEM_LINK_SELECTOR).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        let mut name = element_text(link);
        if name.is_empty() {
            if let Some(heading) = item.select(&ITEM_NAME_SELECTOR).next() {
                name = element_text(heading);
            }
        }

        let price = item
            .select(&ITEM_PRICE_SELECTOR)
            .next()
            .map(element_text)
            .and_then(|t| parse_price(&t));

        let brand = item
            .select(&ITEM_BRAND_SELECTOR)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty());

        let image = item.select(&ITEM_IMAGE_SELECTOR).next().and_then(|img| {
            img.value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
                .map(str::to_string)
        });

        candidates.push(ListingCandidate {
            href: href.to_string(),
            name,
            price,
            brand,
            image,
        });
    }

    candidates
}
