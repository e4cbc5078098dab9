//! Merchant offer extraction from detail-page markup
//!
//! Detail pages carry a table of per-merchant quotes. The markup around it
//! is noisy: rating widgets, legal links and nested wrappers all match the
//! generic row selector. Extraction therefore filters hard:
//! - Merchant names are cleaned (parentheticals stripped, whitespace
//!   collapsed) and rejected when they are numeric or carry rating or
//!   legal vocabulary
//! - Rows without a parseable price are dropped
//! - One offer per merchant name, first occurrence wins
//! - At most [`MAX_OFFERS`] entries are kept

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::extract::price::parse_price;
use crate::record::{Offer, DEFAULT_CURRENCY, MAX_OFFERS};

static OFFER_ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#".offer__item, .merchant__item, [class*="offer"]"#)
        .expect("selector compiles")
});

static MERCHANT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [".offer__merchant", ".merchant__name", r#"[class*="merchant"]"#]
        .iter()
        .map(|p| Selector::parse(p).expect("selector compiles"))
        .collect()
});

static ROW_PRICE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [".offer__price", r#"[class*="price"]"#]
        .iter()
        .map(|p| Selector::parse(p).expect("selector compiles"))
        .collect()
});

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern compiles"));

/// Substrings that mark a "merchant name" as rating or legal UI text
const NON_MERCHANT_TOKENS: &[&str] = &[
    "bewertung",
    "sterne",
    "von 5",
    "agb",
    "impressum",
    "datenschutz",
];

/// Extracts the per-merchant offers from a detail page
pub fn extract_offers(document: &Html) -> Vec<Offer> {
    let mut offers = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for row in document.select(&OFFER_ROW_SELECTOR) {
        let Some(merchant) = merchant_name(row) else {
            continue;
        };
        let Some(price) = row_price(row) else {
            continue;
        };

        if !seen.insert(merchant.clone()) {
            continue;
        }

        offers.push(Offer {
            merchant,
            price,
            currency: DEFAULT_CURRENCY.to_string(),
        });

        if offers.len() >= MAX_OFFERS {
            break;
        }
    }

    offers
}

fn merchant_name(row: ElementRef<'_>) -> Option<String> {
    let raw = first_text_in(row, &MERCHANT_SELECTORS)?;
    clean_merchant_name(&raw)
}

fn row_price(row: ElementRef<'_>) -> Option<f64> {
    let text = first_text_in(row, &ROW_PRICE_SELECTORS)?;
    parse_price(&text)
}

fn first_text_in(scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    for selector in selectors {
        if let Some(element) = scope.select(selector).next() {
            let text: String = element.text().collect();
            let text = text.trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Normalizes a raw merchant string, or rejects it as non-merchant text
///
/// Parenthetical annotations like `"(1.234 Bewertungen)"` are stripped and
/// whitespace is collapsed before the checks run.
fn clean_merchant_name(raw: &str) -> Option<String> {
    let stripped = PARENTHETICAL.replace_all(raw, "");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() {
        return None;
    }
    if cleaned.replace(',', ".").parse::<f64>().is_ok() {
        return None;
    }

    let lowered = cleaned.to_lowercase();
    if NON_MERCHANT_TOKENS.iter().any(|t| lowered.contains(t)) {
        return None;
    }

    Some(cleaned)
}
