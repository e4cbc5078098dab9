//! Structured-data extraction from JSON-LD blocks
//!
//! Product pages embed schema.org metadata in `<script type="application/ld+json">`
//! blocks. This pass:
//! - Scans every such block and takes the first schema.org `Product` found
//! - Handles the three common shapes: a bare object, a top-level array,
//!   and an `@graph` wrapper
//! - Tolerates malformed JSON (the block is skipped, not an error)
//!
//! Values arrive loosely typed: numbers may be JSON numbers or numeric
//! strings, `brand` may be a string or an object, `offers` may be a single
//! offer, an array, or an `AggregateOffer`. All of that is normalized here
//! so the merge step deals with plain Rust types.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;

use crate::extract::price::parse_decimal;
use crate::record::{Offer, DEFAULT_CURRENCY};

static JSONLD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("selector compiles")
});

/// Price-bearing fields of the first (or only) offer entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryOffer {
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub availability: Option<String>,
}

/// Product fields recovered from JSON-LD
#[derive(Debug, Clone, Default)]
pub struct StructuredProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    /// Manufacturer part number when present, falling back to the sku field
    pub sku: Option<String>,
    pub offer: Option<PrimaryOffer>,
    /// Per-merchant offers listed under the offers entry
    pub merchant_offers: Vec<Offer>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
}

/// Scans a parsed document for a schema.org Product
///
/// Returns the first Product found across all JSON-LD blocks, or None when
/// the page carries no usable structured data.
pub fn extract_structured(document: &Html) -> Option<StructuredProduct> {
    for script in document.select(&JSONLD_SELECTOR) {
        let raw: String = script.text().collect();

        let parsed: Value = match serde_json::from_str(raw.trim()) {
            Ok(value) => value,
            Err(_) => continue,
        };

        for candidate in candidates(&parsed) {
            if is_product(candidate) {
                return Some(product_from(candidate));
            }
        }
    }

    None
}

/// Unwraps the three JSON-LD container shapes into a flat candidate list
fn candidates(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            if let Some(Value::Array(graph)) = map.get("@graph") {
                graph.iter().collect()
            } else {
                vec![value]
            }
        }
        _ => Vec::new(),
    }
}

fn is_product(value: &Value) -> bool {
    let declared = value.get("@type").or_else(|| value.get("type"));

    match declared {
        Some(Value::String(kind)) => kind == "Product",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("Product")),
        _ => false,
    }
}

fn product_from(value: &Value) -> StructuredProduct {
    let rating = value.get("aggregateRating");

    StructuredProduct {
        name: string_field(value, "name"),
        description: string_field(value, "description"),
        brand: value.get("brand").and_then(name_of),
        image: value.get("image").and_then(image_of),
        sku: string_field(value, "mpn").or_else(|| string_field(value, "sku")),
        offer: value.get("offers").map(primary_offer),
        merchant_offers: merchant_offers(value.get("offers")),
        rating: rating
            .and_then(|r| r.get("ratingValue"))
            .and_then(number_of),
        review_count: rating
            .and_then(|r| r.get("reviewCount"))
            .and_then(count_of),
    }
}

/// Reads the price-bearing fields from the first offer entry
///
/// An array of offers contributes its first element; a single offer or an
/// AggregateOffer is read directly, with `lowPrice` standing in when the
/// entry has no `price`.
fn primary_offer(offers: &Value) -> PrimaryOffer {
    let entry = match offers {
        Value::Array(items) => items.first(),
        other => Some(other),
    };

    match entry {
        Some(offer) => PrimaryOffer {
            price: offer
                .get("price")
                .and_then(number_of)
                .or_else(|| offer.get("lowPrice").and_then(number_of)),
            currency: string_field(offer, "priceCurrency"),
            availability: string_field(offer, "availability"),
        },
        None => PrimaryOffer::default(),
    }
}

/// Collects named per-merchant offers
///
/// Entries come either from a top-level offers array or from the nested
/// `offers` array of an AggregateOffer. Entries without a merchant name or
/// a usable price are skipped.
fn merchant_offers(offers: Option<&Value>) -> Vec<Offer> {
    let entries: &[Value] = match offers {
        Some(Value::Array(items)) => items,
        Some(Value::Object(map)) => match map.get("offers") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            let merchant = entry
                .get("seller")
                .and_then(name_of)
                .or_else(|| entry.get("merchant").and_then(name_of))?;
            let price = entry.get("price").and_then(number_of)?;
            let currency = string_field(entry, "priceCurrency")
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

            Some(Offer {
                merchant,
                price,
                currency,
            })
        })
        .collect()
}

// ===== Loose-value coercion =====

fn text_of(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(text_of)
}

/// A string, or an object carrying a `name` field
fn name_of(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => text_of(value),
        Value::Object(map) => map.get("name").and_then(text_of),
        _ => None,
    }
}

/// A URL string, the first usable entry of an array, or an object's `url`
fn image_of(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => text_of(value),
        Value::Array(items) => items.iter().find_map(image_of),
        Value::Object(map) => map.get("url").and_then(text_of),
        _ => None,
    }
}

/// A JSON number, or a numeric string
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    fn wrap(json: &str) -> String {
        format!(
            r#"<html><head><script type="application/ld+json">{}</script></head><body></body></html>"#,
            json
        )
    }

    #[test]
    fn test_single_product_object() {
        let html = wrap(
            r#"{
                "@type": "Product",
                "name": "Noctua NH-D15",
                "description": "Dual-tower CPU cooler",
                "brand": {"@type": "Brand", "name": "Noctua"},
                "mpn": "NH-D15",
                "image": "https://img.example.com/nh-d15.jpg",
                "offers": {
                    "@type": "Offer",
                    "price": "89.90",
                    "priceCurrency": "EUR",
                    "availability": "https://schema.org/InStock"
                },
                "aggregateRating": {"ratingValue": 4.8, "reviewCount": 1523}
            }"#,
        );

        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.name.as_deref(), Some("Noctua NH-D15"));
        assert_eq!(product.description.as_deref(), Some("Dual-tower CPU cooler"));
        assert_eq!(product.brand.as_deref(), Some("Noctua"));
        assert_eq!(product.sku.as_deref(), Some("NH-D15"));
        assert_eq!(
            product.image.as_deref(),
            Some("https://img.example.com/nh-d15.jpg")
        );

        let offer = product.offer.unwrap();
        assert_eq!(offer.price, Some(89.9));
        assert_eq!(offer.currency.as_deref(), Some("EUR"));
        assert_eq!(
            offer.availability.as_deref(),
            Some("https://schema.org/InStock")
        );

        assert_eq!(product.rating, Some(4.8));
        assert_eq!(product.review_count, Some(1523));
    }

    #[test]
    fn test_graph_wrapper() {
        let html = wrap(
            r#"{
                "@context": "https://schema.org",
                "@graph": [
                    {"@type": "BreadcrumbList", "name": "crumbs"},
                    {"@type": "Product", "name": "be quiet! Pure Base 500"}
                ]
            }"#,
        );

        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.name.as_deref(), Some("be quiet! Pure Base 500"));
    }

    #[test]
    fn test_top_level_array() {
        let html = wrap(
            r#"[
                {"@type": "WebSite", "name": "site"},
                {"@type": "Product", "name": "Arctic P12"}
            ]"#,
        );

        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.name.as_deref(), Some("Arctic P12"));
    }

    #[test]
    fn test_type_array() {
        let html = wrap(r#"{"@type": ["Thing", "Product"], "name": "Fan"}"#);
        assert!(extract_structured(&parse(&html)).is_some());
    }

    #[test]
    fn test_brand_as_plain_string() {
        let html = wrap(r#"{"@type": "Product", "name": "X", "brand": "Noctua"}"#);
        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.brand.as_deref(), Some("Noctua"));
    }

    #[test]
    fn test_sku_used_when_mpn_missing() {
        let html = wrap(r#"{"@type": "Product", "name": "X", "sku": "SKU-1"}"#);
        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.sku.as_deref(), Some("SKU-1"));
    }

    #[test]
    fn test_mpn_preferred_over_sku() {
        let html = wrap(r#"{"@type": "Product", "name": "X", "sku": "SKU-1", "mpn": "MPN-1"}"#);
        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.sku.as_deref(), Some("MPN-1"));
    }

    #[test]
    fn test_image_array_takes_first() {
        let html = wrap(
            r#"{"@type": "Product", "name": "X",
                "image": ["https://img.example.com/1.jpg", "https://img.example.com/2.jpg"]}"#,
        );
        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(
            product.image.as_deref(),
            Some("https://img.example.com/1.jpg")
        );
    }

    #[test]
    fn test_offers_array_first_is_primary() {
        let html = wrap(
            r#"{"@type": "Product", "name": "X", "offers": [
                {"price": 84.49, "priceCurrency": "EUR", "seller": {"name": "Mindfactory"}},
                {"price": 86.90, "priceCurrency": "EUR", "seller": {"name": "Alternate"}}
            ]}"#,
        );

        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.offer.unwrap().price, Some(84.49));
        assert_eq!(product.merchant_offers.len(), 2);
        assert_eq!(product.merchant_offers[0].merchant, "Mindfactory");
        assert_eq!(product.merchant_offers[1].price, 86.9);
    }

    #[test]
    fn test_aggregate_offer_low_price_and_nested_offers() {
        let html = wrap(
            r#"{"@type": "Product", "name": "X", "offers": {
                "@type": "AggregateOffer",
                "lowPrice": "79.00",
                "priceCurrency": "EUR",
                "offers": [
                    {"price": "79.00", "seller": "Galaxus"},
                    {"price": "81.50", "merchant": {"name": "Cyberport"}}
                ]
            }}"#,
        );

        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.offer.unwrap().price, Some(79.0));
        assert_eq!(product.merchant_offers.len(), 2);
        assert_eq!(product.merchant_offers[0].merchant, "Galaxus");
        assert_eq!(product.merchant_offers[0].currency, "EUR");
        assert_eq!(product.merchant_offers[1].merchant, "Cyberport");
    }

    #[test]
    fn test_offer_entries_without_merchant_or_price_skipped() {
        let html = wrap(
            r#"{"@type": "Product", "name": "X", "offers": [
                {"price": 10.0},
                {"seller": {"name": "NoPrice"}},
                {"price": 12.0, "seller": {"name": "Keep"}}
            ]}"#,
        );

        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.merchant_offers.len(), 1);
        assert_eq!(product.merchant_offers[0].merchant, "Keep");
    }

    #[test]
    fn test_rating_as_numeric_strings() {
        let html = wrap(
            r#"{"@type": "Product", "name": "X",
                "aggregateRating": {"ratingValue": "4,5", "reviewCount": "210"}}"#,
        );

        let product = extract_structured(&parse(&html)).unwrap();
        assert_eq!(product.rating, Some(4.5));
        assert_eq!(product.review_count, Some(210));
    }

    #[test]
    fn test_malformed_block_skipped() {
        let html = r#"<html><head>
            <script type="application/ld+json">{not json</script>
            <script type="application/ld+json">{"@type": "Product", "name": "Second"}</script>
            </head><body></body></html>"#;

        let product = extract_structured(&parse(html)).unwrap();
        assert_eq!(product.name.as_deref(), Some("Second"));
    }

    #[test]
    fn test_no_product_entry() {
        let html = wrap(r#"{"@type": "WebSite", "name": "site"}"#);
        assert!(extract_structured(&parse(&html)).is_none());
    }

    #[test]
    fn test_no_jsonld_at_all() {
        let html = "<html><body><h1>plain</h1></body></html>";
        assert!(extract_structured(&parse(html)).is_none());
    }

    #[test]
    fn test_empty_strings_become_none() {
        let html = wrap(r#"{"@type": "Product", "name": "X", "description": "  "}"#);
        let product = extract_structured(&parse(&html)).unwrap();
        assert!(product.description.is_none());
    }
}
