//! Merging extraction passes into emitted records
//!
//! A detail page runs two passes (JSON-LD and DOM) whose results land here.
//! Structured data wins field-by-field; DOM values fill the gaps. The
//! combined record is validated before it may be emitted, so downstream
//! sinks never see a record without a usable name.

use scraper::Html;
use tracing::warn;
use url::Url;

use crate::extract::dom::{extract_dom, DomProduct, ListingCandidate};
use crate::extract::offers::extract_offers;
use crate::extract::structured::{extract_structured, StructuredProduct};
use crate::record::{Offer, ProductRecord, ScrapedFrom, DEFAULT_CURRENCY, MAX_OFFERS};
use crate::url::{product_id, resolve_link};

/// Runs both extraction passes on a detail page and merges the result
///
/// Returns None when the page yields no valid record, which is logged but
/// never treated as fatal by callers.
pub fn extract_detail_record(document: &Html, url: &Url) -> Option<ProductRecord> {
    let structured = extract_structured(document);
    let dom = extract_dom(document, url);
    let dom_offers = extract_offers(document);

    build_detail_record(url, structured, dom, dom_offers)
}

/// Merges the two extraction passes into a single validated record
pub fn build_detail_record(
    url: &Url,
    structured: Option<StructuredProduct>,
    dom: DomProduct,
    dom_offers: Vec<Offer>,
) -> Option<ProductRecord> {
    let s = structured.unwrap_or_default();

    let offers = combine_offers(s.merchant_offers, dom_offers);

    let price = s
        .offer
        .as_ref()
        .and_then(|o| o.price)
        .or(dom.price);
    let currency = s
        .offer
        .as_ref()
        .and_then(|o| o.currency.clone())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let lowest_price = offers
        .iter()
        .map(|o| o.price)
        .reduce(f64::min)
        .or(price);

    let specifications = if dom.specifications.is_empty() {
        None
    } else {
        Some(dom.specifications)
    };

    let record = ProductRecord {
        name: s.name.or(dom.name).unwrap_or_default(),
        description: s.description.or(dom.description),
        brand: s.brand.or(dom.brand),
        image: s.image.or(dom.image),
        sku: s.sku,
        product_id: product_id(url.as_str()),
        price,
        currency,
        rating: s.rating.or(dom.rating),
        review_count: s.review_count.or(dom.review_count),
        specifications,
        offers_count: if offers.is_empty() {
            None
        } else {
            Some(offers.len())
        },
        offers: if offers.is_empty() {
            None
        } else {
            Some(offers)
        },
        lowest_price,
        url: url.to_string(),
        scraped_from: ScrapedFrom::Detail,
        scraped_at: chrono::Utc::now(),
    };

    validated(record)
}

/// Combines structured and DOM offers into one capped list
///
/// Structured entries come first; DOM entries only add merchants not
/// already present. The result never exceeds [`MAX_OFFERS`].
pub fn combine_offers(structured: Vec<Offer>, dom: Vec<Offer>) -> Vec<Offer> {
    let mut combined = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for offer in structured.into_iter().chain(dom) {
        if !seen.insert(offer.merchant.clone()) {
            continue;
        }
        combined.push(offer);
        if combined.len() >= MAX_OFFERS {
            break;
        }
    }

    combined
}

/// Builds a record from a listing tile without visiting the detail page
///
/// Returns None when the tile's link cannot be resolved or the record does
/// not validate.
pub fn build_listing_record(candidate: ListingCandidate, base_url: &Url) -> Option<ProductRecord> {
    let resolved = resolve_link(&candidate.href, base_url)?;

    let image = candidate
        .image
        .as_deref()
        .and_then(|src| resolve_link(src, base_url))
        .map(|u| u.to_string());

    let record = ProductRecord {
        name: candidate.name,
        description: None,
        brand: candidate.brand,
        image,
        sku: None,
        product_id: product_id(resolved.as_str()),
        price: candidate.price,
        currency: DEFAULT_CURRENCY.to_string(),
        rating: None,
        review_count: None,
        specifications: None,
        offers: None,
        offers_count: None,
        lowest_price: None,
        url: resolved.to_string(),
        scraped_from: ScrapedFrom::Listing,
        scraped_at: chrono::Utc::now(),
    };

    validated(record)
}

fn validated(record: ProductRecord) -> Option<ProductRecord> {
    if record.is_valid() {
        Some(record)
    } else {
        warn!(url = %record.url, "Dropping record without a usable product name");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::structured::PrimaryOffer;

    fn product_url() -> Url {
        Url::parse("https://geizhals.eu/noctua-nh-d15-a1088246.html").unwrap()
    }

    fn offer(merchant: &str, price: f64) -> Offer {
        Offer {
            merchant: merchant.to_string(),
            price,
            currency: "EUR".to_string(),
        }
    }

    fn dom_product() -> DomProduct {
        DomProduct {
            name: Some("DOM Name".to_string()),
            description: Some("DOM Beschreibung mit Inhalt".to_string()),
            brand: Some("DOM Marke".to_string()),
            image: Some("https://geizhals.eu/dom.jpg".to_string()),
            price: Some(99.99),
            rating: Some(3.0),
            review_count: Some(10),
            specifications: std::collections::HashMap::new(),
        }
    }

    fn structured_product() -> StructuredProduct {
        StructuredProduct {
            name: Some("Strukturierter Name".to_string()),
            description: Some("Strukturierte Beschreibung".to_string()),
            brand: Some("Noctua".to_string()),
            image: Some("https://img.example.com/s.jpg".to_string()),
            sku: Some("NH-D15".to_string()),
            offer: Some(PrimaryOffer {
                price: Some(89.9),
                currency: Some("EUR".to_string()),
                availability: None,
            }),
            merchant_offers: vec![offer("Mindfactory", 84.49)],
            rating: Some(4.8),
            review_count: Some(1523),
        }
    }

    #[test]
    fn test_structured_wins_over_dom() {
        let record =
            build_detail_record(&product_url(), Some(structured_product()), dom_product(), vec![])
                .unwrap();

        assert_eq!(record.name, "Strukturierter Name");
        assert_eq!(record.description.as_deref(), Some("Strukturierte Beschreibung"));
        assert_eq!(record.brand.as_deref(), Some("Noctua"));
        assert_eq!(record.image.as_deref(), Some("https://img.example.com/s.jpg"));
        assert_eq!(record.price, Some(89.9));
        assert_eq!(record.rating, Some(4.8));
        assert_eq!(record.review_count, Some(1523));
        assert_eq!(record.scraped_from, ScrapedFrom::Detail);
    }

    #[test]
    fn test_dom_fills_structured_gaps() {
        let mut s = structured_product();
        s.description = None;
        s.rating = None;
        s.offer = None;

        let record = build_detail_record(&product_url(), Some(s), dom_product(), vec![]).unwrap();

        assert_eq!(record.description.as_deref(), Some("DOM Beschreibung mit Inhalt"));
        assert_eq!(record.rating, Some(3.0));
        // no structured offer, so the DOM price carries
        assert_eq!(record.price, Some(99.99));
        assert_eq!(record.currency, "EUR");
    }

    #[test]
    fn test_dom_only_page() {
        let record = build_detail_record(&product_url(), None, dom_product(), vec![]).unwrap();

        assert_eq!(record.name, "DOM Name");
        assert_eq!(record.price, Some(99.99));
        assert!(record.sku.is_none());
    }

    #[test]
    fn test_product_id_from_url() {
        let record = build_detail_record(&product_url(), None, dom_product(), vec![]).unwrap();
        assert_eq!(record.product_id.as_deref(), Some("1088246"));
    }

    #[test]
    fn test_offers_combined_structured_first() {
        let dom_offers = vec![offer("Alternate", 86.9), offer("Mindfactory", 99.0)];

        let record = build_detail_record(
            &product_url(),
            Some(structured_product()),
            dom_product(),
            dom_offers,
        )
        .unwrap();

        let offers = record.offers.unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].merchant, "Mindfactory");
        assert_eq!(offers[0].price, 84.49);
        assert_eq!(offers[1].merchant, "Alternate");
        assert_eq!(record.offers_count, Some(2));
    }

    #[test]
    fn test_lowest_price_from_offers() {
        let dom_offers = vec![offer("Alternate", 86.9), offer("Galaxus", 79.0)];

        let record = build_detail_record(
            &product_url(),
            Some(structured_product()),
            dom_product(),
            dom_offers,
        )
        .unwrap();

        assert_eq!(record.lowest_price, Some(79.0));
    }

    #[test]
    fn test_lowest_price_falls_back_to_merged_price() {
        let mut s = structured_product();
        s.merchant_offers.clear();

        let record = build_detail_record(&product_url(), Some(s), dom_product(), vec![]).unwrap();

        assert!(record.offers.is_none());
        assert_eq!(record.lowest_price, Some(89.9));
    }

    #[test]
    fn test_no_offers_and_no_price() {
        let mut dom = dom_product();
        dom.price = None;

        let record = build_detail_record(&product_url(), None, dom, vec![]).unwrap();

        assert!(record.offers.is_none());
        assert!(record.offers_count.is_none());
        assert!(record.lowest_price.is_none());
    }

    #[test]
    fn test_currency_defaults_to_eur() {
        let mut s = structured_product();
        s.offer = Some(PrimaryOffer {
            price: Some(50.0),
            currency: None,
            availability: None,
        });

        let record = build_detail_record(&product_url(), Some(s), dom_product(), vec![]).unwrap();
        assert_eq!(record.currency, "EUR");
    }

    #[test]
    fn test_nameless_record_dropped() {
        let mut dom = dom_product();
        dom.name = None;

        assert!(build_detail_record(&product_url(), None, dom, vec![]).is_none());
    }

    #[test]
    fn test_short_name_dropped() {
        let mut dom = dom_product();
        dom.name = Some("ab".to_string());

        assert!(build_detail_record(&product_url(), None, dom, vec![]).is_none());
    }

    #[test]
    fn test_combine_offers_caps_total() {
        let structured: Vec<Offer> = (0..6).map(|i| offer(&format!("S{}", i), 10.0)).collect();
        let dom: Vec<Offer> = (0..6).map(|i| offer(&format!("D{}", i), 20.0)).collect();

        let combined = combine_offers(structured, dom);
        assert_eq!(combined.len(), MAX_OFFERS);
        assert_eq!(combined[0].merchant, "S0");
        assert_eq!(combined[9].merchant, "D3");
    }

    #[test]
    fn test_listing_record_resolves_relative_link() {
        let base = Url::parse("https://geizhals.eu/?cat=hvent").unwrap();
        let candidate = ListingCandidate {
            href: "/arctic-p12-a2000001.html".to_string(),
            name: "Arctic P12".to_string(),
            price: Some(7.9),
            brand: Some("Arctic".to_string()),
            image: Some("/thumb.jpg".to_string()),
        };

        let record = build_listing_record(candidate, &base).unwrap();

        assert_eq!(record.url, "https://geizhals.eu/arctic-p12-a2000001.html");
        assert_eq!(record.product_id.as_deref(), Some("2000001"));
        assert_eq!(record.name, "Arctic P12");
        assert_eq!(record.price, Some(7.9));
        assert_eq!(record.currency, "EUR");
        assert_eq!(record.image.as_deref(), Some("https://geizhals.eu/thumb.jpg"));
        assert_eq!(record.scraped_from, ScrapedFrom::Listing);
        assert!(record.offers.is_none());
    }

    #[test]
    fn test_listing_record_with_bad_link_dropped() {
        let base = Url::parse("https://geizhals.eu/").unwrap();
        let candidate = ListingCandidate {
            href: "javascript:void(0)".to_string(),
            name: "Arctic P12".to_string(),
            price: None,
            brand: None,
            image: None,
        };

        assert!(build_listing_record(candidate, &base).is_none());
    }

    #[test]
    fn test_listing_record_short_name_dropped() {
        let base = Url::parse("https://geizhals.eu/").unwrap();
        let candidate = ListingCandidate {
            href: "/x-a1.html".to_string(),
            name: "ab".to_string(),
            price: None,
            brand: None,
            image: None,
        };

        assert!(build_listing_record(candidate, &base).is_none());
    }

    #[test]
    fn test_full_page_extraction() {
        let html = Html::parse_document(
            r#"<html><head>
            <script type="application/ld+json">
            {"@type": "Product", "name": "Noctua NH-D15", "mpn": "NH-D15",
             "offers": {"price": "89.90", "priceCurrency": "EUR"}}
            </script>
            </head><body>
            <h1 class="variant__header__title">Fallback Titel</h1>
            <span class="variant__rating__value">4,8</span>
            <div class="offer__item">
                <span class="offer__merchant">Mindfactory</span>
                <span class="offer__price">84,49</span>
            </div>
            </body></html>"#,
        );

        let record = extract_detail_record(&html, &product_url()).unwrap();

        assert_eq!(record.name, "Noctua NH-D15");
        assert_eq!(record.sku.as_deref(), Some("NH-D15"));
        assert_eq!(record.price, Some(89.9));
        assert_eq!(record.rating, Some(4.8));
        assert_eq!(record.offers_count, Some(1));
        assert_eq!(record.lowest_price, Some(84.49));
        assert_eq!(record.product_id.as_deref(), Some("1088246"));
    }
}
