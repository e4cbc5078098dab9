//! Crawl unit types
//!
//! A crawl unit is one scheduled fetch: the URL, the role the page plays
//! in the crawl, and enough context to process it (listing ordinal,
//! discovering page). Units are created at three points: seeding turns
//! start URLs into listing units, listing pages enqueue detail units for
//! the products they link, and each listing page may enqueue its own
//! successor.

use std::fmt;

use url::Url;

/// The role a fetched page plays in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    /// A catalog or search-result page that links to products
    List,
    /// A single product's page
    Detail,
}

impl PageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageRole::List => "list",
            PageRole::Detail => "detail",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, PageRole::List)
    }

    pub fn is_detail(&self) -> bool {
        matches!(self, PageRole::Detail)
    }
}

impl fmt::Display for PageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One scheduled fetch
#[derive(Debug, Clone)]
pub struct CrawlUnit {
    pub url: Url,
    pub role: PageRole,
    /// 1-based ordinal of a listing page; 0 for detail units
    pub page_number: u32,
    /// The page that discovered this unit, sent as the Referer header
    pub referrer: Option<Url>,
}

impl CrawlUnit {
    /// A listing unit without a referrer, used for start URLs
    pub fn list(url: Url, page_number: u32) -> Self {
        Self {
            url,
            role: PageRole::List,
            page_number,
            referrer: None,
        }
    }

    /// The successor listing page discovered on `referrer`
    pub fn next_list(url: Url, page_number: u32, referrer: Url) -> Self {
        Self {
            url,
            role: PageRole::List,
            page_number,
            referrer: Some(referrer),
        }
    }

    /// A product page discovered on the listing page `referrer`
    pub fn detail(url: Url, referrer: Url) -> Self {
        Self {
            url,
            role: PageRole::Detail,
            page_number: 0,
            referrer: Some(referrer),
        }
    }
}
