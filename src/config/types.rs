use serde::Deserialize;

use crate::state::UNBOUNDED;

/// Main configuration structure for Pfennigfuchs
///
/// Every field has a default, so an empty file (or no file at all) yields
/// a runnable configuration that browses the default category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub fetcher: FetcherConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// What to scrape: explicit URLs, or a synthesized catalog search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Listing URLs crawled as-is; when set, category and query are ignored
    #[serde(rename = "start-urls", default)]
    pub start_urls: Vec<String>,

    /// Category slug to browse (e.g. "hvent" for case fans)
    #[serde(default = "default_category")]
    pub category: String,

    /// Free-text search sent alongside (or instead of) the category
    #[serde(default)]
    pub query: String,

    /// Lower price bound in euros; 0 disables the bound
    #[serde(rename = "min-price", default)]
    pub min_price: f64,

    /// Upper price bound in euros; 0 disables the bound
    #[serde(rename = "max-price", default)]
    pub max_price: f64,

    /// Site country: "at", "de", or "eu"
    #[serde(default = "default_country")]
    pub country: String,
}

/// How much to scrape before stopping
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Number of product records to collect; zero or negative lifts the limit
    #[serde(rename = "results-wanted", default = "default_results_wanted")]
    pub results_wanted: i64,

    /// Ceiling on listing pages visited per pagination branch
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Visit each product's page for full records; when false, records come
    /// from the listing tiles alone
    #[serde(rename = "collect-details", default = "default_collect_details")]
    pub collect_details: bool,
}

impl LimitsConfig {
    /// The result budget as a counter target
    pub fn effective_results_wanted(&self) -> usize {
        if self.results_wanted <= 0 {
            UNBOUNDED
        } else {
            self.results_wanted as usize
        }
    }
}

/// HTTP transport behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Maximum number of pages fetched at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional attempts after a transient failure
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Where product records go
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output format: "jsonl" or "sqlite"
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file path
    #[serde(default = "default_output_path")]
    pub path: String,
}

/// Supported record sinks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// SQLite database with relational offer and specification tables
    Sqlite,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ===== Defaults =====

fn default_category() -> String {
    // case fans, a well-populated category
    "hvent".to_string()
}

fn default_country() -> String {
    "eu".to_string()
}

fn default_results_wanted() -> i64 {
    100
}

fn default_max_pages() -> u32 {
    20
}

fn default_collect_details() -> bool {
    true
}

fn default_concurrency() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    90
}

fn default_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_output_path() -> String {
    "products.jsonl".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            start_urls: Vec::new(),
            category: default_category(),
            query: String::new(),
            min_price: 0.0,
            max_price: 0.0,
            country: default_country(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            results_wanted: default_results_wanted(),
            max_pages: default_max_pages(),
            collect_details: default_collect_details(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: default_output_path(),
        }
    }
}
