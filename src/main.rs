//! Pfennigfuchs main entry point
//!
//! This is the command-line interface for the Pfennigfuchs catalog scraper.

use anyhow::Context;
use clap::Parser;
use pfennigfuchs::config::{load_config_with_hash, validate, Config};
use pfennigfuchs::crawler::{scrape, RunSummary};
use pfennigfuchs::sink::create_sink;
use pfennigfuchs::url::resolve_start_urls;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pfennigfuchs: a price-comparison catalog scraper
///
/// Pfennigfuchs walks paginated Geizhals category and search listings,
/// visits the linked product pages, and writes normalized product records
/// to a JSON Lines file or a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "pfennigfuchs")]
#[command(version = "1.0.0")]
#[command(about = "A price-comparison catalog scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (missing file runs with defaults)
    #[arg(short, long, value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without fetching
    #[arg(long)]
    dry_run: bool,

    /// Free-text search, overriding the configured query
    #[arg(long, value_name = "TEXT")]
    query: Option<String>,

    /// Category slug, overriding the configured category
    #[arg(long, value_name = "SLUG")]
    category: Option<String>,

    /// Site country ("at", "de", or "eu"), overriding the configuration
    #[arg(long, value_name = "CODE")]
    country: Option<String>,

    /// Result budget, overriding the configured results-wanted
    #[arg(long, value_name = "N")]
    results_wanted: Option<i64>,

    /// Listing page ceiling, overriding the configured max-pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Output file path, overriding the configured output
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration after command-line overrides")?;

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(());
    }

    handle_scrape(config, &config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pfennigfuchs=info,warn"),
            1 => EnvFilter::new("pfennigfuchs=debug,info"),
            2 => EnvFilter::new("pfennigfuchs=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(query) = &cli.query {
        config.search.query = query.clone();
    }
    if let Some(category) = &cli.category {
        config.search.category = category.clone();
    }
    if let Some(country) = &cli.country {
        config.search.country = country.clone();
    }
    if let Some(results_wanted) = cli.results_wanted {
        config.limits.results_wanted = results_wanted;
    }
    if let Some(max_pages) = cli.max_pages {
        config.limits.max_pages = max_pages;
    }
    if let Some(output) = &cli.output {
        config.output.path = output.to_string_lossy().to_string();
    }
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Pfennigfuchs Dry Run ===\n");

    let start_urls = resolve_start_urls(&config.search)?;
    println!("Start URLs ({}):", start_urls.len());
    for url in &start_urls {
        println!("  - {}", url);
    }

    println!("\nLimits:");
    if config.limits.results_wanted <= 0 {
        println!("  Results wanted: unbounded");
    } else {
        println!("  Results wanted: {}", config.limits.results_wanted);
    }
    println!("  Max pages: {}", config.limits.max_pages);
    println!("  Collect details: {}", config.limits.collect_details);

    println!("\nFetcher:");
    println!("  Concurrency: {}", config.fetcher.concurrency);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Retries: {}", config.fetcher.retries);

    println!("\nOutput:");
    println!("  Format: {}", config.output.format);
    println!("  Path: {}", config.output.path);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start scraping {} URL(s)", start_urls.len());

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let output_path = config.output.path.clone();
    let sink = create_sink(&config.output, config_hash)
        .with_context(|| format!("failed to open output {}", output_path))?;

    match scrape(config, sink).await {
        Ok(summary) => {
            print_summary(&summary, &output_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}

/// Prints the closing run summary
fn print_summary(summary: &RunSummary, output_path: &str) {
    println!("\n=== Scrape Summary ===");
    println!(
        "Products saved: {} (target: {})",
        summary.products_saved,
        summary.target_label()
    );
    println!("Listing pages visited: {}", summary.pages_visited);
    println!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!("Output: {}", output_path);

    if summary.products_saved == 0 {
        println!("\nNo products were saved. Likely causes:");
        println!("  - the site is blocking automated clients");
        println!("  - the page markup changed and no selectors matched");
        println!("  - the search or price filters matched nothing");
        println!("  - network errors exhausted the retry budget");
    }
}
