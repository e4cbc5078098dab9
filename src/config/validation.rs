use crate::config::types::{Config, FetcherConfig, LimitsConfig, OutputConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Country codes with a Geizhals site behind them
const COUNTRIES: &[&str] = &["at", "de", "eu"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_limits_config(&config.limits)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates search configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if !COUNTRIES.contains(&config.country.as_str()) {
        return Err(ConfigError::Validation(format!(
            "country must be one of {}, got '{}'",
            COUNTRIES.join(", "),
            config.country
        )));
    }

    if config.min_price < 0.0 || config.max_price < 0.0 {
        return Err(ConfigError::Validation(format!(
            "prices cannot be negative, got min {} and max {}",
            config.min_price, config.max_price
        )));
    }

    if config.max_price > 0.0 && config.min_price > config.max_price {
        return Err(ConfigError::Validation(format!(
            "min-price ({}) cannot exceed max-price ({})",
            config.min_price, config.max_price
        )));
    }

    for start_url in &config.start_urls {
        let url = Url::parse(start_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start_url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Start URL '{}' must use http or https",
                start_url
            )));
        }
    }

    Ok(())
}

/// Validates crawl limit configuration
fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    // results_wanted <= 0 means unbounded, so any value is acceptable

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation("path cannot be empty".to_string()));
    }

    Ok(())
}
