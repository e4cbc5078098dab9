use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

/// Loads and parses a configuration file from the given path
///
/// A missing file is not an error: every setting has a default, so the
/// scraper can run without any configuration at all.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to read, parse, or validate the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use pfennigfuchs::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Results wanted: {}", config.limits.results_wanted);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "No configuration file, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored with each run so results can be traced back to the
/// exact settings that produced them. A missing file hashes as empty
/// content, matching the defaults it stands for.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read an existing file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok((Config, String))` - Successfully loaded configuration and its hash
/// * `Err(ConfigError)` - Failed to load or parse the configuration
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[search]
category = "cpucooler"
query = "noctua"
min-price = 10.0
max-price = 120.0
country = "de"

[limits]
results-wanted = 50
max-pages = 5

[fetcher]
concurrency = 3
retries = 1

[output]
format = "sqlite"
path = "./scrape.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.search.category, "cpucooler");
        assert_eq!(config.search.query, "noctua");
        assert_eq!(config.limits.results_wanted, 50);
        assert_eq!(config.fetcher.concurrency, 3);
        assert_eq!(config.output.path, "./scrape.db");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config(Path::new("/nonexistent/config.toml")).unwrap();

        assert_eq!(config.search.category, "hvent");
        assert_eq!(config.limits.results_wanted, 100);
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[search]
country = "fr"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let config_content = "test content";
        let file = create_temp_config(config_content);

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        // Same content should produce same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_missing_file_hash_matches_empty_content() {
        let missing = compute_config_hash(Path::new("/nonexistent/config.toml")).unwrap();
        let empty = create_temp_config("");
        let empty_hash = compute_config_hash(empty.path()).unwrap();

        assert_eq!(missing, empty_hash);
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config("[limits]\nresults-wanted = 7\n");
        let (config, hash) = load_config_with_hash(file.path()).unwrap();

        assert_eq!(config.limits.results_wanted, 7);
        assert_eq!(hash.len(), 64);
    }
}
