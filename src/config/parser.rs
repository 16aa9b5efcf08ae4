//! Reading the TOML file
//!
//! Every entry point validates before returning, so a `Config` that leaves
//! this module is safe to hand to a crawl. The hash is taken over the exact
//! bytes that were parsed.

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates configuration text
///
/// Missing sections and keys fall back to their defaults, so empty input
/// yields the default configuration.
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the scraper configuration from `path`
///
/// # Returns
///
/// * `Ok(Config)` - The file was read, parsed and validated
/// * `Err(ConfigError::Io)` - The file could not be read
/// * `Err(ConfigError::Parse)` - The file is not valid TOML for a scraper config
/// * `Err(ConfigError::Validation)` - Worker count, delays or timeout are out of range
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Loads the configuration together with the hex SHA-256 of the file
///
/// The hash is logged at startup so a run can be traced back to its settings.
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, content_hash(&content)))
}

fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
