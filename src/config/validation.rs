use crate::config::types::{Config, CrawlerConfig, OutputConfig};
use crate::extract::Tag;
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.render_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "render_timeout_ms must be greater than zero".to_string(),
        ));
    }

    resolve_tags(&config.tags)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Splits a comma-separated tag list as typed on the command line
///
/// Whitespace around each name is dropped, as are empty entries.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Resolves configured tag names into the known tag set
///
/// Duplicates are collapsed, keeping the first occurrence.
pub fn resolve_tags(names: &[String]) -> ConfigResult<Vec<Tag>> {
    if names.is_empty() {
        return Err(ConfigError::Validation(
            "tag list cannot be empty".to_string(),
        ));
    }

    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        let tag: Tag = name.parse()?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// Validates the seed URL given for a run
///
/// The seed must be a non-empty absolute http(s) URL with a host.
pub fn validate_seed_url(seed: &str) -> ConfigResult<Url> {
    let seed = seed.trim();
    if seed.is_empty() {
        return Err(ConfigError::Validation(
            "seed URL cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(url)
}
