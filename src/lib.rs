//! Site-Scraper: a concurrent same-site crawler with structured tag extraction
//!
//! This crate crawls a website from a seed URL with a fixed pool of workers,
//! extracts headings, paragraphs, links and media from every visited page, and
//! persists the link graph together with the extracted content.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unsupported tag: {0}")]
    UnsupportedTag(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Failure to load a single page
///
/// Always recovered locally: the URL stays visited and the crawl moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Timed out after {timeout_ms}ms loading {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type}")]
    NotHtml { url: String, content_type: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },
}

/// Failure to extract one tag from an otherwise loaded page
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid selector for <{tag}>: {message}")]
    Selector { tag: String, message: String },

    #[error("Unknown tag in stored bundle: {0}")]
    UnknownTag(String),

    #[error("Failed to encode tag bundle: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for Site-Scraper operations
pub type Result<T, E = ScraperError> = std::result::Result<T, E>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_site, scrape_single_page, CrawlSummary};
pub use extract::{Tag, TagBundle, TagCategory, TagRecord};
pub use crate::url::{in_scope, is_asset};
