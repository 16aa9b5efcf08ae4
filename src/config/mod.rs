//! Configuration module for Site-Scraper
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line overrides are applied on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use site_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Crawling with {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, LoggingConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, load_config_with_hash, parse_config};

// Re-export validation entry points used before a run starts
pub use validation::{parse_tag_list, resolve_tags, validate, validate_seed_url};
