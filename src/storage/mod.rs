//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Site, link and page records
//! - Tag bundle persistence (one per page)
//! - Atomic per-visit writes

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::extract::TagBundle;

/// Represents a site in the database
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub base_url: String,
    pub name: String,
    pub created_at: String,
}

/// Represents a page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub title: Option<String>,
    pub site_id: i64,
}

/// Everything written for one successfully rendered page
#[derive(Debug, Clone, Copy)]
pub struct PageVisit<'a> {
    pub url: &'a str,
    pub name: &'a str,
    pub title: Option<&'a str>,
    pub site_id: i64,
    pub bundle: &'a TagBundle,
}
