//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::extract::TagBundle;
use crate::storage::{PageRecord, PageVisit, SiteRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// One value of an implementing type is one session. Sessions are owned by a
/// single worker and are never shared; the backend provides whatever isolation
/// concurrent sessions need.
pub trait Storage: Send {
    // ===== Site Management =====

    /// Inserts a site, or refreshes its name if the base URL already exists
    ///
    /// # Returns
    ///
    /// The site ID (either newly created or existing)
    fn upsert_site(&mut self, base_url: &str, name: &str) -> StorageResult<i64>;

    /// Gets a site by ID
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Finds a site by its base URL
    fn find_site(&self, base_url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Counts the total number of sites
    fn count_sites(&self) -> StorageResult<u64>;

    // ===== Link Management =====

    /// Records a discovered URL for a site; existing URLs are left untouched
    fn insert_link_if_absent(&mut self, url: &str, site_id: i64) -> StorageResult<()>;

    /// Lists every link recorded for a site, in insertion order
    fn list_links(&self, site_id: i64) -> StorageResult<Vec<String>>;

    /// Counts the total number of links
    fn count_links(&self) -> StorageResult<u64>;

    // ===== Page Management =====

    /// Inserts a page, or refreshes its title and site if the URL already exists
    ///
    /// # Returns
    ///
    /// The page ID (either newly created or existing)
    fn upsert_page(
        &mut self,
        name: &str,
        url: &str,
        title: Option<&str>,
        site_id: i64,
    ) -> StorageResult<i64>;

    /// Gets a page by URL
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Counts the total number of pages
    fn count_pages(&self) -> StorageResult<u64>;

    // ===== Tag Bundles =====

    /// Stores the tag bundle of a page
    ///
    /// Fails with `StorageError::ConstraintViolation` if the page already has one.
    fn insert_tag_bundle(&mut self, page_id: i64, bundle: &TagBundle) -> StorageResult<()>;

    /// Gets the tag bundle of a page
    fn get_tag_bundle(&self, page_id: i64) -> StorageResult<Option<TagBundle>>;

    /// Counts the total number of tag bundles
    fn count_tag_bundles(&self) -> StorageResult<u64>;

    // ===== Page Visits =====

    /// Writes the link, page and tag bundle of one visit atomically
    ///
    /// Either all three writes commit or none does.
    ///
    /// # Returns
    ///
    /// The page ID
    fn persist_visit(&mut self, visit: &PageVisit<'_>) -> StorageResult<i64>;
}
