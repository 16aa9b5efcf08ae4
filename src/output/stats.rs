//! Statistics generation from the scrape database
//!
//! This module provides functionality for extracting and displaying
//! database statistics from the storage layer.

use crate::storage::Storage;
use crate::Result;

/// Database statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Number of crawled sites
    pub total_sites: u64,

    /// Number of visited pages
    pub total_pages: u64,

    /// Number of discovered same-site links
    pub total_links: u64,

    /// Number of stored tag bundles
    pub total_tag_bundles: u64,
}

impl CrawlStatistics {
    /// Pages that have no tag bundle (only possible after an interrupted write)
    pub fn pages_without_bundle(&self) -> u64 {
        self.total_pages.saturating_sub(self.total_tag_bundles)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(ScraperError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics> {
    Ok(CrawlStatistics {
        total_sites: storage.count_sites()?,
        total_pages: storage.count_pages()?,
        total_links: storage.count_links()?,
        total_tag_bundles: storage.count_tag_bundles()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.total_sites);
    println!("  Pages visited: {}", stats.total_pages);
    println!("  Links found: {}", stats.total_links);
    println!("  Tag bundles: {}", stats.total_tag_bundles);

    let missing = stats.pages_without_bundle();
    if missing > 0 {
        println!();
        println!("  {} pages have no tag bundle", missing);
    }
}
