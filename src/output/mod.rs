//! Output module for reporting run results
//!
//! This module handles:
//! - The end-of-run summary line
//! - Link listings for a site
//! - Database statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::crawler::CrawlSummary;
use crate::storage::Storage;
use crate::Result;

/// Formats the one-line run summary
///
/// # Example
///
/// ```
/// use site_scraper::crawler::CrawlSummary;
/// use site_scraper::output::format_summary;
/// use std::time::Duration;
///
/// let summary = CrawlSummary {
///     visited: 12,
///     failed: 1,
///     admitted: 12,
///     elapsed: Duration::from_millis(3500),
///     cancelled: false,
/// };
/// assert_eq!(format_summary(&summary), "Scraped 12 pages in 3.50 seconds (1 failed)");
/// ```
pub fn format_summary(summary: &CrawlSummary) -> String {
    let mut line = format!(
        "Scraped {} pages in {:.2} seconds",
        summary.visited,
        summary.elapsed.as_secs_f64()
    );

    if summary.failed > 0 {
        line.push_str(&format!(" ({} failed)", summary.failed));
    }
    if summary.cancelled {
        line.push_str(" [interrupted]");
    }

    line
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("{}", format_summary(summary));
}

/// Prints every recorded link of the site at `base_url`
///
/// # Returns
///
/// * `Ok(usize)` - Number of links printed (0 if the site was never crawled)
/// * `Err(ScraperError)` - Failed to query storage
pub fn print_links(storage: &dyn Storage, base_url: &str) -> Result<usize> {
    let Some(site) = storage.find_site(base_url)? else {
        println!("No site recorded for {}", base_url);
        return Ok(0);
    };

    let links = storage.list_links(site.id)?;
    println!("=== Links for {} ({}) ===\n", site.name, site.base_url);
    for link in &links {
        println!("{}", link);
    }
    println!("\n{} links", links.len());

    Ok(links.len())
}
