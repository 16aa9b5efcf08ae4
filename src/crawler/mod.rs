//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Page rendering over HTTP
//! - The shared frontier with at-most-once admission
//! - The per-URL processing pipeline
//! - Worker pool coordination and quiescence detection

mod coordinator;
mod frontier;
mod processor;
mod renderer;

pub use coordinator::{Coordinator, WorkerState};
pub use frontier::Frontier;
pub use processor::{PageProcessor, ProcessorSettings};
pub use renderer::{build_http_client, parse_document, HttpRenderer, PageRenderer, RenderedPage};

use crate::config::Config;
use crate::extract::{HtmlTagExtractor, Tag, TagExtractor};
use crate::storage::{SqliteStorage, Storage};
use crate::url::{canonicalize, site_name, site_root};
use crate::{Result, UrlError};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Outcome of a crawl or single-page run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Distinct URLs whose processing finished, failed ones included
    pub visited: usize,

    /// Visited URLs whose processing failed
    pub failed: usize,

    /// Distinct URLs admitted to the frontier
    pub admitted: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Whether the run was stopped by a cancellation signal
    pub cancelled: bool,
}

/// Runs a complete crawl starting from `seed`
///
/// This is the main entry point for crawling a site. It will:
/// 1. Open the database and upsert the site
/// 2. Seed the frontier
/// 3. Build one renderer and one store session per worker
/// 4. Run the worker pool until quiescence or Ctrl-C
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `seed` - The seed URL; it is also the scope every followed link must fall under
/// * `tags` - The tags to extract from every page
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed, possibly with per-page failures
/// * `Err(ScraperError)` - Crawl could not start
pub async fn crawl_site(config: &Config, seed: &Url, tags: Vec<Tag>) -> Result<CrawlSummary> {
    let base_url = canonicalize(seed.as_str()).ok_or_else(|| UrlError::Parse(seed.to_string()))?;
    let db_path = Path::new(&config.output.database_path);

    let site_id = {
        let mut storage = SqliteStorage::new(db_path)?;
        storage.upsert_site(&base_url, &site_name(seed))?
    };
    tracing::info!("Crawling site {} (ID {})", base_url, site_id);

    let frontier = Arc::new(Frontier::new(base_url.clone()));
    frontier.seed(&base_url);

    let settings = Arc::new(ProcessorSettings::from_config(&config.crawler, tags));
    let extractor: Arc<dyn TagExtractor> = Arc::new(HtmlTagExtractor::new());

    let mut processors = Vec::with_capacity(config.crawler.workers);
    for _ in 0..config.crawler.workers {
        processors.push(PageProcessor::new(
            HttpRenderer::new(&config.user_agent)?,
            SqliteStorage::new(db_path)?,
            Arc::clone(&extractor),
            Arc::clone(&settings),
            base_url.clone(),
        ));
    }

    let coordinator = Coordinator::new(frontier, site_id);
    let token = coordinator.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping workers");
            token.cancel();
        }
    });

    let summary = coordinator.run(processors).await;
    interrupt.abort();
    summary
}

/// Processes exactly one page without following any links
///
/// The site is derived from the URL's origin and named after its host.
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - The page was attempted; a failed page is logged and counted
/// * `Err(ScraperError)` - The run could not start
pub async fn scrape_single_page(
    config: &Config,
    url: &Url,
    tags: Vec<Tag>,
) -> Result<CrawlSummary> {
    let start_time = Instant::now();
    let root = site_root(url).ok_or(UrlError::MissingHost)?;

    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let site_id = storage.upsert_site(&root, &site_name(url))?;
    tracing::info!("Scraping single page {} for site {} (ID {})", url, root, site_id);

    let mut processor = PageProcessor::new(
        HttpRenderer::new(&config.user_agent)?,
        storage,
        Arc::new(HtmlTagExtractor::new()),
        Arc::new(ProcessorSettings::from_config(&config.crawler, tags)),
        root,
    );

    let failed = match processor.process(url.as_str(), site_id).await {
        Ok(_) => 0,
        Err(e) => {
            tracing::warn!("Failed to scrape {}: {}", url, e);
            1
        }
    };

    Ok(CrawlSummary {
        visited: 1,
        failed,
        admitted: 1,
        elapsed: start_time.elapsed(),
        cancelled: false,
    })
}
