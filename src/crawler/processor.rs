//! Per-URL processing pipeline
//!
//! One visit is: render, politeness delay, extract, persist, then report the
//! admittable outbound links. Every processor owns its renderer and its store
//! session; only the extractor and the settings are shared.

use crate::config::CrawlerConfig;
use crate::crawler::{PageRenderer, RenderedPage};
use crate::extract::{Tag, TagExtractor};
use crate::storage::{PageVisit, Storage};
use crate::url::{is_admittable, page_name};
use crate::{FetchError, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Settings shared by every processor of a run
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    /// Tags extracted from every page
    pub tags: Vec<Tag>,

    /// Upper bound on one render
    pub render_timeout: Duration,

    /// Politeness delay range applied after each successful render
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl ProcessorSettings {
    /// Builds settings from the crawler configuration and an already resolved tag list
    pub fn from_config(config: &CrawlerConfig, tags: Vec<Tag>) -> Self {
        Self {
            tags,
            render_timeout: Duration::from_millis(config.render_timeout_ms),
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Picks a delay uniformly within the configured range
    fn politeness_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let millis = rand::thread_rng()
            .gen_range(self.min_delay.as_millis() as u64..=self.max_delay.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Processes one URL at a time for a single worker
pub struct PageProcessor<R, S> {
    renderer: R,
    storage: S,
    extractor: Arc<dyn TagExtractor>,
    settings: Arc<ProcessorSettings>,
    base_url: String,
}

impl<R, S> PageProcessor<R, S>
where
    R: PageRenderer,
    S: Storage,
{
    pub fn new(
        renderer: R,
        storage: S,
        extractor: Arc<dyn TagExtractor>,
        settings: Arc<ProcessorSettings>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            storage,
            extractor,
            settings,
            base_url: base_url.into(),
        }
    }

    /// Visits `url` and returns the outbound links worth offering to the frontier
    ///
    /// Equivalent to [`render`](Self::render) followed by [`complete`](Self::complete).
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to visit
    /// * `site_id` - The site the page belongs to
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Admittable outbound links, in document order
    /// * `Err(ScraperError::Fetch)` - The page could not be loaded; nothing was written
    /// * `Err(ScraperError::Storage)` - The visit could not be persisted; nothing was written
    pub async fn process(&mut self, url: &str, site_id: i64) -> Result<Vec<String>> {
        let page = self.render(url).await?;
        self.complete(url, page, site_id).await
    }

    /// Loads `url`, bounded by the configured render timeout
    pub async fn render(&mut self, url: &str) -> Result<RenderedPage> {
        let timeout = self.settings.render_timeout;
        let page = tokio::time::timeout(timeout, self.renderer.render(url, timeout))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })??;
        Ok(page)
    }

    /// Finishes a visit for an already rendered page
    ///
    /// Sleeps the politeness delay, extracts the configured tags, persists the
    /// visit in one transaction and filters the page's links.
    pub async fn complete(
        &mut self,
        url: &str,
        page: RenderedPage,
        site_id: i64,
    ) -> Result<Vec<String>> {
        let delay = self.settings.politeness_delay();
        if !delay.is_zero() {
            tracing::trace!("Sleeping {:?} after rendering {}", delay, url);
            tokio::time::sleep(delay).await;
        }

        let name = page_name(url);
        let bundle = self.extractor.extract(&page, &self.settings.tags);

        let page_id = self.storage.persist_visit(&PageVisit {
            url,
            name: &name,
            title: page.title.as_deref(),
            site_id,
            bundle: &bundle,
        })?;

        tracing::debug!(
            "Saved page {} ({}) as {} with {} extracted elements",
            url,
            name,
            page_id,
            bundle.element_count()
        );

        let discovered = page
            .links
            .into_iter()
            .filter(|link| is_admittable(link, &self.base_url))
            .collect();

        Ok(discovered)
    }
}
