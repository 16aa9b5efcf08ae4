//! Crawler coordinator - worker pool orchestration
//!
//! This module runs a fixed pool of workers over one shared frontier:
//! - Spawning one task per page processor
//! - Feeding discovered links back into the frontier
//! - Detecting quiescence and closing the frontier
//! - Handling run-level cancellation
//! - Shutting the pool down when a worker task dies
//! - Collecting the run summary

use crate::crawler::{CrawlSummary, Frontier, PageProcessor, PageRenderer};
use crate::storage::{Storage, StorageError};
use crate::{Result, ScraperError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Lifecycle of one worker
///
/// `Fetching` covers the render; `Processing` covers the politeness delay,
/// extraction, persistence and offering of discovered links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Fetching,
    Processing,
    Stopped,
}

#[derive(Debug, Default)]
struct Counters {
    visited: AtomicUsize,
    failed: AtomicUsize,
}

/// Current state of every worker of a run, indexed by worker id
#[derive(Debug, Default)]
struct WorkerStates(Mutex<Vec<WorkerState>>);

impl WorkerStates {
    fn reset(&self, workers: usize) {
        *self.lock() = vec![WorkerState::Idle; workers];
    }

    fn snapshot(&self) -> Vec<WorkerState> {
        self.lock().clone()
    }

    fn transition(&self, worker_id: usize, next: WorkerState) {
        let mut states = self.lock();
        if let Some(state) = states.get_mut(worker_id) {
            tracing::trace!("Worker {}: {:?} -> {:?}", worker_id, state, next);
            *state = next;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<WorkerState>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    frontier: Arc<Frontier>,
    site_id: i64,
    cancel: CancellationToken,
    states: Arc<WorkerStates>,
}

impl Coordinator {
    /// Creates a coordinator for an already seeded frontier
    ///
    /// # Arguments
    ///
    /// * `frontier` - The shared frontier, seeded with at least one URL
    /// * `site_id` - The site every visited page is attached to
    pub fn new(frontier: Arc<Frontier>, site_id: i64) -> Self {
        Self {
            frontier,
            site_id,
            cancel: CancellationToken::new(),
            states: Arc::new(WorkerStates::default()),
        }
    }

    /// Returns a handle that stops the run when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the state of each worker of the current or last run
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.states.snapshot()
    }

    /// Runs one worker per processor until the frontier is quiescent or the
    /// run is cancelled
    ///
    /// If a worker task panics, the frontier is closed and the run cancelled
    /// so the remaining workers stop; the run then reports the failure.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - All workers stopped
    /// * `Err(ScraperError::Worker)` - No processors were given, or a worker task panicked
    pub async fn run<R, S>(&self, processors: Vec<PageProcessor<R, S>>) -> Result<CrawlSummary>
    where
        R: PageRenderer + 'static,
        S: Storage + 'static,
    {
        if processors.is_empty() {
            return Err(ScraperError::Worker("at least one worker is required".to_string()));
        }

        let start_time = Instant::now();
        let counters = Arc::new(Counters::default());
        self.states.reset(processors.len());

        if self.frontier.pending() == 0 {
            tracing::warn!("Frontier is empty at start, nothing to crawl");
            self.frontier.close();
        }

        tracing::info!(
            "Starting {} workers on {}",
            processors.len(),
            self.frontier.base_url()
        );

        let mut workers = JoinSet::new();
        for (worker_id, processor) in processors.into_iter().enumerate() {
            workers.spawn(run_worker(
                worker_id,
                processor,
                Arc::clone(&self.frontier),
                self.site_id,
                self.cancel.clone(),
                Arc::clone(&counters),
                Arc::clone(&self.states),
            ));
        }

        let mut worker_failure = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
                if worker_failure.is_none() {
                    self.frontier.close();
                    self.cancel.cancel();
                    worker_failure = Some(ScraperError::Worker(e.to_string()));
                }
            }
        }

        if let Some(e) = worker_failure {
            return Err(e);
        }

        let summary = CrawlSummary {
            visited: counters.visited.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
            admitted: self.frontier.admitted_count(),
            elapsed: start_time.elapsed(),
            cancelled: self.cancel.is_cancelled(),
        };

        tracing::info!(
            "Crawl finished: {} pages visited ({} failed) in {:?}",
            summary.visited,
            summary.failed,
            summary.elapsed
        );

        Ok(summary)
    }
}

async fn run_worker<R, S>(
    worker_id: usize,
    mut processor: PageProcessor<R, S>,
    frontier: Arc<Frontier>,
    site_id: i64,
    cancel: CancellationToken,
    counters: Arc<Counters>,
    states: Arc<WorkerStates>,
) where
    R: PageRenderer,
    S: Storage,
{
    loop {
        let url = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = frontier.take() => match next {
                Some(url) => url,
                None => break,
            },
        };

        states.transition(worker_id, WorkerState::Fetching);
        tracing::debug!("Worker {} processing URL: {}", worker_id, url);

        let rendered = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Worker {} abandoning {} on cancellation", worker_id, url);
                break;
            }
            rendered = processor.render(&url) => rendered,
        };

        states.transition(worker_id, WorkerState::Processing);

        let outcome = match rendered {
            Ok(page) => tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Worker {} abandoning {} on cancellation", worker_id, url);
                    break;
                }
                outcome = processor.complete(&url, page, site_id) => outcome,
            },
            Err(e) => Err(e),
        };

        counters.visited.fetch_add(1, Ordering::SeqCst);

        match outcome {
            Ok(discovered) => {
                let admitted = discovered
                    .iter()
                    .filter(|link| frontier.offer(link))
                    .count();
                tracing::debug!(
                    "{}: {} links found, {} newly admitted",
                    url,
                    discovered.len(),
                    admitted
                );
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                match e {
                    ScraperError::Fetch(_) => tracing::warn!("Failed to load {}: {}", url, e),
                    ScraperError::Storage(StorageError::ConstraintViolation(_)) => {
                        tracing::warn!("Persistence conflict on {}: {}", url, e)
                    }
                    _ => tracing::error!("Error processing {}: {}", url, e),
                }
            }
        }

        if frontier.done_signal() {
            tracing::info!("No work queued or in flight, closing frontier");
            frontier.close();
        }

        states.transition(worker_id, WorkerState::Idle);
    }

    states.transition(worker_id, WorkerState::Stopped);
}
