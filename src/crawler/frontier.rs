//! Shared crawl frontier
//!
//! The frontier holds the queue of URLs waiting for a worker and the set of
//! every URL ever admitted during the run. Admission is a single
//! check-and-insert under one lock, so a URL is queued at most once no matter
//! how many workers discover it concurrently.

use crate::url::{canonicalize, is_admittable};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct FrontierState {
    /// URLs admitted but not yet taken
    queue: VecDeque<String>,

    /// Every URL admitted during this run
    admitted: HashSet<String>,

    /// URLs admitted whose unit of work has not completed yet
    pending: usize,

    closed: bool,
}

/// Concurrency-safe work queue with at-most-once admission
#[derive(Debug)]
pub struct Frontier {
    base_url: String,
    state: Mutex<FrontierState>,
    available: Notify,
}

impl Frontier {
    /// Creates an empty frontier scoped to `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Mutex::new(FrontierState::default()),
            available: Notify::new(),
        }
    }

    /// The base URL every admitted URL must fall under
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        // Every mutation is a single push/insert/counter update, so a
        // poisoned lock still guards consistent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits the seed URL without scope or asset checks
    pub fn seed(&self, url: &str) {
        let url = canonicalize(url).unwrap_or_else(|| url.to_string());

        {
            let mut state = self.lock();
            if state.closed || !state.admitted.insert(url.clone()) {
                return;
            }
            state.queue.push_back(url.clone());
            state.pending += 1;
        }

        tracing::debug!("Seeded frontier with {}", url);
        self.available.notify_one();
    }

    /// Admits `url` if it is in scope, not an asset, and never admitted before
    ///
    /// # Returns
    ///
    /// `true` if this call admitted the URL
    pub fn offer(&self, url: &str) -> bool {
        if !is_admittable(url, &self.base_url) {
            return false;
        }
        let Some(url) = canonicalize(url) else {
            return false;
        };

        {
            let mut state = self.lock();
            if state.closed || !state.admitted.insert(url.clone()) {
                return false;
            }
            state.queue.push_back(url);
            state.pending += 1;
        }

        self.available.notify_one();
        true
    }

    /// Waits for the next URL
    ///
    /// Returns `None` once the frontier is closed.
    pub async fn take(&self) -> Option<String> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // Register before checking so a close() between the check and
            // the await still wakes us
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(url) = state.queue.pop_front() {
                    return Some(url);
                }
            }

            notified.await;
        }
    }

    /// Marks one taken URL as fully processed
    ///
    /// # Returns
    ///
    /// `true` if no work is queued or in flight any more
    pub fn done_signal(&self) -> bool {
        let mut state = self.lock();
        state.pending = state.pending.saturating_sub(1);
        state.pending == 0 && state.queue.is_empty()
    }

    /// Closes the frontier and releases every blocked taker
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of admitted URLs whose work has not completed
    pub fn pending(&self) -> usize {
        self.lock().pending
    }

    /// Number of URLs waiting in the queue
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of distinct URLs admitted during the run
    pub fn admitted_count(&self) -> usize {
        self.lock().admitted.len()
    }
}
