//! Crawl frontier
//!
//! The frontier owns the queue of URLs to crawl and the dedup ledger:
//! - `add` accepts a URL once per canonical form
//! - `get_next` hands out pending URLs and parks while others are in flight
//! - `mark_complete` retires a URL for good
//!
//! All three operations take the same lock, so they are atomic with respect to
//! each other. Exhaustion means no pending and no in-flight URLs; every parked
//! worker is woken and sees `None` at that point.
//!
//! The optional SQLite ledger sits behind its own lock and is written after the
//! queue lock is released. Inserts are `OR IGNORE` and completions are upserts,
//! so the two writes for one URL may land in either order.

mod ledger;
mod state;

pub use ledger::{Ledger, LedgerRecord};
pub use state::UrlState;

use crate::url::Canonicalizer;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

struct FrontierState {
    pending: VecDeque<String>,
    states: HashMap<String, UrlState>,
    in_flight: usize,
    completed: usize,
}

impl FrontierState {
    fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }
}

/// Thread-safe URL queue plus dedup ledger
pub struct Frontier {
    canonicalizer: Canonicalizer,
    state: Mutex<FrontierState>,
    ledger: Option<Mutex<Ledger>>,
    notify: Notify,
}

impl Frontier {
    /// Creates an empty in-memory frontier
    pub fn new(canonicalizer: Canonicalizer) -> Self {
        Self::with_ledger(canonicalizer, None)
    }

    /// Opens a frontier backed by a SQLite ledger
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the ledger database
    /// * `canonicalizer` - Canonicalizer defining URL identity
    /// * `restart` - Discard any saved progress
    ///
    /// # Returns
    ///
    /// * `Ok(Frontier)` - Completed URLs are known, the rest are pending again
    /// * `Err(rusqlite::Error)` - The ledger could not be opened or read
    pub fn open(
        path: &Path,
        canonicalizer: Canonicalizer,
        restart: bool,
    ) -> Result<Self, rusqlite::Error> {
        let mut ledger = Ledger::open(path)?;

        if restart {
            tracing::info!("Clearing frontier ledger at {}", path.display());
            ledger.clear()?;
        }

        let records = ledger.load()?;
        let frontier = Self::with_ledger(canonicalizer, Some(ledger));

        {
            let mut state = frontier.lock();
            for record in records {
                if record.state.is_terminal() {
                    state.completed += 1;
                    state.states.insert(record.url, UrlState::Complete);
                } else {
                    state.pending.push_back(record.url.clone());
                    state.states.insert(record.url, UrlState::Pending);
                }
            }

            tracing::info!(
                "Loaded frontier ledger: {} complete, {} pending",
                state.completed,
                state.pending.len()
            );
        }

        Ok(frontier)
    }

    fn with_ledger(canonicalizer: Canonicalizer, ledger: Option<Ledger>) -> Self {
        Self {
            canonicalizer,
            state: Mutex::new(FrontierState {
                pending: VecDeque::new(),
                states: HashMap::new(),
                in_flight: 0,
                completed: 0,
            }),
            ledger: ledger.map(Mutex::new),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `write` against the ledger, if any; failures are logged and ignored
    fn write_ledger<F>(&self, url: &str, action: &str, write: F)
    where
        F: FnOnce(&mut Ledger, &str) -> Result<(), rusqlite::Error>,
    {
        let Some(ledger) = &self.ledger else {
            return;
        };

        let mut ledger = ledger.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = write(&mut *ledger, url) {
            tracing::warn!("Failed to {} {} in frontier ledger: {}", action, url, e);
        }
    }

    fn identity(&self, url: &str) -> Option<String> {
        self.canonicalizer.canonicalize(url).ok()
    }

    /// Adds a URL unless its canonical form is already known
    ///
    /// # Returns
    ///
    /// `true` if a new pending entry was created. Malformed URLs and canonical
    /// duplicates of queued, in-flight or completed URLs return `false`.
    pub fn add(&self, url: &str) -> bool {
        let Some(canonical) = self.identity(url) else {
            tracing::debug!("Not adding malformed URL {}", url);
            return false;
        };

        {
            let mut state = self.lock();
            if state.states.contains_key(&canonical) {
                return false;
            }

            state.states.insert(canonical.clone(), UrlState::Pending);
            state.pending.push_back(canonical.clone());
        }

        self.notify.notify_waiters();
        self.write_ledger(&canonical, "record", Ledger::insert);
        true
    }

    /// Waits for the next pending URL
    ///
    /// Parks while the queue is empty but other URLs are in flight, since those
    /// may still yield links. Returns `None` once the frontier is exhausted.
    pub async fn get_next(&self) -> Option<String> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a notification between the check and
            // the await is not lost
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(url) = state.pending.pop_front() {
                    state.states.insert(url.clone(), UrlState::InFlight);
                    state.in_flight += 1;
                    return Some(url);
                }

                if state.in_flight == 0 {
                    drop(state);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks a URL complete
    ///
    /// Completing a URL twice is a no-op. A URL the frontier never handed out
    /// is recorded as complete so it is never queued later.
    pub fn mark_complete(&self, url: &str) {
        let canonical = self.identity(url).unwrap_or_else(|| url.to_string());

        let exhausted = {
            let mut state = self.lock();
            let previous = state.states.insert(canonical.clone(), UrlState::Complete);

            match previous {
                Some(UrlState::Complete) => return,
                Some(UrlState::InFlight) => state.in_flight -= 1,
                Some(UrlState::Pending) => state.pending.retain(|queued| queued != &canonical),
                None => {}
            }
            state.completed += 1;
            state.is_exhausted()
        };

        if exhausted {
            self.notify.notify_waiters();
        }

        self.write_ledger(&canonical, "complete", Ledger::mark_complete);
    }

    /// Drops pending URLs that no longer satisfy `keep`
    ///
    /// Used after resuming from a ledger written under an older policy.
    /// Returns the number of URLs dropped.
    pub fn retain_pending<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let mut state = self.lock();
        let before = state.pending.len();

        let (kept, dropped): (VecDeque<String>, VecDeque<String>) =
            state.pending.drain(..).partition(|url| keep(url));
        state.pending = kept;
        for url in &dropped {
            state.states.remove(url);
        }

        before - state.pending.len()
    }

    /// Current state of a URL, looked up by canonical form
    pub fn state_of(&self, url: &str) -> Option<UrlState> {
        let canonical = self.identity(url)?;
        self.lock().states.get(&canonical).copied()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight
    }

    pub fn completed_count(&self) -> usize {
        self.lock().completed
    }

    /// True when the frontier has never accepted a URL
    pub fn is_empty(&self) -> bool {
        self.lock().states.is_empty()
    }

    /// True when no pending and no in-flight URLs remain
    pub fn is_exhausted(&self) -> bool {
        self.lock().is_exhausted()
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new(Canonicalizer::default())
    }
}
