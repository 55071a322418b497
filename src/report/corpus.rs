//! In-memory corpus statistics

use crate::crawler::FetchResult;
use crate::report::stats::{LongestPage, ReportSummary};
use crate::report::words::is_stopword;
use crate::report::Report;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Number of entries in the common-word ranking
pub const TOP_WORDS: usize = 50;

#[derive(Debug, Default)]
struct CorpusState {
    unique_pages: HashSet<String>,
    longest_page: Option<LongestPage>,
    word_counts: HashMap<String, u64>,
    subdomains: HashMap<String, HashSet<String>>,
    status_counts: BTreeMap<u16, u64>,
    fetches: u64,
}

/// Statistics aggregator shared by all workers
///
/// Created at crawl start with [`CorpusReport::new`] and summarized at crawl
/// end with [`CorpusReport::finalize`]. Each `record` call is atomic; no
/// cross-call consistency is promised.
#[derive(Debug)]
pub struct CorpusReport {
    started_at: DateTime<Utc>,
    state: Mutex<CorpusState>,
}

impl CorpusReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            state: Mutex::new(CorpusState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CorpusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of fetches recorded so far
    pub fn fetch_count(&self) -> u64 {
        self.lock().fetches
    }

    /// Number of distinct pages delivered so far
    pub fn unique_page_count(&self) -> usize {
        self.lock().unique_pages.len()
    }

    /// Builds the end-of-crawl summary
    pub fn finalize(&self) -> ReportSummary {
        let finished_at = Utc::now();
        let state = self.lock();

        let mut common_words: Vec<(String, u64)> = state
            .word_counts
            .iter()
            .map(|(word, count)| (word.clone(), *count))
            .collect();
        common_words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        common_words.truncate(TOP_WORDS);

        let subdomains: BTreeMap<String, usize> = state
            .subdomains
            .iter()
            .map(|(host, pages)| (host.clone(), pages.len()))
            .collect();

        ReportSummary {
            started_at: self.started_at.to_rfc3339(),
            finished_at: finished_at.to_rfc3339(),
            duration_seconds: (finished_at - self.started_at).num_seconds().max(0) as u64,
            total_fetches: state.fetches,
            unique_pages: state.unique_pages.len(),
            longest_page: state.longest_page.clone(),
            common_words,
            subdomains,
            status_counts: state.status_counts.clone(),
        }
    }
}

impl Default for CorpusReport {
    fn default() -> Self {
        Self::new()
    }
}

impl Report for CorpusReport {
    fn record(&self, result: &FetchResult, words: &[String]) {
        let mut state = self.lock();
        state.fetches += 1;
        *state.status_counts.entry(result.status).or_insert(0) += 1;

        if !result.is_delivery() {
            return;
        }

        let Some(page) = page_identity(&result.url) else {
            return;
        };

        if let Some(host) = page.host_str() {
            state
                .subdomains
                .entry(host.to_lowercase())
                .or_default()
                .insert(page.to_string());
        }

        let longer = state
            .longest_page
            .as_ref()
            .map_or(true, |longest| words.len() > longest.word_count);
        if longer && !words.is_empty() {
            state.longest_page = Some(LongestPage {
                url: page.to_string(),
                word_count: words.len(),
            });
        }

        for word in words {
            if is_stopword(word) || word.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            *state.word_counts.entry(word.clone()).or_insert(0) += 1;
        }

        state.unique_pages.insert(page.into());
    }
}

/// A page is identified by its URL without the fragment
fn page_identity(url: &str) -> Option<Url> {
    let mut parsed = Url::parse(url).ok()?;
    parsed.set_fragment(None);
    Some(parsed)
}
