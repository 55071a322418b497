//! Corpus statistics
//!
//! This module handles:
//! - Recording every fetch attempt made by the workers
//! - Extracting the words of delivered HTML pages
//! - Summarizing the crawl and exporting the summary as markdown

mod corpus;
mod markdown;
pub mod stats;
mod words;

pub use corpus::{CorpusReport, TOP_WORDS};
pub use markdown::{format_markdown, write_markdown};
pub use stats::{print_summary, LongestPage, ReportSummary};
pub use words::{extract_words, is_stopword, tokenize, STOPWORDS};

use crate::crawler::FetchResult;
use thiserror::Error;

/// Errors that can occur while exporting a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Statistics sink fed one fetch at a time
///
/// Workers call `record` for every fetch attempt, whatever its status.
/// Implementations synchronize internally and must never panic or fail:
/// anything they cannot make sense of is recorded as zero words.
pub trait Report: Send + Sync {
    fn record(&self, result: &FetchResult, words: &[String]);
}
