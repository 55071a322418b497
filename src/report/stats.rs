//! End-of-crawl summary
//!
//! This module defines the summary produced by the corpus report and prints
//! it to stdout.

use std::collections::BTreeMap;

/// The page with the most words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongestPage {
    pub url: String,
    pub word_count: usize,
}

/// Summary of a finished crawl
#[derive(Debug, Clone, Default)]
pub struct ReportSummary {
    // Run metadata
    pub started_at: String,
    pub finished_at: String,
    pub duration_seconds: u64,

    /// Every fetch attempt, whatever its status
    pub total_fetches: u64,

    /// Distinct delivered pages, fragments ignored
    pub unique_pages: usize,

    pub longest_page: Option<LongestPage>,

    /// Most frequent non-stopwords, most frequent first
    pub common_words: Vec<(String, u64)>,

    /// Unique pages per host, sorted by host
    pub subdomains: BTreeMap<String, usize>,

    /// Fetch count per status
    pub status_counts: BTreeMap<u16, u64>,
}

impl ReportSummary {
    /// Fetches that did not end with a 200
    pub fn failed_fetches(&self) -> u64 {
        self.status_counts
            .iter()
            .filter(|(status, _)| **status != 200)
            .map(|(_, count)| count)
            .sum()
    }

    /// Calculates the share of fetches that returned a 200
    pub fn success_rate(&self) -> f64 {
        if self.total_fetches == 0 {
            return 0.0;
        }
        let ok = self.status_counts.get(&200).copied().unwrap_or(0);
        (ok as f64 / self.total_fetches as f64) * 100.0
    }
}

/// Prints a summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &ReportSummary) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Fetches: {}", summary.total_fetches);
    println!("  Unique pages: {}", summary.unique_pages);
    println!("  Duration: {}s", summary.duration_seconds);
    println!(
        "  Success rate: {:.1}% ({} failed)",
        summary.success_rate(),
        summary.failed_fetches()
    );
    println!();

    match &summary.longest_page {
        Some(longest) => println!(
            "Longest page: {} ({} words)\n",
            longest.url, longest.word_count
        ),
        None => println!("Longest page: none\n"),
    }

    if !summary.status_counts.is_empty() {
        println!("Fetches by Status:");
        for (status, count) in &summary.status_counts {
            println!("  {}: {}", status, count);
        }
        println!();
    }

    if !summary.common_words.is_empty() {
        println!("Top {} Words:", summary.common_words.len());
        for (rank, (word, count)) in summary.common_words.iter().enumerate() {
            println!("  {:>2}. {} ({})", rank + 1, word, count);
        }
        println!();
    }

    println!("Subdomains ({}):", summary.subdomains.len());
    for (host, pages) in &summary.subdomains {
        println!("  {}, {}", host, pages);
    }
}
