//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Fetching through the caching proxy
//! - HTML parsing and link harvesting
//! - The per-slot worker loop
//! - Overall crawl coordination

mod download;
mod parser;
mod pool;
mod worker;

pub use download::{
    interpret_cache_response, CacheClient, CacheEnvelope, FetchResult, PageOutcome,
    CACHE_UPSTREAM_FAILURE, GATEWAY_TIMEOUT, SERVICE_UNAVAILABLE,
};
pub use parser::{extract_links, harvest, Harvest};
pub use pool::{prepare_frontier, run_crawl, run_workers};
pub use worker::{Processed, Worker};

use crate::config::Config;
use crate::report::ReportSummary;
use crate::CrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Compile the policy and open the frontier
/// 2. Build the cache client
/// 3. Run the workers until the frontier is exhausted
/// 4. Return the report summary
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `restart` - Discard any saved frontier progress
///
/// # Returns
///
/// * `Ok(ReportSummary)` - Crawl completed successfully
/// * `Err(CrawlError)` - Crawl failed
pub async fn crawl(config: Config, restart: bool) -> Result<ReportSummary, CrawlError> {
    run_crawl(config, restart).await
}
