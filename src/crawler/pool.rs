//! Worker pool - crawl orchestration
//!
//! Builds the shared collaborators from config, seeds or resumes the
//! frontier, runs one worker task per configured thread, and summarizes the
//! report once every worker has stopped.

use crate::config::Config;
use crate::crawler::{CacheClient, Worker};
use crate::frontier::Frontier;
use crate::policy::PolicyEngine;
use crate::report::{CorpusReport, Report, ReportSummary};
use crate::CrawlError;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Opens the frontier described by the config and makes sure it has work
///
/// A resumed frontier keeps only pending URLs that still pass the current
/// policy. Seeds are added only when the frontier has never seen a URL.
pub fn prepare_frontier(
    config: &Config,
    policy: &PolicyEngine,
    restart: bool,
) -> Result<Frontier, CrawlError> {
    let canonicalizer = policy.canonicalizer().clone();

    let frontier = match &config.crawl.frontier_path {
        Some(path) => {
            let frontier = Frontier::open(Path::new(path), canonicalizer, restart)?;
            let dropped = frontier.retain_pending(|url| policy.evaluate(url).is_ok());
            if dropped > 0 {
                tracing::info!("Dropped {} saved URLs rejected by the current policy", dropped);
            }
            frontier
        }
        None => Frontier::new(canonicalizer),
    };

    if frontier.is_empty() {
        for seed in &config.crawl.seeds {
            if !frontier.add(seed) {
                tracing::warn!("Seed {} was not added to the frontier", seed);
            }
        }
        tracing::info!("Seeded frontier with {} URLs", frontier.pending_count());
    }

    Ok(frontier)
}

/// Runs `threads` workers against shared collaborators until exhaustion
///
/// Workers are joined in completion order. A panicking worker leaves its URL
/// in flight, so the others would park forever; the first failed task aborts
/// the rest.
///
/// # Returns
///
/// * `Ok(usize)` - Total number of URLs processed
/// * `Err(CrawlError)` - A worker task panicked
pub async fn run_workers(
    frontier: Arc<Frontier>,
    report: Arc<dyn Report>,
    policy: Arc<PolicyEngine>,
    client: CacheClient,
    threads: usize,
    delay: Duration,
) -> Result<usize, CrawlError> {
    let mut workers = JoinSet::new();
    for id in 0..threads {
        let worker = Worker::new(
            id,
            Arc::clone(&frontier),
            Arc::clone(&report),
            Arc::clone(&policy),
            client.clone(),
            delay,
        );
        workers.spawn(worker.run());
    }

    let mut processed = 0;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(count) => processed += count,
            Err(e) => {
                tracing::error!("Worker task failed, stopping the crawl: {}", e);
                workers.abort_all();
                return Err(e.into());
            }
        }
    }

    Ok(processed)
}

/// Runs a complete crawl
///
/// This function orchestrates the entire crawl process:
///
/// 1. Compile the policy engine
/// 2. Open or create the frontier and seed it
/// 3. Build the cache client
/// 4. Spawn the workers and wait for frontier exhaustion
/// 5. Summarize the report
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `restart` - Discard any saved frontier progress
///
/// # Returns
///
/// * `Ok(ReportSummary)` - Crawl completed successfully
/// * `Err(CrawlError)` - Startup failed or a worker task panicked
///
/// # Example
///
/// ```no_run
/// use scope_crawler::config::load_config;
/// use scope_crawler::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let summary = run_crawl(config, false).await?;
/// println!("{} unique pages", summary.unique_pages);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, restart: bool) -> Result<ReportSummary, CrawlError> {
    let policy = Arc::new(PolicyEngine::from_config(&config)?);
    tracing::info!(
        "Policy v{} loaded with {} trap rules",
        policy.version(),
        policy.trap_rule_count()
    );

    let frontier = Arc::new(prepare_frontier(&config, &policy, restart)?);
    let client = CacheClient::new(&config.cache, &config.worker)?;
    let report = Arc::new(CorpusReport::new());

    tracing::info!(
        "Starting {} workers against cache {}",
        config.worker.threads,
        client.endpoint()
    );
    let start_time = Instant::now();

    let processed = run_workers(
        Arc::clone(&frontier),
        report.clone(),
        policy,
        client,
        config.worker.threads as usize,
        config.worker.politeness_delay(),
    )
    .await?;

    tracing::info!(
        "Crawl completed: {} URLs processed ({} complete in frontier) in {:?}",
        processed,
        frontier.completed_count(),
        start_time.elapsed()
    );

    Ok(report.finalize())
}
