//! Crawl worker
//!
//! One worker per crawl slot. Each loops until the frontier is exhausted:
//!
//! 1. Take the next URL from the frontier
//! 2. Skip known low-value paths without fetching
//! 3. Fetch through the cache and record the result in the report
//! 4. Harvest links from delivered, non-restricted HTML pages
//! 5. Enqueue surviving links, then mark the URL complete
//! 6. Sleep the politeness delay
//!
//! A URL is completed only after its links were added, so the frontier never
//! reports exhaustion while links are still on their way.

use crate::crawler::parser::{harvest, Harvest};
use crate::crawler::{CacheClient, PageOutcome};
use crate::frontier::Frontier;
use crate::policy::PolicyEngine;
use crate::report::{extract_words, Report};
use std::sync::Arc;
use std::time::Duration;

/// What happened to one dequeued URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    /// Rejected before fetching; no request was made
    Skipped,
    /// Fetched; carries the status and the number of new frontier entries
    Fetched { status: u16, enqueued: usize },
}

/// A single crawl slot
pub struct Worker {
    id: usize,
    frontier: Arc<Frontier>,
    report: Arc<dyn Report>,
    policy: Arc<PolicyEngine>,
    client: CacheClient,
    delay: Duration,
}

impl Worker {
    pub fn new(
        id: usize,
        frontier: Arc<Frontier>,
        report: Arc<dyn Report>,
        policy: Arc<PolicyEngine>,
        client: CacheClient,
        delay: Duration,
    ) -> Self {
        Self {
            id,
            frontier,
            report,
            policy,
            client,
            delay,
        }
    }

    /// Runs until the frontier is exhausted
    ///
    /// # Returns
    ///
    /// The number of URLs this worker processed
    pub async fn run(self) -> usize {
        tracing::info!("Worker-{} started", self.id);
        let mut processed = 0;

        while let Some(url) = self.frontier.get_next().await {
            let step = self.process(&url).await;
            processed += 1;

            // Only requests that reached the cache count against politeness
            if matches!(step, Processed::Fetched { .. }) && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        tracing::info!(
            "Worker-{}: frontier is empty, stopping after {} URLs",
            self.id,
            processed
        );
        processed
    }

    /// Processes one dequeued URL and marks it complete
    pub async fn process(&self, url: &str) -> Processed {
        if let Err(rejection) = self.policy.precheck(url) {
            tracing::info!(
                "Worker-{}: skipping {} without download: {}",
                self.id,
                url,
                rejection
            );
            self.frontier.mark_complete(url);
            return Processed::Skipped;
        }

        let result = self.client.fetch(url).await;
        tracing::info!(
            "Worker-{}: downloaded {}, status <{}>, using cache {}",
            self.id,
            url,
            result.status,
            self.client.endpoint()
        );

        let words = extract_words(&result);
        self.report.record(&result, &words);

        let links = match self.policy.outcome(&result) {
            PageOutcome::Delivered(body) if result.is_html() => {
                match harvest(&self.policy, &result, url, body) {
                    Harvest::Links(links) => links,
                    Harvest::Restricted => {
                        tracing::info!(
                            "Worker-{}: restricted page, not harvesting links: {}",
                            self.id,
                            url
                        );
                        Vec::new()
                    }
                }
            }
            PageOutcome::Delivered(_) => {
                tracing::debug!("Worker-{}: not HTML, no links: {}", self.id, url);
                Vec::new()
            }
            PageOutcome::Empty => {
                tracing::debug!(
                    "Worker-{}: dead page ({} bytes): {}",
                    self.id,
                    result.body_len(),
                    url
                );
                Vec::new()
            }
            PageOutcome::Failed(reason) => {
                tracing::debug!("Worker-{}: fetch failed for {}: {}", self.id, url, reason);
                Vec::new()
            }
        };

        let enqueued = links.iter().filter(|link| self.frontier.add(link)).count();
        if enqueued > 0 {
            tracing::debug!(
                "Worker-{}: {} new links from {} ({} harvested)",
                self.id,
                enqueued,
                url,
                links.len()
            );
        }

        self.frontier.mark_complete(url);

        Processed::Fetched {
            status: result.status,
            enqueued,
        }
    }
}
