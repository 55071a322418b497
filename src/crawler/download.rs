//! Download client for the caching proxy
//!
//! Every page is fetched through the cache service:
//! - A GET to the cache endpoint carries the target URL (`q`) and the crawler
//!   identity (`u`)
//! - The cache answers with a CBOR envelope describing the upstream response
//! - Transport and protocol failures are folded into a non-200 `FetchResult`
//!
//! The client never retries and never returns an error to its caller.

use crate::config::{CacheConfig, WorkerConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use std::collections::HashMap;
use std::time::Duration;

/// Status the cache uses when the upstream rate-limited or timed out
pub const CACHE_UPSTREAM_FAILURE: u16 = 602;

/// Status reported when the cache request itself timed out
pub const GATEWAY_TIMEOUT: u16 = 504;

/// Status reported when the cache could not be reached
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Bytes of an undecodable envelope included in the warning log
const PREVIEW_BYTES: usize = 200;

/// Result of one fetch attempt
///
/// Only a 200 status makes `body` authoritative page content; every other
/// status is terminal for the fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Status reported by the cache (upstream HTTP status or a cache-level code)
    pub status: u16,

    /// Final URL of the page, after any redirects the cache followed
    pub url: String,

    /// Description of the failure for non-200 results
    pub error: Option<String>,

    /// Raw page bytes
    pub body: Option<Vec<u8>>,

    /// Upstream response headers
    pub headers: HashMap<String, String>,
}

/// How a fetch ends up being consumed by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome<'a> {
    /// A 200 with enough content to be worth extracting
    Delivered(&'a [u8]),
    /// A 200 whose body is empty or too small to carry content
    Empty,
    /// Any non-200 result
    Failed(String),
}

impl FetchResult {
    /// Builds a body-less failure result
    pub fn failed(url: &str, status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            url: url.to_string(),
            error: Some(error.into()),
            body: None,
            headers: HashMap::new(),
        }
    }

    /// True when the cache delivered a 200 envelope without error
    ///
    /// A 200 built from an undecodable cache reply carries an error and no
    /// body, and is not a page.
    pub fn is_delivery(&self) -> bool {
        self.status == 200 && self.error.is_none() && self.body.is_some()
    }

    /// Classifies the result against the dead-content threshold
    pub fn outcome(&self, dead_content_threshold: usize) -> PageOutcome<'_> {
        if self.status != 200 || self.error.is_some() {
            let reason = self
                .error
                .clone()
                .unwrap_or_else(|| format!("HTTP {}", self.status));
            return PageOutcome::Failed(reason);
        }

        match self.body.as_deref() {
            Some(body) if body.len() > dead_content_threshold => PageOutcome::Delivered(body),
            _ => PageOutcome::Empty,
        }
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// True when the content type is HTML or was not reported
    pub fn is_html(&self) -> bool {
        self.header("content-type")
            .map_or(true, |ct| ct.to_lowercase().contains("text/html"))
    }

    /// True when the response asks to be saved rather than displayed
    pub fn is_attachment(&self) -> bool {
        self.header("content-disposition")
            .is_some_and(|cd| cd.trim_start().to_lowercase().starts_with("attachment"))
    }
}

/// Envelope the cache service encodes as CBOR
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheEnvelope {
    pub status: u16,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(default)]
    pub body: Option<ByteBuf>,
}

impl CacheEnvelope {
    /// A 200 envelope carrying an HTML page
    pub fn html(url: &str, body: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/html; charset=utf-8".to_string());

        Self {
            status: 200,
            url: Some(url.to_string()),
            error: None,
            headers,
            body: Some(ByteBuf::from(body.as_bytes().to_vec())),
        }
    }

    /// Encodes the envelope the way the cache service sends it
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = ciborium::into_writer(self, &mut buf);
        buf
    }

    fn into_fetch_result(self, requested_url: &str) -> FetchResult {
        FetchResult {
            status: self.status,
            url: self.url.unwrap_or_else(|| requested_url.to_string()),
            error: self.error,
            body: self.body.map(ByteBuf::into_vec),
            headers: self.headers,
        }
    }
}

/// Client for the caching proxy
#[derive(Debug, Clone)]
pub struct CacheClient {
    http: Client,
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl CacheClient {
    /// Builds a client from the cache and worker configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use scope_crawler::config::load_config;
    /// use scope_crawler::crawler::CacheClient;
    /// use std::path::Path;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = load_config(Path::new("crawler.toml"))?;
    /// let client = CacheClient::new(&config.cache, &config.worker)?;
    /// let result = client.fetch("https://www.ics.uci.edu/").await;
    /// println!("status {}", result.status);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(cache: &CacheConfig, worker: &WorkerConfig) -> Result<Self, reqwest::Error> {
        Self::with_endpoint(cache.endpoint(), &worker.user_agent, worker.fetch_timeout())
    }

    /// Builds a client for an explicit cache endpoint
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            user_agent: user_agent.to_string(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches `url` through the cache
    ///
    /// # Failure Mapping
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Cache request timed out | 504 with the configured timeout in `error` |
    /// | Connection refused, DNS, reset | 503 with the cause in `error` |
    /// | Envelope present but undecodable | logged, then treated as below |
    /// | Cache status 602 | 602, upstream rate-limited or timed out |
    /// | Anything else | cache status, "unexpected cache response" |
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let request = self
            .http
            .get(&self.endpoint)
            .query(&[("q", url), ("u", self.user_agent.as_str())])
            .timeout(self.timeout);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return self.transport_failure(url, e),
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => interpret_cache_response(url, status, &body),
            Err(e) => self.transport_failure(url, e),
        }
    }

    fn transport_failure(&self, url: &str, error: reqwest::Error) -> FetchResult {
        if error.is_timeout() {
            let secs = self.timeout.as_secs_f64();
            tracing::warn!("Cache request timed out after {}s for {}", secs, url);
            FetchResult::failed(
                url,
                GATEWAY_TIMEOUT,
                format!("cache request timed out after {}s", secs),
            )
        } else {
            tracing::error!("Cache request failed for {}: {}", url, error);
            FetchResult::failed(
                url,
                SERVICE_UNAVAILABLE,
                format!("cache request failed: {}", error),
            )
        }
    }
}

/// Turns a raw cache reply into a `FetchResult`
///
/// A decodable envelope always wins; the cache's own HTTP status is only
/// consulted when there is nothing to decode.
pub fn interpret_cache_response(url: &str, status: u16, body: &[u8]) -> FetchResult {
    if !body.is_empty() {
        match ciborium::from_reader::<CacheEnvelope, _>(body) {
            Ok(envelope) => return envelope.into_fetch_result(url),
            Err(e) => {
                let preview = String::from_utf8_lossy(&body[..body.len().min(PREVIEW_BYTES)]);
                tracing::warn!(
                    "Cache decode error for {}: status={}, error={}, body_preview={:?}",
                    url,
                    status,
                    e,
                    preview
                );
            }
        }
    }

    if status == CACHE_UPSTREAM_FAILURE {
        tracing::warn!(
            "Cache returned {} for {} - possible rate limit or timeout",
            CACHE_UPSTREAM_FAILURE,
            url
        );
        return FetchResult::failed(
            url,
            CACHE_UPSTREAM_FAILURE,
            format!("cache returned {} status", CACHE_UPSTREAM_FAILURE),
        );
    }

    tracing::error!("Unexpected cache response for {}: {}", url, status);
    FetchResult::failed(url, status, format!("unexpected cache response: {}", status))
}
