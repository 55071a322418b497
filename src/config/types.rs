use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub cache: CacheConfig,
    pub worker: WorkerConfig,
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub policy: PolicyConfig,
}

/// Location of the caching proxy every fetch goes through
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
}

impl CacheConfig {
    /// Base URL of the cache service
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

/// Per-worker behaviour, shared read-only by every worker in the pool
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Identity sent to the cache service with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Number of concurrent workers
    #[serde(default = "default_threads")]
    pub threads: u32,

    /// Seconds each worker sleeps after completing a fetched URL
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: f64,

    /// Seconds before a cache request is abandoned
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: f64,

    /// A 200 response whose body is at most this many bytes is dead
    #[serde(
        rename = "dead-content-threshold",
        default = "default_dead_content_threshold"
    )]
    pub dead_content_threshold: usize,
}

impl WorkerConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_secs_f64(self.politeness_delay)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.fetch_timeout)
    }
}

/// Crawl seeds and frontier persistence
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    pub seeds: Vec<String>,

    /// SQLite file backing the frontier; in-memory when absent
    #[serde(rename = "frontier-path", default)]
    pub frontier_path: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the markdown report file
    #[serde(rename = "report-path", default = "default_report_path")]
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: default_report_path(),
        }
    }
}

/// URL policy tables
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Version of the trap tables, bumped whenever rules are added
    #[serde(default = "default_policy_version")]
    pub version: u32,

    /// Hosts (and optional path prefixes) the crawl may visit
    #[serde(default)]
    pub allow: Vec<AllowEntry>,

    /// Exact URLs never to crawl (compared case-insensitively)
    #[serde(rename = "deny-urls", default)]
    pub deny_urls: Vec<String>,

    /// Hosts containing any of these substrings are out of scope
    #[serde(rename = "deny-host-substrings", default)]
    pub deny_host_substrings: Vec<String>,

    /// Hosts of which only the root page may be crawled
    #[serde(rename = "root-only-hosts", default)]
    pub root_only_hosts: Vec<String>,

    /// Replaces the built-in extension blocklist when present
    #[serde(rename = "blocked-extensions", default)]
    pub blocked_extensions: Option<Vec<String>>,

    /// Added to the built-in ignorable query keys
    #[serde(rename = "ignored-query-keys", default)]
    pub ignored_query_keys: Vec<String>,

    /// Trap rules appended after the built-in path rules
    #[serde(default)]
    pub trap: Vec<TrapEntry>,
}

/// Allow-list entry
#[derive(Debug, Clone, Deserialize)]
pub struct AllowEntry {
    /// Domain pattern (e.g., "ics.uci.edu" or "*.ics.uci.edu")
    pub domain: String,

    /// Restricts this entry to paths starting with the prefix
    #[serde(rename = "path-prefix", default)]
    pub path_prefix: Option<String>,
}

/// Host-specific crawler trap observed in a live crawl
#[derive(Debug, Clone, Deserialize)]
pub struct TrapEntry {
    /// Host the rule applies to; every host when absent
    #[serde(default)]
    pub host: Option<String>,

    /// Regular expression matched against the URL path
    pub pattern: String,

    pub reason: String,
}

fn default_threads() -> u32 {
    1
}

fn default_politeness_delay() -> f64 {
    0.5
}

fn default_fetch_timeout() -> f64 {
    10.0
}

fn default_dead_content_threshold() -> usize {
    100
}

fn default_report_path() -> String {
    "./report.md".to_string()
}

fn default_policy_version() -> u32 {
    1
}
