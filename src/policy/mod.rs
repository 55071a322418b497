//! URL policy engine
//!
//! Decides whether a URL is worth crawling. The pre-fetch checks run in a fixed
//! order and the first failure decides the verdict:
//!
//! 1. scope (scheme, allow-list, denylists)
//! 2. extension blocklist
//! 3. low-value path / trap table
//! 4. low-value query
//!
//! Dead-content and restricted-page checks need a fetched page and apply to the
//! page being processed rather than to discovered links. Every check is pure:
//! the engine is built once from config and shared read-only by all workers.

mod extension;
mod path;
mod query;
mod restricted;
mod scope;

pub use extension::{ExtensionBlocklist, BLOCKED_EXTENSIONS};
pub use path::{PathRule, PathRules};
pub use query::check_query;
pub use restricted::is_restricted_page;
pub use scope::ScopeRules;

use crate::config::{Config, PolicyConfig};
use crate::crawler::{FetchResult, PageOutcome};
use crate::url::{extract_domain, Canonicalizer};
use crate::{ConfigError, UrlError};
use std::fmt;
use url::Url;

/// Why a URL was not admitted
///
/// Rejections are expected outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The URL could not be parsed or has no host
    Malformed,
    /// Scheme other than http/https
    Scheme(String),
    /// Host not covered by the allow-list
    OutOfScope(String),
    /// Explicitly denylisted URL or host
    Denied(String),
    /// Non-root path on a root-only host
    RootOnly(String),
    /// Blocked file extension
    Extension(String),
    /// Path matched a trap rule; carries the rule's reason
    LowValuePath(String),
    /// Query carries an ignorable key
    IgnorableQueryKey(String),
    /// Query value looks like an ISO date; carries the key
    DateQueryValue(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed URL"),
            Self::Scheme(scheme) => write!(f, "unsupported scheme '{}'", scheme),
            Self::OutOfScope(host) => write!(f, "host '{}' is out of scope", host),
            Self::Denied(what) => write!(f, "denylisted: {}", what),
            Self::RootOnly(host) => write!(f, "only the root of '{}' is crawled", host),
            Self::Extension(ext) => write!(f, "blocked extension '.{}'", ext),
            Self::LowValuePath(reason) => write!(f, "low-value path ({})", reason),
            Self::IgnorableQueryKey(key) => write!(f, "ignorable query key '{}'", key),
            Self::DateQueryValue(key) => write!(f, "date-valued query key '{}'", key),
        }
    }
}

/// Compiled policy tables plus the canonicalizer sharing the ignorable key set
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    version: u32,
    scope: ScopeRules,
    extensions: ExtensionBlocklist,
    paths: PathRules,
    canonicalizer: Canonicalizer,
    dead_content_threshold: usize,
}

impl PolicyEngine {
    /// Compiles the policy tables
    ///
    /// # Returns
    ///
    /// * `Ok(PolicyEngine)` - All tables compiled
    /// * `Err(ConfigError)` - A trap pattern failed to compile
    pub fn new(policy: &PolicyConfig, dead_content_threshold: usize) -> Result<Self, ConfigError> {
        let extensions = match &policy.blocked_extensions {
            Some(list) => ExtensionBlocklist::new(list),
            None => ExtensionBlocklist::default(),
        };

        Ok(Self {
            version: policy.version,
            scope: ScopeRules::from_config(policy),
            extensions,
            paths: PathRules::new(&policy.trap)?,
            canonicalizer: Canonicalizer::new(policy.ignored_query_keys.iter().cloned()),
            dead_content_threshold,
        })
    }

    /// Compiles the policy from a full crawler configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.policy, config.worker.dead_content_threshold)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn trap_rule_count(&self) -> usize {
        self.paths.len()
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Runs the full pre-fetch chain on a parsed link
    pub fn check_link(&self, url: &Url) -> Result<(), Rejection> {
        self.scope.check(url)?;

        if let Some(ext) = self.extensions.blocked_extension(url.path()) {
            return Err(Rejection::Extension(ext));
        }

        self.check_path(url)?;
        check_query(url, &self.canonicalizer)
    }

    /// Parses `url` and runs the full pre-fetch chain
    pub fn evaluate(&self, url: &str) -> Result<(), Rejection> {
        let parsed = Url::parse(url.trim()).map_err(|_| Rejection::Malformed)?;
        self.check_link(&parsed)
    }

    /// Check applied to a dequeued URL before spending a fetch on it
    pub fn precheck(&self, url: &str) -> Result<(), Rejection> {
        let parsed = Url::parse(url.trim()).map_err(|_| Rejection::Malformed)?;
        self.check_path(&parsed)
    }

    fn check_path(&self, url: &Url) -> Result<(), Rejection> {
        let host = extract_domain(url).unwrap_or_default();
        match self.paths.low_value_reason(&host, url.path()) {
            Some(reason) => Err(Rejection::LowValuePath(reason.to_string())),
            None => Ok(()),
        }
    }

    /// Scope check; malformed URLs are out of scope
    pub fn scope_ok(&self, url: &str) -> bool {
        Url::parse(url.trim())
            .map(|parsed| self.scope.check(&parsed).is_ok())
            .unwrap_or(false)
    }

    /// Extension check on a URL path
    pub fn extension_ok(&self, path: &str) -> bool {
        self.extensions.blocked_extension(path).is_none()
    }

    /// Low-value path check on a full URL
    pub fn path_ok(&self, url: &str) -> bool {
        self.precheck(url).is_ok()
    }

    /// Low-value query check on a full URL
    pub fn query_ok(&self, url: &str) -> bool {
        Url::parse(url.trim())
            .map(|parsed| check_query(&parsed, &self.canonicalizer).is_ok())
            .unwrap_or(false)
    }

    /// Classifies a fetch into delivered, dead or failed
    pub fn outcome<'a>(&self, result: &'a FetchResult) -> PageOutcome<'a> {
        result.outcome(self.dead_content_threshold)
    }

    /// A 200 response whose body is at most the threshold is dead
    pub fn is_dead(&self, result: &FetchResult) -> bool {
        self.outcome(result) == PageOutcome::Empty
    }

    pub fn dead_content_threshold(&self) -> usize {
        self.dead_content_threshold
    }

    /// Canonical identity of a URL
    pub fn canonicalize(&self, url: &str) -> Result<String, UrlError> {
        self.canonicalizer.canonicalize(url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{AllowEntry, TrapEntry};
    use std::collections::HashMap;

    pub(crate) fn uci_policy_config() -> PolicyConfig {
        PolicyConfig {
            version: 3,
            allow: ["*.ics.uci.edu", "*.cs.uci.edu", "*.informatics.uci.edu", "*.stat.uci.edu"]
                .iter()
                .map(|domain| AllowEntry {
                    domain: domain.to_string(),
                    path_prefix: None,
                })
                .collect(),
            deny_urls: vec!["https://ics.uci.edu/~babaks/site/codes.html".to_string()],
            deny_host_substrings: vec![],
            root_only_hosts: vec!["luci.ics.uci.edu".to_string()],
            blocked_extensions: None,
            ignored_query_keys: vec![],
            trap: vec![TrapEntry {
                host: Some("wiki.ics.uci.edu".to_string()),
                pattern: r"^/doku\.php".to_string(),
                reason: "wiki".to_string(),
            }],
        }
    }

    pub(crate) fn uci_policy() -> PolicyEngine {
        PolicyEngine::new(&uci_policy_config(), 100).unwrap()
    }

    fn fetched(status: u16, len: usize) -> FetchResult {
        FetchResult {
            status,
            url: "https://www.ics.uci.edu/".to_string(),
            error: None,
            body: Some(vec![b'a'; len]),
            headers: HashMap::new(),
        }
    }

    #[test]
    fn test_scope_ok() {
        let policy = uci_policy();
        assert!(!policy.scope_ok("https://evil.example.com/"));
        assert!(policy.scope_ok("https://x.ics.uci.edu/"));
        assert!(!policy.scope_ok("::::"));
    }

    #[test]
    fn test_extension_ok() {
        let policy = uci_policy();
        assert!(!policy.extension_ok("/file.PDF"));
        assert!(policy.extension_ok("/file.html"));
    }

    #[test]
    fn test_path_ok() {
        let policy = uci_policy();
        assert!(!policy.path_ok("https://www.ics.uci.edu/events/2024-01-05/"));
        assert!(!policy.path_ok("https://www.ics.uci.edu/day/2024-01-05"));
        assert!(policy.path_ok("https://www.ics.uci.edu/events/overview"));
        assert!(!policy.path_ok("https://wiki.ics.uci.edu/doku.php?id=start"));
    }

    #[test]
    fn test_query_ok() {
        let policy = uci_policy();
        assert!(!policy.query_ok("https://www.ics.uci.edu/events?when=2024-01-05"));
        assert!(!policy.query_ok("https://www.ics.uci.edu/events?sort=asc"));
        assert!(policy.query_ok("https://www.ics.uci.edu/events?page=2"));
    }

    #[test]
    fn test_chain_order() {
        let policy = uci_policy();
        // Out of scope wins over every later check
        assert_eq!(
            policy.evaluate("https://evil.example.com/2024-01-05/a.pdf?sort=1"),
            Err(Rejection::OutOfScope("evil.example.com".to_string()))
        );
        // Extension before path
        assert_eq!(
            policy.evaluate("https://www.ics.uci.edu/2024-01-05/a.pdf?sort=1"),
            Err(Rejection::Extension("pdf".to_string()))
        );
        // Path before query
        assert_eq!(
            policy.evaluate("https://www.ics.uci.edu/2024-01-05/?sort=1"),
            Err(Rejection::LowValuePath("calendar day".to_string()))
        );
        assert_eq!(
            policy.evaluate("https://www.ics.uci.edu/news?sort=1"),
            Err(Rejection::IgnorableQueryKey("sort".to_string()))
        );
        assert_eq!(policy.evaluate("https://www.ics.uci.edu/news?page=1"), Ok(()));
    }

    #[test]
    fn test_malformed_rejected() {
        let policy = uci_policy();
        assert_eq!(policy.evaluate("http://"), Err(Rejection::Malformed));
        assert_eq!(policy.precheck("not a url"), Err(Rejection::Malformed));
    }

    #[test]
    fn test_dead_content() {
        let policy = uci_policy();
        assert!(policy.is_dead(&fetched(200, 0)));
        assert!(policy.is_dead(&fetched(200, 100)));
        assert!(!policy.is_dead(&fetched(200, 101)));
        assert!(!policy.is_dead(&fetched(404, 0)));
    }

    #[test]
    fn test_canonicalize_shares_ignorable_keys() {
        let mut config = uci_policy_config();
        config.ignored_query_keys = vec!["C".to_string()];
        let policy = PolicyEngine::new(&config, 100).unwrap();

        assert_eq!(
            policy
                .canonicalize("https://www.ics.uci.edu/a?C=M&O=A&sort=x#top")
                .unwrap(),
            "https://www.ics.uci.edu/a?O=A"
        );
        assert!(!policy.query_ok("https://www.ics.uci.edu/a?C=M"));
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(
            Rejection::Extension("pdf".to_string()).to_string(),
            "blocked extension '.pdf'"
        );
        assert_eq!(
            Rejection::LowValuePath("calendar day".to_string()).to_string(),
            "low-value path (calendar day)"
        );
    }
}
