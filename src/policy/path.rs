//! Low-value path check
//!
//! Paths are tested against an ordered table of trap rules. The built-in rules
//! cover version-control browsers, calendar permutations and user home
//! directories; rules observed in a live crawl are appended from config, so
//! the table grows without touching the checking code.

use crate::config::TrapEntry;
use crate::ConfigError;
use regex::Regex;

/// Built-in `(pattern, reason)` rules, checked in order for every host
const BUILTIN_PATH_RULES: &[(&str, &str)] = &[
    (
        r"/-/(?:issues|merge_requests|forks|starrers|branches|tags|commit|tree)",
        "version-control browser",
    ),
    (r"/\d{4}-\d{2}-\d{2}(?:/|$)", "calendar day"),
    (r"/\d{4}/\d{2}/\d{2}(?:/|$)", "calendar day"),
    (r"/events/(?:day|week|month)/\d{4}-\d{2}", "event calendar view"),
    (r"^/~[^/]+/.+", "user home directory"),
];

/// One trap rule: an optional host restriction plus a path regex
#[derive(Debug, Clone)]
pub struct PathRule {
    host: Option<String>,
    pattern: Regex,
    reason: String,
}

impl PathRule {
    pub fn new(host: Option<&str>, pattern: &str, reason: &str) -> Result<Self, ConfigError> {
        let compiled = Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            host: host.map(str::to_lowercase),
            pattern: compiled,
            reason: reason.to_string(),
        })
    }

    fn matches(&self, host: &str, path: &str) -> bool {
        if let Some(rule_host) = &self.host {
            if !rule_host.eq_ignore_ascii_case(host) {
                return false;
            }
        }
        self.pattern.is_match(path)
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Ordered trap table
#[derive(Debug, Clone)]
pub struct PathRules {
    rules: Vec<PathRule>,
}

impl PathRules {
    /// Compiles the built-in rules followed by the configured traps
    pub fn new(traps: &[TrapEntry]) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(BUILTIN_PATH_RULES.len() + traps.len());

        for (pattern, reason) in BUILTIN_PATH_RULES {
            rules.push(PathRule::new(None, pattern, reason)?);
        }

        for trap in traps {
            rules.push(PathRule::new(
                trap.host.as_deref(),
                &trap.pattern,
                &trap.reason,
            )?);
        }

        Ok(Self { rules })
    }

    /// Returns the reason of the first rule matching `path` on `host`
    pub fn low_value_reason(&self, host: &str, path: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(host, path))
            .map(PathRule::reason)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
