//! Scope check: scheme, allow-list, and denylists

use crate::config::PolicyConfig;
use crate::policy::Rejection;
use crate::url::{extract_domain, matches_domain};
use std::collections::HashSet;
use url::Url;

/// An allow-list entry with its optional path restriction lowercased up front
#[derive(Debug, Clone)]
struct AllowRule {
    domain: String,
    path_prefix: Option<String>,
}

impl AllowRule {
    fn admits(&self, host: &str, path: &str) -> bool {
        if !matches_domain(&self.domain, host) {
            return false;
        }

        match &self.path_prefix {
            Some(prefix) => path.to_lowercase().starts_with(prefix),
            None => true,
        }
    }
}

/// Compiled scope tables
#[derive(Debug, Clone)]
pub struct ScopeRules {
    allow: Vec<AllowRule>,
    deny_urls: HashSet<String>,
    deny_host_substrings: Vec<String>,
    root_only_hosts: HashSet<String>,
}

impl ScopeRules {
    pub fn from_config(config: &PolicyConfig) -> Self {
        let allow = config
            .allow
            .iter()
            .map(|entry| AllowRule {
                domain: entry.domain.to_lowercase(),
                path_prefix: entry.path_prefix.as_ref().map(|p| p.to_lowercase()),
            })
            .collect();

        // Deny entries go through the same parser as candidates so both serialize alike
        let deny_urls = config
            .deny_urls
            .iter()
            .map(|raw| match Url::parse(raw) {
                Ok(url) => url.as_str().to_lowercase(),
                Err(_) => raw.to_lowercase(),
            })
            .collect();

        Self {
            allow,
            deny_urls,
            deny_host_substrings: config
                .deny_host_substrings
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_lowercase())
                .collect(),
            root_only_hosts: config
                .root_only_hosts
                .iter()
                .map(|h| h.to_lowercase())
                .collect(),
        }
    }

    /// Runs the scope check, denylists before the allow-list
    pub fn check(&self, url: &Url) -> Result<(), Rejection> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Rejection::Scheme(url.scheme().to_string()));
        }

        let host = extract_domain(url).ok_or(Rejection::Malformed)?;

        if self.deny_urls.contains(&url.as_str().to_lowercase()) {
            return Err(Rejection::Denied(url.to_string()));
        }

        if let Some(hit) = self
            .deny_host_substrings
            .iter()
            .find(|needle| host.contains(needle.as_str()))
        {
            return Err(Rejection::Denied(format!("{} (matches '{}')", host, hit)));
        }

        if self.root_only_hosts.contains(&host) && !matches!(url.path(), "" | "/") {
            return Err(Rejection::RootOnly(host));
        }

        if self.allow.iter().any(|rule| rule.admits(&host, url.path())) {
            Ok(())
        } else {
            Err(Rejection::OutOfScope(host))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllowEntry;

    fn rules() -> ScopeRules {
        let config = PolicyConfig {
            version: 1,
            allow: vec![
                AllowEntry {
                    domain: "*.ics.uci.edu".to_string(),
                    path_prefix: None,
                },
                AllowEntry {
                    domain: "today.uci.edu".to_string(),
                    path_prefix: Some("/department/information_computer_sciences".to_string()),
                },
            ],
            deny_urls: vec!["http://luci.ics.uci.edu/luciinterace.html".to_string()],
            deny_host_substrings: vec!["wics".to_string()],
            root_only_hosts: vec!["luci.ics.uci.edu".to_string()],
            blocked_extensions: None,
            ignored_query_keys: vec![],
            trap: vec![],
        };
        ScopeRules::from_config(&config)
    }

    fn check(url: &str) -> Result<(), Rejection> {
        rules().check(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_allowed_suffix() {
        assert!(check("https://x.ics.uci.edu/").is_ok());
        assert!(check("http://www.ics.uci.edu/about").is_ok());
    }

    #[test]
    fn test_out_of_scope() {
        assert_eq!(
            check("https://evil.example.com/"),
            Err(Rejection::OutOfScope("evil.example.com".to_string()))
        );
        assert!(check("https://www.uci.edu/").is_err());
    }

    #[test]
    fn test_scheme() {
        assert_eq!(
            check("ftp://x.ics.uci.edu/file"),
            Err(Rejection::Scheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_path_prefix_entry() {
        assert!(check("https://today.uci.edu/department/information_computer_sciences/news").is_ok());
        assert!(check("https://today.uci.edu/Department/Information_Computer_Sciences").is_ok());
        assert!(check("https://today.uci.edu/department/engineering").is_err());
    }

    #[test]
    fn test_denylisted_url_case_insensitive() {
        assert!(matches!(
            check("HTTP://LUCI.ICS.UCI.EDU/luciinterace.html"),
            Err(Rejection::Denied(_))
        ));
    }

    #[test]
    fn test_denylisted_host_substring() {
        assert!(matches!(
            check("https://wics.ics.uci.edu/events"),
            Err(Rejection::Denied(_))
        ));
    }

    #[test]
    fn test_root_only_host() {
        assert!(check("https://luci.ics.uci.edu/").is_ok());
        assert!(check("https://luci.ics.uci.edu").is_ok());
        assert_eq!(
            check("https://luci.ics.uci.edu/projects"),
            Err(Rejection::RootOnly("luci.ics.uci.edu".to_string()))
        );
    }
}
