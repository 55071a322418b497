use crate::config::types::{AllowEntry, CacheConfig, Config, CrawlConfig, PolicyConfig, WorkerConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_cache_config(&config.cache)?;
    validate_worker_config(&config.worker)?;
    validate_crawl_config(&config.crawl)?;
    validate_policy_config(&config.policy)?;
    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cache host cannot be empty".to_string(),
        ));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation(
            "cache port must be non-zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.threads < 1 || config.threads > 100 {
        return Err(ConfigError::Validation(format!(
            "threads must be between 1 and 100, got {}",
            config.threads
        )));
    }

    if !config.politeness_delay.is_finite() || config.politeness_delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "politeness_delay must be a non-negative number of seconds, got {}",
            config.politeness_delay
        )));
    }

    if !config.fetch_timeout.is_finite() || config.fetch_timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout must be a positive number of seconds, got {}",
            config.fetch_timeout
        )));
    }

    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }
    }

    if let Some(path) = &config.frontier_path {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "frontier_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_policy_config(config: &PolicyConfig) -> Result<(), ConfigError> {
    if config.allow.is_empty() {
        return Err(ConfigError::Validation(
            "policy must allow at least one domain".to_string(),
        ));
    }

    for entry in &config.allow {
        validate_allow_entry(entry)?;
    }

    for host in &config.root_only_hosts {
        validate_domain_string(host)?;
    }

    for trap in &config.trap {
        Regex::new(&trap.pattern).map_err(|source| ConfigError::InvalidRegex {
            pattern: trap.pattern.clone(),
            source,
        })?;

        if let Some(host) = &trap.host {
            validate_domain_string(host)?;
        }
    }

    if let Some(extensions) = &config.blocked_extensions {
        if let Some(bad) = extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains('.') || ext.contains('/'))
        {
            return Err(ConfigError::Validation(format!(
                "blocked extension '{}' must be a bare suffix like \"pdf\"",
                bad
            )));
        }
    }

    Ok(())
}

fn validate_allow_entry(entry: &AllowEntry) -> Result<(), ConfigError> {
    validate_domain_pattern(&entry.domain)?;

    if let Some(prefix) = &entry.path_prefix {
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "path-prefix '{}' for '{}' must start with '/'",
                prefix, entry.domain
            )));
        }
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)
    } else {
        validate_domain_string(pattern)
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'uci.edu')",
            domain
        )));
    }

    Ok(())
}
