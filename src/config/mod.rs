//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Everything here is loaded once at startup and stays immutable for the crawl.
//!
//! # Example
//!
//! ```no_run
//! use scope_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawling with {} workers", config.worker.threads);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AllowEntry, CacheConfig, Config, CrawlConfig, OutputConfig, PolicyConfig, TrapEntry,
    WorkerConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
