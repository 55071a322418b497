//! Scope Crawler main entry point
//!
//! This is the command-line interface for the domain-restricted crawler.

use clap::Parser;
use scope_crawler::config::{load_config_with_hash, Config};
use scope_crawler::crawler::crawl;
use scope_crawler::policy::PolicyEngine;
use scope_crawler::report::{print_summary, write_markdown};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Scope Crawler: a polite, domain-restricted web crawler
///
/// Workers fetch pages through a caching proxy, follow only links that pass
/// the configured URL policy, and report corpus statistics when the frontier
/// runs dry.
#[derive(Parser, Debug)]
#[command(name = "scope-crawler")]
#[command(version)]
#[command(about = "A polite, domain-restricted web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard saved frontier progress and start from the seeds
    #[arg(long)]
    restart: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Print the policy verdict for each URL and exit
    #[arg(long, value_name = "URL", num_args = 1..)]
    check: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if !cli.check.is_empty() {
        handle_check(&config, &cli.check)?;
    } else {
        handle_crawl(config, cli.restart).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scope_crawler=info,warn"),
            1 => EnvFilter::new("scope_crawler=debug,info"),
            2 => EnvFilter::new("scope_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let policy = PolicyEngine::from_config(config)?;

    println!("=== Scope Crawler Dry Run ===\n");

    println!("Cache:");
    println!("  Endpoint: {}", config.cache.endpoint());

    println!("\nWorkers:");
    println!("  Threads: {}", config.worker.threads);
    println!("  User agent: {}", config.worker.user_agent);
    println!("  Politeness delay: {}s", config.worker.politeness_delay);
    println!("  Fetch timeout: {}s", config.worker.fetch_timeout);
    println!(
        "  Dead content threshold: {} bytes",
        config.worker.dead_content_threshold
    );

    println!("\nOutput:");
    match &config.crawl.frontier_path {
        Some(path) => println!("  Frontier ledger: {}", path),
        None => println!("  Frontier ledger: in memory"),
    }
    println!("  Report: {}", config.output.report_path);

    println!("\nPolicy v{}:", policy.version());
    println!("  Allowed domains ({}):", config.policy.allow.len());
    for entry in &config.policy.allow {
        match &entry.path_prefix {
            Some(prefix) => println!("    - {} (under {})", entry.domain, prefix),
            None => println!("    - {}", entry.domain),
        }
    }
    println!("  Denied URLs: {}", config.policy.deny_urls.len());
    println!(
        "  Denied host substrings: {}",
        config.policy.deny_host_substrings.len()
    );
    println!("  Root-only hosts: {}", config.policy.root_only_hosts.len());
    println!("  Trap rules: {}", policy.trap_rule_count());

    println!("\nSeeds ({}):", config.crawl.seeds.len());
    for seed in &config.crawl.seeds {
        match policy.evaluate(seed) {
            Ok(()) => println!("  * {}", seed),
            Err(rejection) => println!("  * {} (rejected as a link: {})", seed, rejection),
        }
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --check mode: prints the policy verdict for each URL
fn handle_check(config: &Config, urls: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let policy = PolicyEngine::from_config(config)?;

    for url in urls {
        match policy.evaluate(url) {
            Ok(()) => match policy.canonicalize(url) {
                Ok(canonical) => println!("ADMIT   {} -> {}", url, canonical),
                Err(e) => println!("REJECT  {} ({})", url, e),
            },
            Err(rejection) => println!("REJECT  {} ({})", url, rejection),
        }
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, restart: bool) -> Result<(), Box<dyn std::error::Error>> {
    if restart {
        tracing::info!("Starting crawl from the seeds (discarding saved progress)");
    } else {
        tracing::info!("Starting crawl (will resume saved progress if any)");
    }

    tracing::info!(
        "Seeds: {}, allowed domains: {}, workers: {}",
        config.crawl.seeds.len(),
        config.policy.allow.len(),
        config.worker.threads
    );

    let report_path = config.output.report_path.clone();

    let summary = match crawl(config, restart).await {
        Ok(summary) => {
            tracing::info!("Crawl completed successfully");
            summary
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_summary(&summary);

    write_markdown(&summary, Path::new(&report_path))?;
    println!("\n✓ Report written to: {}", report_path);

    Ok(())
}
