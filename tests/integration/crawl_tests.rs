//! End-to-end crawl tests against a mock cache service

use crate::common::{
    create_test_config, create_test_config_with_ledger, page, serve_envelope, serve_page,
};
use scope_crawler::crawler::{prepare_frontier, run_crawl, run_workers, CacheClient, FetchResult};
use scope_crawler::frontier::UrlState;
use scope_crawler::policy::PolicyEngine;
use scope_crawler::report::{CorpusReport, Report};
use scope_crawler::CrawlError;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME: &str = "https://www.ics.uci.edu/";
const PEOPLE: &str = "https://www.ics.uci.edu/people";

struct Harness {
    frontier: Arc<scope_crawler::Frontier>,
    report: Arc<CorpusReport>,
    processed: usize,
}

/// Runs the worker pool directly so the frontier can be inspected afterwards
async fn run_pool(server: &MockServer, seeds: &[&str]) -> Harness {
    let config = create_test_config(server, seeds);
    let policy = Arc::new(PolicyEngine::from_config(&config).unwrap());
    let frontier = Arc::new(prepare_frontier(&config, &policy, false).unwrap());
    let client = CacheClient::new(&config.cache, &config.worker).unwrap();
    let report = Arc::new(CorpusReport::new());

    let processed = run_workers(
        Arc::clone(&frontier),
        report.clone() as Arc<dyn Report>,
        policy,
        client,
        config.worker.threads as usize,
        config.worker.politeness_delay(),
    )
    .await
    .unwrap();

    Harness {
        frontier,
        report,
        processed,
    }
}

#[tokio::test]
async fn test_fragment_and_ignorable_query_variants_fetched_once() {
    let server = MockServer::start().await;
    let a = "https://www.ics.uci.edu/about";
    serve_page(&server, a, &page(r#"<a href="/about#team">Team</a>"#), 1).await;

    let harness = run_pool(
        &server,
        &[a, "https://www.ics.uci.edu/about#frag", "https://www.ics.uci.edu/about?sort=x"],
    )
    .await;

    assert_eq!(harness.processed, 1);
    assert_eq!(harness.frontier.completed_count(), 1);
    assert_eq!(harness.frontier.state_of(a), Some(UrlState::Complete));
    assert_eq!(harness.report.fetch_count(), 1);
}

#[tokio::test]
async fn test_fetch_timeout_completes_without_links() {
    let server = MockServer::start().await;
    let b = "https://www.cs.uci.edu/slow";
    let html = page(r#"<a href="/never-followed">Next</a>"#);

    Mock::given(method("GET"))
        .and(query_param("q", b))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(scope_crawler::crawler::CacheEnvelope::html(b, &html).to_cbor())
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let harness = run_pool(&server, &[b]).await;

    let summary = harness.report.finalize();
    assert_eq!(summary.status_counts.get(&504), Some(&1));
    assert_eq!(summary.unique_pages, 0);
    assert_eq!(harness.frontier.state_of(b), Some(UrlState::Complete));
    assert_eq!(
        harness.frontier.state_of("https://www.cs.uci.edu/never-followed"),
        None
    );
    assert!(harness.frontier.is_exhausted());
}

#[tokio::test]
async fn test_crawl_follows_only_admissible_links() {
    let server = MockServer::start().await;

    let home = page(
        r#"
        <a href="/people">People</a>
        <a href="/people?sort=name">People sorted</a>
        <a href="/slides.PDF">Slides</a>
        <a href="/events/2024-01-05/">Calendar day</a>
        <a href="https://evil.example.com/">Elsewhere</a>
        <a href="mailto:office@ics.uci.edu">Mail</a>
        <a href="https://www.cs.uci.edu/">CS</a>
        "#,
    );
    serve_page(&server, HOME, &home, 1).await;
    serve_page(&server, PEOPLE, &page(r#"<a href="/">Home</a>"#), 1).await;
    serve_page(&server, "https://www.cs.uci.edu/", &page("Computer Science"), 1).await;
    serve_page(&server, "https://www.ics.uci.edu/slides.PDF", &page(""), 0).await;
    serve_page(&server, "https://evil.example.com/", &page(""), 0).await;

    let config = create_test_config(&server, &[HOME]);
    let summary = run_crawl(config, false).await.unwrap();

    assert_eq!(summary.total_fetches, 3);
    assert_eq!(summary.unique_pages, 3);
    assert_eq!(summary.subdomains.get("www.ics.uci.edu"), Some(&2));
    assert_eq!(summary.subdomains.get("www.cs.uci.edu"), Some(&1));
    assert!(summary
        .common_words
        .iter()
        .any(|(word, _)| word == "research"));
}

#[tokio::test]
async fn test_login_page_links_not_harvested() {
    let server = MockServer::start().await;

    let home = page(r#"<a href="/account">Account</a>"#);
    let login = page(
        r#"
        <form action="/account/login" method="post">
            <input type="text" name="user">
            <input type="password" name="pass">
        </form>
        <a href="/account/private">Private</a>
        "#,
    );
    serve_page(&server, HOME, &home, 1).await;
    serve_page(&server, "https://www.ics.uci.edu/account", &login, 1).await;
    serve_page(&server, "https://www.ics.uci.edu/account/private", &page(""), 0).await;

    let harness = run_pool(&server, &[HOME]).await;

    assert_eq!(harness.processed, 2);
    assert_eq!(harness.frontier.completed_count(), 2);
    assert_eq!(harness.report.unique_page_count(), 2);
}

#[tokio::test]
async fn test_cache_errors_do_not_stop_the_crawl() {
    let server = MockServer::start().await;

    let home = page(r#"<a href="/missing">Missing</a><a href="/people">People</a>"#);
    serve_page(&server, HOME, &home, 1).await;
    serve_envelope(
        &server,
        "https://www.ics.uci.edu/missing",
        scope_crawler::crawler::CacheEnvelope {
            status: 404,
            url: Some("https://www.ics.uci.edu/missing".to_string()),
            error: Some("upstream returned 404".to_string()),
            ..Default::default()
        },
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(query_param("q", PEOPLE))
        .respond_with(ResponseTemplate::new(500).set_body_string("proxy exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, &[HOME]);
    let summary = run_crawl(config, false).await.unwrap();

    assert_eq!(summary.total_fetches, 3);
    assert_eq!(summary.unique_pages, 1);
    assert_eq!(summary.status_counts.get(&404), Some(&1));
    assert_eq!(summary.status_counts.get(&500), Some(&1));
}

#[tokio::test]
async fn test_undecodable_cache_reply_is_not_a_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("q", HOME))
        .respond_with(ResponseTemplate::new(200).set_body_string("garbage not cbor"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, &[HOME]);
    let summary = run_crawl(config, false).await.unwrap();

    assert_eq!(summary.total_fetches, 1);
    assert_eq!(summary.status_counts.get(&200), Some(&1));
    assert_eq!(summary.unique_pages, 0);
    assert!(summary.subdomains.is_empty());
}

#[tokio::test]
async fn test_resume_skips_completed_urls() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("frontier.db");
    let ledger = ledger.to_str().unwrap();

    let server = MockServer::start().await;
    serve_page(&server, HOME, &page(r#"<a href="/people">People</a>"#), 2).await;
    serve_page(&server, PEOPLE, &page("Faculty and staff"), 2).await;

    // First run crawls everything
    let config = create_test_config_with_ledger(&server, &[HOME], ledger);
    let summary = run_crawl(config, false).await.unwrap();
    assert_eq!(summary.total_fetches, 2);

    // Resuming a finished crawl has nothing left to do
    let config = create_test_config_with_ledger(&server, &[HOME], ledger);
    let summary = run_crawl(config, false).await.unwrap();
    assert_eq!(summary.total_fetches, 0);

    // Restarting crawls from the seeds again
    let config = create_test_config_with_ledger(&server, &[HOME], ledger);
    let summary = run_crawl(config, true).await.unwrap();
    assert_eq!(summary.total_fetches, 2);
}

/// Report that panics while recording the first fetch
struct PanickingReport;

impl Report for PanickingReport {
    fn record(&self, result: &FetchResult, _words: &[String]) {
        panic!("report failed while recording {}", result.url);
    }
}

#[tokio::test]
async fn test_worker_panic_stops_the_pool() {
    let server = MockServer::start().await;
    serve_page(&server, HOME, &page(r#"<a href="/people">People</a>"#), 1).await;

    let config = create_test_config(&server, &[HOME]);
    let policy = Arc::new(PolicyEngine::from_config(&config).unwrap());
    let frontier = Arc::new(prepare_frontier(&config, &policy, false).unwrap());
    let client = CacheClient::new(&config.cache, &config.worker).unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_workers(
            Arc::clone(&frontier),
            Arc::new(PanickingReport),
            policy,
            client,
            config.worker.threads as usize,
            config.worker.politeness_delay(),
        ),
    )
    .await
    .expect("pool should not hang after a worker panic");

    assert!(matches!(result, Err(CrawlError::Join(_))));
    assert_eq!(frontier.state_of(HOME), Some(UrlState::InFlight));
}
