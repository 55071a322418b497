//! Shared fixtures for the integration tests

use scope_crawler::config::{parse_config, Config};
use scope_crawler::crawler::CacheEnvelope;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a crawler configuration pointing at the mock cache
pub fn create_test_config(server: &MockServer, seeds: &[&str]) -> Config {
    create_config(server, seeds, None)
}

/// Same as [`create_test_config`] with a persistent frontier ledger
pub fn create_test_config_with_ledger(
    server: &MockServer,
    seeds: &[&str],
    frontier_path: &str,
) -> Config {
    create_config(server, seeds, Some(frontier_path))
}

fn create_config(server: &MockServer, seeds: &[&str], frontier_path: Option<&str>) -> Config {
    let address = server.address();
    let seeds = seeds
        .iter()
        .map(|seed| format!("\"{}\"", seed))
        .collect::<Vec<_>>()
        .join(", ");
    let frontier = frontier_path
        .map(|path| format!("frontier-path = \"{}\"", path))
        .unwrap_or_default();

    let toml = format!(
        r#"
[cache]
host = "{host}"
port = {port}

[worker]
user-agent = "IR UW25 integration"
threads = 2
politeness-delay = 0
fetch-timeout = 1

[crawl]
seeds = [{seeds}]
{frontier}

[policy]
version = 2
root-only-hosts = ["luci.ics.uci.edu"]

[[policy.allow]]
domain = "*.ics.uci.edu"

[[policy.allow]]
domain = "*.cs.uci.edu"
"#,
        host = address.ip(),
        port = address.port(),
        seeds = seeds,
        frontier = frontier,
    );

    parse_config(&toml).expect("test config should be valid")
}

/// Pads a page past the dead-content threshold
pub fn page(body: &str) -> String {
    format!(
        "<html><head><title>ICS</title></head><body>{}<p>{}</p></body></html>",
        body,
        "Research news from the department. ".repeat(5)
    )
}

/// Serves an HTML page for `url`, expecting exactly `hits` requests
pub async fn serve_page(server: &MockServer, url: &str, html: &str, hits: u64) {
    serve_envelope(server, url, CacheEnvelope::html(url, html), hits).await;
}

/// Serves an arbitrary envelope for `url`, expecting exactly `hits` requests
pub async fn serve_envelope(server: &MockServer, url: &str, envelope: CacheEnvelope, hits: u64) {
    Mock::given(method("GET"))
        .and(query_param("q", url))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(envelope.to_cbor()))
        .expect(hits)
        .mount(server)
        .await;
}
