//! Download client tests against a mock cache service

use scope_crawler::crawler::{CacheClient, CacheEnvelope, GATEWAY_TIMEOUT, SERVICE_UNAVAILABLE};
use std::collections::HashMap;
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TARGET: &str = "https://www.ics.uci.edu/about?page=2";
const USER_AGENT: &str = "IR UW25 integration";

fn client_for(endpoint: String, timeout: Duration) -> CacheClient {
    CacheClient::with_endpoint(endpoint, USER_AGENT, timeout).unwrap()
}

#[tokio::test]
async fn test_fetch_sends_target_and_identity() {
    let server = MockServer::start().await;

    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "text/html".to_string());
    let envelope = CacheEnvelope {
        status: 200,
        url: Some("https://www.ics.uci.edu/about/?page=2".to_string()),
        error: None,
        headers,
        body: Some(serde_bytes::ByteBuf::from(b"<html>about</html>".to_vec())),
    };

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", TARGET))
        .and(query_param("u", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(envelope.to_cbor()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(format!("{}/", server.uri()), Duration::from_secs(5));
    let result = client.fetch(TARGET).await;

    assert_eq!(result.status, 200);
    assert_eq!(result.url, "https://www.ics.uci.edu/about/?page=2");
    assert_eq!(result.body.as_deref(), Some(&b"<html>about</html>"[..]));
    assert_eq!(result.header("content-type"), Some("text/html"));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_timeout_maps_to_504() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(CacheEnvelope::html(TARGET, "<html></html>").to_cbor())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = client_for(format!("{}/", server.uri()), Duration::from_secs(1));
    let result = client.fetch(TARGET).await;

    assert_eq!(result.status, GATEWAY_TIMEOUT);
    assert_eq!(result.url, TARGET);
    assert!(result.body.is_none());
    assert_eq!(
        result.error.as_deref(),
        Some("cache request timed out after 1s")
    );
}

#[tokio::test]
async fn test_unreachable_cache_maps_to_503() {
    // Reserve a port, then free it so nothing is listening there
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = client_for(format!("http://127.0.0.1:{}/", port), Duration::from_secs(2));
    let result = client.fetch(TARGET).await;

    assert_eq!(result.status, SERVICE_UNAVAILABLE);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("cache request failed"));
}

#[tokio::test]
async fn test_undecodable_reply_is_unexpected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(format!("{}/", server.uri()), Duration::from_secs(5));
    let result = client.fetch(TARGET).await;

    assert_eq!(result.status, 502);
    assert_eq!(
        result.error.as_deref(),
        Some("unexpected cache response: 502")
    );
}
