//! Integration tests for the crawler
//!
//! wiremock stands in for the cache service and serves CBOR envelopes for the
//! target URLs, so full crawls run without touching the network.

mod cache_tests;
mod common;
mod crawl_tests;
