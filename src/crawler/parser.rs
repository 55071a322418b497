//! HTML link harvesting
//!
//! This module turns a delivered page into the list of links worth enqueueing:
//! - Hyperlink targets are resolved against the page's final URL
//! - Each resolved link runs through the policy chain
//! - Survivors are canonicalized and deduplicated per page
//!
//! `scraper::Html` is not `Send`, so everything here is synchronous and the
//! parsed document never lives across an await point.

use crate::crawler::FetchResult;
use crate::policy::{is_restricted_page, PolicyEngine};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// What a delivered page yielded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Harvest {
    /// Login wall or restricted page; links are not trusted
    Restricted,
    /// Canonical links that passed the policy chain, in document order
    Links(Vec<String>),
}

/// Parses a delivered page and harvests its admissible links
///
/// # Arguments
///
/// * `policy` - The compiled policy engine
/// * `result` - The fetch result the body came from
/// * `requested_url` - The URL handed to the download client
/// * `body` - The delivered page bytes
///
/// # Returns
///
/// `Harvest::Restricted` for login pages, otherwise the surviving links. Links
/// that fail to resolve, fail the policy chain, or fail to canonicalize are
/// skipped individually.
pub fn harvest(
    policy: &PolicyEngine,
    result: &FetchResult,
    requested_url: &str,
    body: &[u8],
) -> Harvest {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    if is_restricted_page(&document, result) {
        return Harvest::Restricted;
    }

    let Some(base) = base_url(&result.url, requested_url) else {
        tracing::debug!("No usable base URL for {}", requested_url);
        return Harvest::Links(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for link in extract_links(&document, &base) {
        if let Err(rejection) = policy.check_link(&link) {
            tracing::trace!("Skipping {}: {}", link, rejection);
            continue;
        }

        let canonical = policy.canonicalizer().canonicalize_url(link);
        let canonical = canonical.to_string();
        if seen.insert(canonical.clone()) {
            links.push(canonical);
        }
    }

    Harvest::Links(links)
}

/// Picks the URL relative links are resolved against
///
/// The response URL reflects redirects the cache followed; the requested URL
/// is the fallback when the response URL is missing or does not parse.
fn base_url(response_url: &str, requested_url: &str) -> Option<Url> {
    Url::parse(response_url)
        .or_else(|_| Url::parse(requested_url))
        .ok()
}

/// Extracts every hyperlink target, resolved to an absolute URL
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only anchors
/// - Hrefs that do not resolve against the base
///
/// `rel="nofollow"` links are followed.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only anchors
/// - Invalid URLs
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    base_url.join(href).ok()
}
