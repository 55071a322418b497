use url::Url;

/// Extracts the lowercase host of a URL
///
/// Returns `None` for URLs without a host, which never happens for parsed
/// http(s) URLs but does for `mailto:` and friends.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use scope_crawler::url::extract_domain;
///
/// let url = Url::parse("https://WWW.ICS.UCI.EDU/about").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.ics.uci.edu".to_string()));
///
/// let url = Url::parse("mailto:someone@uci.edu").unwrap();
/// assert_eq!(extract_domain(&url), None);
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}
