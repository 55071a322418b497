use crate::UrlError;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Query keys that only change how a page is displayed, paginated or shared.
///
/// They are stripped during canonicalization and cause discovered links to be
/// rejected outright by the query check.
pub const IGNORABLE_QUERY_KEYS: &[&str] = &[
    "tab_files",
    "tab_details",
    "tab_upload",
    "idx",
    "do",
    "view",
    "action",
    "expanded",
    "ref_tags",
    "format",
    "sort",
    "outlook-ical",
    "ical",
    "redirect_to",
    "tribe-bar-date",
    "share",
];

/// Rewrites URLs into the identity key used for frontier deduplication
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed, not http(s), or host-less
/// 2. Remove the fragment
/// 3. Remove every query pair whose key is ignorable, keeping the raw text
///    and relative order of the remaining pairs
/// 4. Remove the query entirely if nothing is left
///
/// Unlike a full normalizer, scheme, host prefix, path and parameter order are
/// left alone: two URLs are the same resource only if they differ by fragment
/// or by ignorable keys.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    ignored_keys: HashSet<String>,
}

impl Canonicalizer {
    /// Builds a canonicalizer ignoring the built-in keys plus `extra_keys`
    pub fn new<I, S>(extra_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ignored_keys: HashSet<String> = IGNORABLE_QUERY_KEYS
            .iter()
            .map(|key| key.to_string())
            .collect();
        ignored_keys.extend(extra_keys.into_iter().map(Into::into));

        Self { ignored_keys }
    }

    /// Returns true if the query key is dropped during canonicalization
    pub fn is_ignorable(&self, key: &str) -> bool {
        self.ignored_keys.contains(key)
    }

    /// Canonicalizes a URL string
    ///
    /// # Examples
    ///
    /// ```
    /// use scope_crawler::url::Canonicalizer;
    ///
    /// let canonicalizer = Canonicalizer::default();
    /// let url = canonicalizer
    ///     .canonicalize("https://a.ics.uci.edu/p?sort=asc&page=2#top")
    ///     .unwrap();
    /// assert_eq!(url, "https://a.ics.uci.edu/p?page=2");
    /// ```
    pub fn canonicalize(&self, url_str: &str) -> Result<String, UrlError> {
        let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(UrlError::MissingDomain);
        }

        Ok(self.canonicalize_url(url).into())
    }

    /// Canonicalizes an already parsed URL
    pub fn canonicalize_url(&self, mut url: Url) -> Url {
        url.set_fragment(None);

        if let Some(query) = url.query() {
            let segments: Vec<&str> = query.split('&').collect();
            let kept: Vec<&str> = segments
                .iter()
                .copied()
                .filter(|segment| !segment.is_empty())
                .filter(|segment| !self.is_ignorable(&query_key(segment)))
                .collect();

            // Only rewrite when something was dropped so surviving pairs keep their encoding
            if kept.len() != segments.len() {
                let rebuilt = kept.join("&");
                if rebuilt.is_empty() {
                    url.set_query(None);
                } else {
                    url.set_query(Some(&rebuilt));
                }
            }
        }

        url
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

/// Canonicalizes a URL using the built-in ignorable keys
///
/// # Examples
///
/// ```
/// use scope_crawler::url::canonicalize;
///
/// assert_eq!(
///     canonicalize("https://a.ics.uci.edu/p#frag").unwrap(),
///     canonicalize("https://a.ics.uci.edu/p").unwrap()
/// );
/// ```
pub fn canonicalize(url_str: &str) -> Result<String, UrlError> {
    static DEFAULT: OnceLock<Canonicalizer> = OnceLock::new();
    DEFAULT.get_or_init(Canonicalizer::default).canonicalize(url_str)
}

/// Decoded key of a single `key=value` query segment
fn query_key(segment: &str) -> String {
    url::form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}
