//! Low-value query check

use crate::policy::Rejection;
use crate::url::Canonicalizer;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

fn iso_date() -> &'static Regex {
    static ISO_DATE: OnceLock<Regex> = OnceLock::new();
    ISO_DATE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"))
}

/// Rejects a query carrying an ignorable key or an ISO date value
///
/// Both are strong signals of an unbounded parameterized URL space.
pub fn check_query(url: &Url, canonicalizer: &Canonicalizer) -> Result<(), Rejection> {
    for (key, value) in url.query_pairs() {
        if canonicalizer.is_ignorable(&key) {
            return Err(Rejection::IgnorableQueryKey(key.into_owned()));
        }
        if iso_date().is_match(&value) {
            return Err(Rejection::DateQueryValue(key.into_owned()));
        }
    }
    Ok(())
}
