/// Checks if a host matches an allow-list domain pattern
///
/// Two pattern forms are supported:
/// 1. Exact: "today.uci.edu" matches only "today.uci.edu"
/// 2. Suffix: "*.ics.uci.edu" matches "ics.uci.edu" and every subdomain of it,
///    but never a host that merely ends with the same characters
///
/// Comparison is case-insensitive on both sides.
///
/// # Examples
///
/// ```
/// use scope_crawler::url::matches_domain;
///
/// assert!(matches_domain("*.ics.uci.edu", "www.ics.uci.edu"));
/// assert!(matches_domain("*.ics.uci.edu", "ICS.UCI.EDU"));
/// assert!(!matches_domain("*.ics.uci.edu", "physics.uci.edu"));
/// assert!(matches_domain("today.uci.edu", "today.uci.edu"));
/// assert!(!matches_domain("today.uci.edu", "news.today.uci.edu"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => {
            host == base
                || host
                    .strip_suffix(base)
                    .is_some_and(|rest| rest.len() > 1 && rest.ends_with('.'))
        }
        None => host == pattern,
    }
}
