//! Host pattern matching for blocklist and origin entries
//!
//! Hosts and patterns are expected to be lower-cased already; matching is
//! case-sensitive.

/// Checks if a host matches a pattern
///
/// `*.base` matches `base` itself and every subdomain of it; any other
/// pattern must equal the host exactly.
///
/// # Examples
///
/// ```
/// use site_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.doubleclick.net", "doubleclick.net"));
/// assert!(matches_wildcard("*.doubleclick.net", "ad.g.doubleclick.net"));
/// assert!(!matches_wildcard("doubleclick.net", "ad.doubleclick.net"));
/// ```
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => host
            .strip_suffix(base)
            .is_some_and(|rest| rest.is_empty() || rest.ends_with('.')),
        None => host == pattern,
    }
}

/// Checks if a host equals a domain or is one of its subdomains
///
/// Blocklist and origin entries are suffix rules: `rivals.com` covers
/// `sports.rivals.com`. A leading `*.` on the entry means the same.
///
/// # Examples
///
/// ```
/// use site_harvest::url::matches_suffix;
///
/// assert!(matches_suffix("rivals.com", "sports.rivals.com"));
/// assert!(matches_suffix("*.rivals.com", "rivals.com"));
/// assert!(!matches_suffix("rivals.com", "notrivals.com"));
/// ```
pub fn matches_suffix(entry: &str, host: &str) -> bool {
    if entry.starts_with("*.") {
        matches_wildcard(entry, host)
    } else {
        matches_wildcard(&format!("*.{}", entry), host)
    }
}
