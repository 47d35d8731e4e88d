use crate::state::UNRESOLVED;
use crate::url::domain::candidate_host;

/// Normalizes a raw candidate into its canonical host-only form
///
/// # Normalization Steps
///
/// 1. Blank input and the unresolved sentinel stay unresolved
/// 2. Parse the candidate (a missing scheme is treated as `https://`)
/// 3. Keep only the host, lower-cased, without a trailing dot
/// 4. Strip leading `www.` labels as long as a registrable name remains
///
/// Anything that cannot be parsed normalizes to [`UNRESOLVED`]. The function is
/// deterministic and idempotent: its output normalizes to itself.
///
/// # Examples
///
/// ```
/// use site_harvest::url::normalize_candidate;
///
/// assert_eq!(normalize_candidate("https://WWW.Example.com/path"), "example.com");
/// assert_eq!(normalize_candidate("example.com"), "example.com");
/// assert_eq!(normalize_candidate("javascript:void(0)"), "N/A");
/// ```
pub fn normalize_candidate(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == UNRESOLVED {
        return UNRESOLVED.to_string();
    }

    match candidate_host(trimmed) {
        Ok(host) => strip_www(&host).to_string(),
        Err(_) => UNRESOLVED.to_string(),
    }
}

/// Normalizes an optional raw value; absent values are unresolved
pub fn normalize_optional(raw: Option<&str>) -> String {
    raw.map(normalize_candidate)
        .unwrap_or_else(|| UNRESOLVED.to_string())
}

/// Removes leading `www.` labels while the remainder still has a dot
pub(crate) fn strip_www(host: &str) -> &str {
    let mut host = host;
    while let Some(rest) = host.strip_prefix("www.") {
        if !rest.contains('.') {
            break;
        }
        host = rest;
    }
    host
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_www_and_case() {
        assert_eq!(normalize_candidate("https://WWW.Example.com/path"), "example.com");
    }

    #[test]
    fn test_http_and_query() {
        assert_eq!(
            normalize_candidate("http://www.apple.com/?utm_source=yahoo#top"),
            "apple.com"
        );
    }

    #[test]
    fn test_bare_domain() {
        assert_eq!(normalize_candidate("apple.com"), "apple.com");
        assert_eq!(normalize_candidate("  Apple.COM  "), "apple.com");
    }

    #[test]
    fn test_subdomain_kept() {
        assert_eq!(
            normalize_candidate("https://investor.apple.com/"),
            "investor.apple.com"
        );
    }

    #[test]
    fn test_repeated_www() {
        assert_eq!(normalize_candidate("www.www.example.com"), "example.com");
    }

    #[test]
    fn test_www_as_registrable_name() {
        assert_eq!(normalize_candidate("https://www.com/"), "www.com");
    }

    #[test]
    fn test_unresolved_inputs() {
        assert_eq!(normalize_candidate(""), UNRESOLVED);
        assert_eq!(normalize_candidate(UNRESOLVED), UNRESOLVED);
        assert_eq!(normalize_candidate("mailto:ir@apple.com"), UNRESOLVED);
        assert_eq!(normalize_candidate("/relative/path"), UNRESOLVED);
        assert_eq!(normalize_candidate("not a url"), UNRESOLVED);
        assert_eq!(normalize_optional(None), UNRESOLVED);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "https://WWW.Example.com/path",
            "www.www.example.com",
            "http://Sub.Domain.Example.co.uk:8443/x?y=z",
            "example.com.",
            "https://www.com",
            "http://1.2.3/",
            "https://bücher.example/",
            "garbage value",
            "",
            UNRESOLVED,
        ];

        for input in inputs {
            let once = normalize_candidate(input);
            let twice = normalize_candidate(&once);
            assert_eq!(once, twice, "normalization not idempotent for {:?}", input);
        }
    }
}
