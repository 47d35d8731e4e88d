use crate::{UrlError, UrlResult};
use url::Url;

/// Schemes that never point at a company website
const UNUSABLE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Characters trimmed off the end of a candidate lifted from prose
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', ')', ']', '"', '\''];

/// Interprets a raw candidate (link target or URL-shaped text) as an absolute URL
///
/// Accepted shapes:
/// - `http://` / `https://` absolute URLs
/// - protocol-relative `//host/path`
/// - scheme-less text such as `www.example.com` or `example.com/about`
///
/// Rejected shapes:
/// - `javascript:`, `mailto:`, `tel:`, `data:` targets
/// - fragment-only (`#top`) and relative (`/path`, `./x`, `?q=1`) targets
/// - hosts without a dot (e.g. `localhost` or a bare path segment)
///
/// # Examples
///
/// ```
/// use site_harvest::url::parse_candidate;
///
/// let url = parse_candidate("www.Example.com/about").unwrap();
/// assert_eq!(url.host_str(), Some("www.example.com"));
/// assert!(parse_candidate("/quote/AAPL").is_err());
/// ```
pub fn parse_candidate(raw: &str) -> UrlResult<Url> {
    let candidate = raw.trim().trim_end_matches(TRAILING_PUNCTUATION);

    if candidate.is_empty() {
        return Err(UrlError::Unusable("empty".to_string()));
    }

    let lower = candidate.to_ascii_lowercase();
    if UNUSABLE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return Err(UrlError::Unusable(candidate.to_string()));
    }

    if candidate.starts_with('#') || candidate.starts_with('?') || candidate.starts_with('.') {
        return Err(UrlError::Unusable(candidate.to_string()));
    }

    let absolute = if candidate.starts_with("//") {
        format!("https:{}", candidate)
    } else if candidate.starts_with('/') {
        return Err(UrlError::Unusable(candidate.to_string()));
    } else if lower.contains("://") {
        candidate.to_string()
    } else {
        format!("https://{}", candidate)
    };

    let url = Url::parse(&absolute).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if host.trim_end_matches('.').contains('.') => Ok(url),
        _ => Err(UrlError::MissingDomain),
    }
}

/// Second-level labels used under two-letter country endings (`co.uk`, `com.au`)
const COUNTRY_SECOND_LEVEL: &[&str] = &["co", "com", "net", "org", "ac", "gov", "edu"];

/// Number of trailing labels that form the public suffix of a host
///
/// Two for `co.uk`-style country endings, one otherwise. The label list is a
/// short fixed set, not the full public suffix list.
pub(crate) fn suffix_label_count(host: &str) -> usize {
    let mut labels = host.trim_end_matches('.').rsplit('.');
    let last = labels.next().unwrap_or_default();
    let country = last.len() == 2 && last.bytes().all(|b| b.is_ascii_alphabetic());

    let Some(second) = labels.next() else {
        return 1;
    };

    if country && COUNTRY_SECOND_LEVEL.contains(&second.to_ascii_lowercase().as_str()) {
        2
    } else {
        1
    }
}

/// Extracts the lower-cased host of a candidate, without a trailing dot
pub fn candidate_host(raw: &str) -> UrlResult<String> {
    let url = parse_candidate(raw)?;
    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    Ok(host.trim_end_matches('.').to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_label_count() {
        assert_eq!(suffix_label_count("apple.com"), 1);
        assert_eq!(suffix_label_count("sap.de"), 1);
        assert_eq!(suffix_label_count("barclays.co.uk"), 2);
        assert_eq!(suffix_label_count("bhp.com.au"), 2);
        assert_eq!(suffix_label_count("vodafone.co.uk."), 2);
        assert_eq!(suffix_label_count("status.co"), 1);
        assert_eq!(suffix_label_count("example.co.uk1"), 1);
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            candidate_host("https://Investor.Apple.com/ir").unwrap(),
            "investor.apple.com"
        );
    }

    #[test]
    fn test_scheme_less_text() {
        assert_eq!(candidate_host("www.apple.com").unwrap(), "www.apple.com");
        assert_eq!(candidate_host("apple.com/contact").unwrap(), "apple.com");
    }

    #[test]
    fn test_protocol_relative() {
        assert_eq!(candidate_host("//cdn.example.com/x.js").unwrap(), "cdn.example.com");
    }

    #[test]
    fn test_trailing_punctuation_trimmed() {
        assert_eq!(candidate_host("apple.com.").unwrap(), "apple.com");
        assert!(candidate_host("(see apple.com),").is_err());
        assert_eq!(candidate_host("https://apple.com),").unwrap(), "apple.com");
    }

    #[test]
    fn test_with_port() {
        assert_eq!(candidate_host("http://example.com:8080/").unwrap(), "example.com");
    }

    #[test]
    fn test_unusable_targets() {
        for raw in [
            "",
            "   ",
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:ir@apple.com",
            "tel:+18005551234",
            "data:text/html,hi",
            "#section",
            "/quote/AAPL/profile",
            "./relative",
            "?page=2",
        ] {
            assert!(
                matches!(parse_candidate(raw), Err(UrlError::Unusable(_))),
                "expected {:?} to be unusable",
                raw
            );
        }
    }

    #[test]
    fn test_invalid_scheme() {
        assert!(matches!(
            parse_candidate("ftp://files.example.com/"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_missing_domain() {
        assert!(matches!(
            parse_candidate("profile/abc"),
            Err(UrlError::MissingDomain)
        ));
        assert!(matches!(
            parse_candidate("http://localhost/"),
            Err(UrlError::MissingDomain)
        ));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            parse_candidate("https://exa mple.com"),
            Err(UrlError::Parse(_))
        ));
    }
}
