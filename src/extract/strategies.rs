//! Heuristic strategies for locating a company website in profile markup
//!
//! Every strategy has the same shape, `(document, rules) -> candidate`, and is
//! independent of the others. The chain in the parent module decides order.

use crate::extract::ExtractionRules;
use crate::url::{parse_candidate, suffix_label_count};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Elements that carry label/value pairs on profile pages
const STRUCTURED_NODES: &str = "td, th, dt, dd, div, span, p, li, label, strong, b, h3, h4";

/// Elements whose text is never visible
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

/// Ancestor levels inspected around a section keyword
const SECTION_ANCESTOR_DEPTH: usize = 2;

static URL_TEXT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://)?(www\.)?[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}(:\d+)?(/\S*)?$")
        .expect("invalid regex")
});

static HTTP_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhttps?://[^\s"'<>()\[\]]+"#).expect("invalid regex")
});

static WWW_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bwww\.[a-z0-9-]+(\.[a-z0-9-]+)+[^\s"'<>()\[\]]*"#).expect("invalid regex")
});

/// Endings accepted for bare domains in prose
const BARE_DOMAIN_ENDINGS: &[&str] = &[
    "com", "net", "org", "io", "co", "ai", "us", "biz", "info", "tech", "inc",
];

/// Every dotted run of labels; the ending is checked afterwards
static BARE_DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9][a-z0-9-]*(\.[a-z0-9-]+)+\b").expect("invalid regex")
});

/// Strategy 1: a node whose whole text is a known label, followed by the value
///
/// Looks at the label's next element sibling, then at the next structured node
/// in document order that is not nested inside the label. The value is that
/// node's link target, or its text when the text is URL-shaped.
pub fn structured_label(document: &Html, rules: &ExtractionRules) -> Option<String> {
    let selector = Selector::parse(STRUCTURED_NODES).ok()?;
    let nodes: Vec<ElementRef> = document.select(&selector).collect();

    for (index, node) in nodes.iter().enumerate() {
        let label = collapsed_text(node).trim_end_matches(':').trim().to_lowercase();
        if label.is_empty() || !rules.labels.iter().any(|l| *l == label) {
            continue;
        }

        let sibling = node.next_siblings().find_map(ElementRef::wrap);
        let following = nodes[index + 1..]
            .iter()
            .copied()
            .find(|candidate| !is_within(candidate, node));

        for adjacent in sibling.into_iter().chain(following) {
            if let Some(value) = value_of(&adjacent) {
                tracing::trace!("Structured label '{}' matched {}", label, value);
                return Some(value);
            }
        }
    }

    None
}

/// Strategy 2: a section keyword near an outbound link that passes the filter
///
/// Finds elements whose own text contains a section keyword and scans the
/// element, then its parent and grandparent, for the first acceptable link.
pub fn labeled_section(document: &Html, rules: &ExtractionRules) -> Option<String> {
    let all = Selector::parse("body *").ok()?;
    let links = Selector::parse("a[href]").ok()?;

    for element in document.select(&all) {
        if HIDDEN_ELEMENTS.contains(&element.value().name()) {
            continue;
        }

        let own = own_text(&element).to_lowercase();
        if own.is_empty()
            || !rules
                .section_keywords
                .iter()
                .any(|keyword| own.contains(keyword.as_str()))
        {
            continue;
        }

        let scopes = std::iter::once(element).chain(
            element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take(SECTION_ANCESTOR_DEPTH),
        );

        for scope in scopes {
            let found = scope
                .select(&links)
                .filter_map(|link| link.value().attr("href"))
                .map(str::trim)
                .find(|href| rules.filter.accepts(href));

            if let Some(href) = found {
                return Some(href.to_string());
            }
        }
    }

    None
}

/// Strategy 3: URL-shaped text in the visible page text
///
/// Patterns are tried in order: `http(s)://` URLs, `www.` hosts, bare domains.
pub fn text_pattern_scan(document: &Html, rules: &ExtractionRules) -> Option<String> {
    let text = visible_text(document);
    if text.is_empty() {
        return None;
    }

    let text = text.as_str();
    let urls = [&*HTTP_URL_REGEX, &*WWW_URL_REGEX]
        .into_iter()
        .flat_map(|regex| regex.find_iter(text).map(|m| m.as_str()));
    let bare = BARE_DOMAIN_REGEX
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|candidate| has_bare_domain_ending(candidate));

    urls.chain(bare)
        .find(|candidate| rules.filter.accepts(candidate))
        .map(str::to_string)
}

/// Returns true if a whole dotted run ends in a known ending
///
/// `co.uk`-style country endings count when a name sits in front of them.
fn has_bare_domain_ending(candidate: &str) -> bool {
    let labels: Vec<String> = candidate
        .split('.')
        .map(str::to_ascii_lowercase)
        .collect();

    match suffix_label_count(candidate) {
        2 => labels.len() > 2,
        _ => labels
            .last()
            .is_some_and(|ending| BARE_DOMAIN_ENDINGS.contains(&ending.as_str())),
    }
}

/// Strategy 4: the first hyperlink on the page that passes the filter
pub fn outbound_link_scan(document: &Html, rules: &ExtractionRules) -> Option<String> {
    let links = Selector::parse("a[href]").ok()?;

    document
        .select(&links)
        .filter_map(|link| link.value().attr("href"))
        .map(str::trim)
        .find(|href| rules.filter.accepts(href))
        .map(str::to_string)
}

/// Link target or URL-shaped text held by a value node
fn value_of(element: &ElementRef) -> Option<String> {
    if element.value().name() == "a" {
        if let Some(href) = element.value().attr("href") {
            if parse_candidate(href).is_ok() {
                return Some(href.trim().to_string());
            }
        }
    }

    if let Ok(links) = Selector::parse("a[href]") {
        let href = element
            .select(&links)
            .filter_map(|link| link.value().attr("href"))
            .map(str::trim)
            .find(|href| parse_candidate(href).is_ok());
        if let Some(href) = href {
            return Some(href.to_string());
        }
    }

    let text = collapsed_text(element);
    if URL_TEXT_REGEX.is_match(&text) && parse_candidate(&text).is_ok() {
        return Some(text);
    }

    None
}

/// Whole text of an element with runs of whitespace collapsed
fn collapsed_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text held directly by an element, ignoring its child elements
fn own_text(element: &ElementRef) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .flat_map(|text| text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flattened page text, excluding script/style content
fn visible_text(document: &Html) -> String {
    let mut chunks = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|parent| HIDDEN_ELEMENTS.contains(&parent.value().name()));
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
    }

    chunks.join(" ")
}

/// Returns true if `candidate` is `container` or nested inside it
fn is_within(candidate: &ElementRef, container: &ElementRef) -> bool {
    candidate.id() == container.id()
        || candidate
            .ancestors()
            .any(|ancestor| ancestor.id() == container.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::DomainFilter;

    fn rules() -> ExtractionRules {
        ExtractionRules {
            labels: vec!["website".to_string()],
            section_keywords: vec!["contact".to_string()],
            filter: DomainFilter::new(
                vec!["stockanalysis.com".to_string()],
                vec!["facebook.com".to_string(), "sec.gov".to_string()],
                vec![],
                3,
            ),
        }
    }

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_structured_label_table_row() {
        let html = doc(r#"<table><tr><td>Website</td><td><a href="https://www.apple.com">apple.com</a></td></tr></table>"#);
        assert_eq!(
            structured_label(&html, &rules()),
            Some("https://www.apple.com".to_string())
        );
    }

    #[test]
    fn test_structured_label_definition_list_text_value() {
        let html = doc(r#"<dl><dt>Website:</dt><dd>www.microsoft.com</dd></dl>"#);
        assert_eq!(
            structured_label(&html, &rules()),
            Some("www.microsoft.com".to_string())
        );
    }

    #[test]
    fn test_structured_label_is_case_insensitive_exact() {
        let html = doc(r#"<div><span>WEBSITE</span><span>https://nvidia.com</span></div>"#);
        assert_eq!(
            structured_label(&html, &rules()),
            Some("https://nvidia.com".to_string())
        );

        let partial = doc(r#"<div><span>Website visitors</span><span>https://nvidia.com</span></div>"#);
        assert_eq!(structured_label(&partial, &rules()), None);
    }

    #[test]
    fn test_structured_label_ignores_prose_value() {
        let html = doc(r#"<table><tr><td>Website</td><td>Not available</td></tr></table>"#);
        assert_eq!(structured_label(&html, &rules()), None);
    }

    #[test]
    fn test_labeled_section_finds_nearby_link() {
        let html = doc(
            r#"<section><h2>Contact Details</h2>
               <a href="https://stockanalysis.com/about">About</a>
               <a href="mailto:ir@tesla.com">Email</a>
               <a href="https://www.tesla.com">Tesla</a></section>"#,
        );
        assert_eq!(
            labeled_section(&html, &rules()),
            Some("https://www.tesla.com".to_string())
        );
    }

    #[test]
    fn test_labeled_section_without_keyword() {
        let html = doc(r#"<section><h2>Overview</h2><a href="https://www.tesla.com">Tesla</a></section>"#);
        assert_eq!(labeled_section(&html, &rules()), None);
    }

    #[test]
    fn test_text_pattern_scan_prefers_full_urls() {
        let html = doc(r#"<p>See filings at sec.gov or visit https://www.amd.com/en today.</p>"#);
        assert_eq!(
            text_pattern_scan(&html, &rules()),
            Some("https://www.amd.com/en".to_string())
        );
    }

    #[test]
    fn test_text_pattern_scan_bare_domain() {
        let html = doc(r#"<p>Corporate home: intel.com</p>"#);
        assert_eq!(
            text_pattern_scan(&html, &rules()),
            Some("intel.com".to_string())
        );
    }

    #[test]
    fn test_text_pattern_scan_keeps_country_endings() {
        let cases = [
            ("<p>Visit barclays.co.uk for details</p>", "barclays.co.uk"),
            ("<p>Head office: bhp.com.au</p>", "bhp.com.au"),
            ("<p>Find us at vodafone.co.uk.</p>", "vodafone.co.uk"),
        ];

        for (html, expected) in cases {
            let found = text_pattern_scan(&doc(html), &rules());
            assert_eq!(found.as_deref(), Some(expected), "{}", html);
            assert_eq!(crate::url::normalize_candidate(expected), expected);
        }
    }

    #[test]
    fn test_text_pattern_scan_ignores_unknown_endings() {
        let html = doc(r#"<p>Read annual-report.pdf or the v2.1 notes</p>"#);
        assert_eq!(text_pattern_scan(&html, &rules()), None);
    }

    #[test]
    fn test_text_pattern_scan_skips_scripts() {
        let html = doc(r#"<script>var u = "https://tracker.example.com";</script><p>No links here</p>"#);
        assert_eq!(text_pattern_scan(&html, &rules()), None);
    }

    #[test]
    fn test_outbound_link_scan_skips_rejected() {
        let html = doc(
            r##"<a href="#top">Top</a>
               <a href="/stocks/aapl/">Quote</a>
               <a href="https://facebook.com/apple">Facebook</a>
               <a href="https://www.apple.com/">Apple</a>"##,
        );
        assert_eq!(
            outbound_link_scan(&html, &rules()),
            Some("https://www.apple.com/".to_string())
        );
    }

    #[test]
    fn test_outbound_link_scan_none() {
        let html = doc(r#"<a href="javascript:void(0)">Menu</a>"#);
        assert_eq!(outbound_link_scan(&html, &rules()), None);
    }
}
