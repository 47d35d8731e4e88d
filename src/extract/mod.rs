//! Extraction of the target attribute from profile page markup
//!
//! The extractor runs an ordered chain of independent heuristics and keeps the
//! first candidate any of them produces:
//!
//! 1. Structured label match (`Website` cell followed by its value)
//! 2. Labeled section proximity (links near a `Contact` heading)
//! 3. URL-shaped patterns in the visible text
//! 4. First acceptable outbound hyperlink
//!
//! Strategies 2-4 only return candidates that pass the [`DomainFilter`].
//! Extraction never fails: unusable content is reported as
//! [`ExtractionOutcome::Malformed`] with an unresolved value.

mod strategies;

pub use strategies::{labeled_section, outbound_link_scan, structured_label, text_pattern_scan};

use crate::config::{ExtractorConfig, SourceConfig};
use crate::state::UNRESOLVED;
use crate::url::{normalize_candidate, DomainFilter};
use scraper::Html;
use std::fmt;

/// Uniform strategy signature: document in, candidate out
pub type StrategyFn = fn(&Html, &ExtractionRules) -> Option<String>;

/// Names of the heuristics, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    StructuredLabel,
    LabeledSection,
    TextPattern,
    OutboundLink,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StructuredLabel => "structured-label",
            Self::LabeledSection => "labeled-section",
            Self::TextPattern => "text-pattern",
            Self::OutboundLink => "outbound-link",
        };
        f.write_str(name)
    }
}

/// The default chain, highest priority first
pub const DEFAULT_CHAIN: [(StrategyKind, StrategyFn); 4] = [
    (StrategyKind::StructuredLabel, structured_label),
    (StrategyKind::LabeledSection, labeled_section),
    (StrategyKind::TextPattern, text_pattern_scan),
    (StrategyKind::OutboundLink, outbound_link_scan),
];

/// Inputs shared by every strategy
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    /// Lower-cased exact label texts
    pub labels: Vec<String>,

    /// Lower-cased section keywords
    pub section_keywords: Vec<String>,

    pub filter: DomainFilter,
}

impl ExtractionRules {
    pub fn from_config(extractor: &ExtractorConfig, source: &SourceConfig) -> Self {
        Self {
            labels: lowercase(&extractor.labels),
            section_keywords: lowercase(&extractor.section_keywords),
            filter: DomainFilter::from_config(extractor, source),
        }
    }
}

/// How extraction ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// A strategy produced a candidate
    Matched(StrategyKind),

    /// The content was usable but no strategy matched
    NoMatch,

    /// The content could not be treated as a page at all
    Malformed(String),
}

/// Result of running the chain over one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// The winning strategy's matched text
    pub raw_value: Option<String>,

    /// `raw_value` normalized to a host, or [`UNRESOLVED`]
    pub normalized_value: String,

    pub outcome: ExtractionOutcome,
}

impl ExtractionResult {
    fn unresolved(outcome: ExtractionOutcome) -> Self {
        Self {
            raw_value: None,
            normalized_value: UNRESOLVED.to_string(),
            outcome,
        }
    }

    /// Returns true if a strategy matched
    pub fn is_match(&self) -> bool {
        matches!(self.outcome, ExtractionOutcome::Matched(_))
    }
}

/// Runs the strategies in order and returns the first candidate found
pub fn first_match(
    document: &Html,
    rules: &ExtractionRules,
    chain: &[(StrategyKind, StrategyFn)],
) -> Option<(StrategyKind, String)> {
    chain.iter().find_map(|(kind, strategy)| {
        strategy(document, rules)
            .filter(|candidate| !candidate.trim().is_empty())
            .map(|candidate| (*kind, candidate))
    })
}

/// Heuristic extractor for company websites
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: ExtractionRules,
    chain: Vec<(StrategyKind, StrategyFn)>,
}

impl Extractor {
    /// Creates an extractor running the default chain
    pub fn new(rules: ExtractionRules) -> Self {
        Self {
            rules,
            chain: DEFAULT_CHAIN.to_vec(),
        }
    }

    /// Creates an extractor running a custom chain
    pub fn with_chain(rules: ExtractionRules, chain: Vec<(StrategyKind, StrategyFn)>) -> Self {
        Self { rules, chain }
    }

    pub fn from_config(extractor: &ExtractorConfig, source: &SourceConfig) -> Self {
        Self::new(ExtractionRules::from_config(extractor, source))
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Extracts the target attribute from raw page content
    ///
    /// # Example
    ///
    /// ```
    /// use site_harvest::extract::{ExtractionRules, Extractor};
    /// use site_harvest::url::DomainFilter;
    ///
    /// let rules = ExtractionRules {
    ///     labels: vec!["website".to_string()],
    ///     section_keywords: vec![],
    ///     filter: DomainFilter::new(vec![], vec![], vec![], 3),
    /// };
    /// let result = Extractor::new(rules)
    ///     .extract(r#"<dl><dt>Website</dt><dd><a href="https://www.apple.com">Apple</a></dd></dl>"#);
    /// assert_eq!(result.normalized_value, "apple.com");
    /// ```
    pub fn extract(&self, content: &str) -> ExtractionResult {
        if let Some(reason) = malformed_reason(content) {
            return ExtractionResult::unresolved(ExtractionOutcome::Malformed(reason));
        }

        let document = Html::parse_document(content);

        match first_match(&document, &self.rules, &self.chain) {
            Some((kind, raw)) => {
                let raw = raw.trim().to_string();
                let normalized_value = normalize_candidate(&raw);
                tracing::debug!("Strategy {} matched {} -> {}", kind, raw, normalized_value);
                ExtractionResult {
                    raw_value: Some(raw),
                    normalized_value,
                    outcome: ExtractionOutcome::Matched(kind),
                }
            }
            None => ExtractionResult::unresolved(ExtractionOutcome::NoMatch),
        }
    }
}

/// Content that cannot be a page: blank bodies and binary payloads
fn malformed_reason(content: &str) -> Option<String> {
    if content.trim().is_empty() {
        return Some("empty body".to_string());
    }

    if content.contains('\0') {
        return Some("binary content".to_string());
    }

    None
}

fn lowercase(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(ExtractionRules {
            labels: vec!["website".to_string()],
            section_keywords: vec!["contact".to_string()],
            filter: DomainFilter::new(
                vec!["yahoo.com".to_string()],
                vec!["rivals.com".to_string(), "facebook.com".to_string()],
                vec![],
                3,
            ),
        })
    }

    #[test]
    fn test_structured_label_beats_generic_link() {
        let html = r#"<html><body>
            <a href="https://www.oracle.com/">Sponsored</a>
            <table><tr><td>Website</td><td><a href="https://www.apple.com">apple.com</a></td></tr></table>
        </body></html>"#;

        let result = extractor().extract(html);
        assert_eq!(
            result.outcome,
            ExtractionOutcome::Matched(StrategyKind::StructuredLabel)
        );
        assert_eq!(result.raw_value.as_deref(), Some("https://www.apple.com"));
        assert_eq!(result.normalized_value, "apple.com");
    }

    #[test]
    fn test_falls_through_to_outbound_link() {
        let html = r#"<html><body>
            <a href="https://sports.rivals.com/x">Rivals</a>
            <a href="https://finance.yahoo.com/quote/AAPL">Quote</a>
            <a href="https://investor.apple.com/">Investors</a>
        </body></html>"#;

        let result = extractor().extract(html);
        assert_eq!(
            result.outcome,
            ExtractionOutcome::Matched(StrategyKind::OutboundLink)
        );
        assert_eq!(result.normalized_value, "investor.apple.com");
    }

    #[test]
    fn test_no_match_is_data() {
        let html = r#"<html><body><p>Nothing to see</p><a href="/quote/AAPL">Quote</a></body></html>"#;
        let result = extractor().extract(html);
        assert_eq!(result.outcome, ExtractionOutcome::NoMatch);
        assert_eq!(result.raw_value, None);
        assert_eq!(result.normalized_value, UNRESOLVED);
    }

    #[test]
    fn test_malformed_is_distinguishable() {
        let empty = extractor().extract("   ");
        assert!(matches!(empty.outcome, ExtractionOutcome::Malformed(_)));
        assert_eq!(empty.normalized_value, UNRESOLVED);

        let binary = extractor().extract("\u{0}\u{1}PNG");
        assert!(matches!(binary.outcome, ExtractionOutcome::Malformed(_)));
    }

    #[test]
    fn test_broken_markup_still_parses() {
        let html = r#"<div><td>Website<td><a href="https://www.apple.com">apple"#;
        let result = extractor().extract(html);
        assert!(result.is_match());
        assert_eq!(result.normalized_value, "apple.com");
    }

    #[test]
    fn test_custom_chain_order() {
        let html = r#"<html><body>
            <a href="https://www.oracle.com/">Oracle</a>
            <dl><dt>Website</dt><dd>https://www.apple.com</dd></dl>
        </body></html>"#;

        let chain = vec![
            (StrategyKind::OutboundLink, outbound_link_scan as StrategyFn),
            (StrategyKind::StructuredLabel, structured_label as StrategyFn),
        ];
        let extractor = Extractor::with_chain(extractor().rules().clone(), chain);
        let result = extractor.extract(html);
        assert_eq!(result.normalized_value, "oracle.com");
    }

    #[test]
    fn test_first_match_stops_at_first_hit() {
        fn never(_: &Html, _: &ExtractionRules) -> Option<String> {
            panic!("later strategies must not run");
        }
        fn always(_: &Html, _: &ExtractionRules) -> Option<String> {
            Some("example.com".to_string())
        }
        fn empty(_: &Html, _: &ExtractionRules) -> Option<String> {
            Some("  ".to_string())
        }

        let document = Html::parse_document("<p></p>");
        let chain: Vec<(StrategyKind, StrategyFn)> = vec![
            (StrategyKind::StructuredLabel, empty),
            (StrategyKind::LabeledSection, always),
            (StrategyKind::TextPattern, never),
        ];
        let rules = extractor().rules().clone();
        assert_eq!(
            first_match(&document, &rules, &chain),
            Some((StrategyKind::LabeledSection, "example.com".to_string()))
        );
    }
}
