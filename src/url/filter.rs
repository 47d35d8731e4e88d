use crate::config::{ExtractorConfig, SourceConfig};
use crate::url::domain::{candidate_host, suffix_label_count};
use crate::url::matcher::matches_suffix;
use crate::url::normalize::strip_www;
use crate::UrlError;
use std::net::IpAddr;
use url::Url;

/// Why a candidate was turned away by the [`DomainFilter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Relative, fragment-only, `javascript:`/`mailto:` or unparseable target
    Unusable(UrlError),

    /// Host belongs to the provider site itself
    Origin(String),

    /// Host is covered by a blocklist entry
    Blocklisted { host: String, entry: String },

    /// A host label contains a blocked keyword (ad and tracking hosts)
    BlockedKeyword { host: String, keyword: String },

    /// Host has more labels than allowed
    TooDeep { host: String, labels: usize },
}

/// Decides whether an outbound candidate can be the company's own domain
///
/// A candidate is rejected when its host
/// - belongs to the provider site (origin domains),
/// - is covered by the blocklist (social networks, ad networks, filings,
///   financial news),
/// - has a label containing a blocked keyword,
/// - has more than `max_host_labels` labels once `www.` is stripped,
///
/// or when the target is not an absolute outbound address at all.
#[derive(Debug, Clone)]
pub struct DomainFilter {
    origin_domains: Vec<String>,
    blocklist: Vec<String>,
    blocked_keywords: Vec<String>,
    max_host_labels: usize,
}

impl DomainFilter {
    /// Creates a filter from explicit lists
    pub fn new(
        origin_domains: Vec<String>,
        blocklist: Vec<String>,
        blocked_keywords: Vec<String>,
        max_host_labels: usize,
    ) -> Self {
        Self {
            origin_domains: lowercase_all(origin_domains),
            blocklist: lowercase_all(blocklist),
            blocked_keywords: lowercase_all(blocked_keywords),
            max_host_labels,
        }
    }

    /// Creates a filter from configuration
    ///
    /// When no origin domains are configured, the registrable part of the
    /// URL template host is used (`finance.yahoo.com` → `yahoo.com`).
    pub fn from_config(extractor: &ExtractorConfig, source: &SourceConfig) -> Self {
        let origin_domains = if source.origin_domains.is_empty() {
            default_origin(&source.url_template).into_iter().collect()
        } else {
            source.origin_domains.clone()
        };

        Self::new(
            origin_domains,
            extractor.blocklist.clone(),
            extractor.blocked_keywords.clone(),
            extractor.max_host_labels,
        )
    }

    /// Checks a raw candidate, returning its host when accepted
    pub fn check(&self, raw: &str) -> Result<String, Rejection> {
        let host = candidate_host(raw).map_err(Rejection::Unusable)?;

        if self
            .origin_domains
            .iter()
            .any(|origin| matches_suffix(origin, &host))
        {
            return Err(Rejection::Origin(host));
        }

        if let Some(entry) = self
            .blocklist
            .iter()
            .find(|entry| matches_suffix(entry, &host))
        {
            return Err(Rejection::Blocklisted {
                entry: entry.clone(),
                host,
            });
        }

        if let Some(keyword) = self
            .blocked_keywords
            .iter()
            .find(|keyword| host.split('.').any(|label| label.contains(keyword.as_str())))
        {
            return Err(Rejection::BlockedKeyword {
                keyword: keyword.clone(),
                host,
            });
        }

        let labels = strip_www(&host).split('.').count();
        if labels > self.max_host_labels {
            return Err(Rejection::TooDeep { host, labels });
        }

        Ok(host)
    }

    /// Returns true if the candidate passes every rule
    pub fn accepts(&self, raw: &str) -> bool {
        self.check(raw).is_ok()
    }

    /// Returns true if the candidate's host belongs to the provider site
    pub fn is_origin(&self, raw: &str) -> bool {
        matches!(self.check(raw), Err(Rejection::Origin(_)))
    }
}

/// Derives the default origin domain from a URL template
///
/// Keeps the registrable part of the template host: the last two labels, or
/// three under a `co.uk`-style country ending.
fn default_origin(url_template: &str) -> Option<String> {
    let sample = url_template.replace("{id}", "ID");
    let url = Url::parse(&sample).ok()?;
    let host = url.host_str()?.trim_end_matches('.').to_lowercase();

    if host.parse::<IpAddr>().is_ok() || host.starts_with('[') {
        return Some(host);
    }

    let labels: Vec<&str> = host.split('.').collect();
    let keep = suffix_label_count(&host) + 1;
    if labels.len() <= keep {
        Some(host)
    } else {
        Some(labels[labels.len() - keep..].join("."))
    }
}

fn lowercase_all(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}
