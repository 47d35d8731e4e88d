use serde::Deserialize;

/// Main configuration structure for Site-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
}

/// Where profile pages live
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Profile page URL with an `{id}` placeholder
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Lower-case the identifier when substituting it into the template
    #[serde(rename = "lowercase-identifier", default)]
    pub lowercase_identifier: bool,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Hosts that belong to the provider itself
    ///
    /// Defaults to the registrable part of the template host: two labels, or
    /// three under `co.uk`-style endings. Set this explicitly for providers
    /// on other multi-part public suffixes.
    #[serde(rename = "origin-domains", default)]
    pub origin_domains: Vec<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the harvester
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the harvester
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the harvester
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for harvester-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Full user agent string, replacing the composed one
    #[serde(rename = "agent-string", default)]
    pub agent_string: Option<String>,
}

impl UserAgentConfig {
    /// Formats the user agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)` unless an
    /// explicit `agent-string` is configured.
    pub fn header_value(&self) -> String {
        match &self.agent_string {
            Some(agent) => agent.clone(),
            None => format!(
                "{}/{} (+{}; {})",
                self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
            ),
        }
    }
}

/// Retry policy for transient failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per identifier, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds); doubles each attempt
    #[serde(rename = "initial-backoff-ms", default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for a single backoff delay (milliseconds)
    #[serde(rename = "max-backoff-ms", default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Request ceilings per window, kept below the provider's published quota
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(rename = "per-minute", default = "default_per_minute")]
    pub per_minute: u32,

    #[serde(rename = "per-hour", default = "default_per_hour")]
    pub per_hour: u32,

    #[serde(rename = "per-day", default = "default_per_day")]
    pub per_day: u32,

    /// Extra time slept past a window's reset (milliseconds)
    #[serde(rename = "safety-margin-ms", default = "default_safety_margin_ms")]
    pub safety_margin_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
            per_hour: default_per_hour(),
            per_day: default_per_day(),
            safety_margin_ms: default_safety_margin_ms(),
        }
    }
}

/// Heuristic extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Exact (case-insensitive) label texts that precede the target value
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Keywords marking a section that usually contains the target link
    #[serde(rename = "section-keywords", default = "default_section_keywords")]
    pub section_keywords: Vec<String>,

    /// Domain suffixes that are never the answer (`*.` prefix optional)
    #[serde(default = "default_blocklist")]
    pub blocklist: Vec<String>,

    /// Substrings that disqualify a host label (ad and tracking hosts)
    #[serde(rename = "blocked-keywords", default = "default_blocked_keywords")]
    pub blocked_keywords: Vec<String>,

    /// Maximum dot-separated labels in an accepted host (after `www.`)
    #[serde(rename = "max-host-labels", default = "default_max_host_labels")]
    pub max_host_labels: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            labels: default_labels(),
            section_keywords: default_section_keywords(),
            blocklist: default_blocklist(),
            blocked_keywords: default_blocked_keywords(),
            max_host_labels: default_max_host_labels(),
        }
    }
}

/// What to do with an identifier the provider answered with HTTP 429
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitedPolicy {
    /// Leave it unrecorded so the next run picks it up again
    #[default]
    Defer,
    /// Record it with status `rate_limited` and never retry it
    Record,
}

/// Run loop settings
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Identifier list (`.csv` first column, otherwise one per line)
    #[serde(rename = "input-path")]
    pub input_path: String,

    /// Flush the record store after this many processed identifiers
    #[serde(rename = "flush-every", default = "default_flush_every")]
    pub flush_every: usize,

    /// Log a progress line after this many processed identifiers
    #[serde(rename = "progress-every", default = "default_progress_every")]
    pub progress_every: usize,

    #[serde(rename = "rate-limited-policy", default)]
    pub rate_limited_policy: RateLimitedPolicy,

    /// Pause after a remote 429 before moving on (seconds)
    #[serde(rename = "rate-limited-cooldown-secs", default)]
    pub rate_limited_cooldown_secs: u64,

    /// Stop the run after this many consecutive 429s (0 disables)
    #[serde(rename = "max-consecutive-rate-limits", default)]
    pub max_consecutive_rate_limits: u32,

    /// Pause between two identifiers (milliseconds)
    #[serde(
        rename = "min-request-interval-ms",
        default = "default_min_request_interval_ms"
    )]
    pub min_request_interval_ms: u64,

    /// Upper bound of the extra per-identifier pause added to the interval
    /// (milliseconds)
    #[serde(rename = "request-jitter-ms", default = "default_request_jitter_ms")]
    pub request_jitter_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV record store
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Path to the derived, sorted domain list
    #[serde(rename = "domains-path")]
    pub domains_path: String,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    2_000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_per_minute() -> u32 {
    50
}

fn default_per_hour() -> u32 {
    300
}

fn default_per_day() -> u32 {
    7_000
}

fn default_safety_margin_ms() -> u64 {
    1_000
}

fn default_flush_every() -> usize {
    50
}

fn default_progress_every() -> usize {
    100
}

fn default_min_request_interval_ms() -> u64 {
    2_000
}

fn default_request_jitter_ms() -> u64 {
    2_000
}

fn default_max_host_labels() -> usize {
    3
}

fn default_labels() -> Vec<String> {
    ["website", "web site", "homepage", "home page"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_section_keywords() -> Vec<String> {
    ["contact", "website"].iter().map(|s| s.to_string()).collect()
}

fn default_blocklist() -> Vec<String> {
    [
        // Provider and its static hosts
        "yahoo.com",
        "yimg.com",
        "yahooapis.com",
        "yastatic.net",
        "rivals.com",
        // Ad networks
        "googleadservices.com",
        "googlesyndication.com",
        "doubleclick.net",
        "googletagmanager.com",
        "google-analytics.com",
        "outbrain.com",
        "taboola.com",
        "amazon-adsystem.com",
        // Social media
        "facebook.com",
        "twitter.com",
        "x.com",
        "linkedin.com",
        "youtube.com",
        "instagram.com",
        "tiktok.com",
        "pinterest.com",
        // Filings and financial news
        "sec.gov",
        "bloomberg.com",
        "reuters.com",
        "marketwatch.com",
        "fool.com",
        "seekingalpha.com",
        "cnbc.com",
        "wsj.com",
        "ft.com",
        "barrons.com",
        "stockanalysis.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_blocked_keywords() -> Vec<String> {
    ["adservice", "adsystem", "analytics", "tracking", "pixel", "beacon"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
