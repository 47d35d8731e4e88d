//! Page source collaborator
//!
//! The fetcher never talks to the network itself. It asks a [`PageSource`]
//! for one identifier's page and gets back a status code and body, or a
//! classified transport failure. [`HttpPageSource`] is the `reqwest`
//! implementation used by the binary.

use crate::config::{SourceConfig, UserAgentConfig};
use crate::state::Identifier;
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::time::Duration;

/// Maximum redirect hops followed for one profile page
const MAX_REDIRECTS: usize = 10;

/// Characters escaped when an identifier becomes one path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Raw answer from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

/// Transport failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Body,
    Other,
    /// Malformed request or redirect loop; retrying cannot help
    Fatal,
}

/// A request that never produced an HTTP status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns true if another attempt may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self.kind, TransportErrorKind::Fatal)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_body() || e.is_decode() {
            TransportErrorKind::Body
        } else if e.is_builder() || e.is_redirect() {
            TransportErrorKind::Fatal
        } else {
            TransportErrorKind::Other
        };

        Self::new(kind, e.to_string())
    }
}

/// Something that can fetch the profile page for an identifier
#[async_trait]
pub trait PageSource: Send + Sync {
    /// The URL requested for `id`, also stored as the record's source URL
    fn page_url(&self, id: &Identifier) -> String;

    /// Issues one request for `id`
    async fn get(&self, id: &Identifier) -> Result<PageResponse, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use site_harvest::config::UserAgentConfig;
/// use site_harvest::harvest::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "SiteHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
///     agent_string: None,
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches profile pages from the URL template over HTTP
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    url_template: String,
    lowercase_identifier: bool,
}

impl HttpPageSource {
    pub fn new(client: Client, url_template: impl Into<String>, lowercase_identifier: bool) -> Self {
        Self {
            client,
            url_template: url_template.into(),
            lowercase_identifier,
        }
    }

    pub fn from_config(
        source: &SourceConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, Duration::from_secs(source.timeout_secs))?;
        Ok(Self::new(
            client,
            source.url_template.clone(),
            source.lowercase_identifier,
        ))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    fn page_url(&self, id: &Identifier) -> String {
        let id = if self.lowercase_identifier {
            id.as_str().to_lowercase()
        } else {
            id.as_str().to_string()
        };
        let segment = utf8_percent_encode(&id, SEGMENT).to_string();
        self.url_template.replace("{id}", &segment)
    }

    async fn get(&self, id: &Identifier) -> Result<PageResponse, TransportError> {
        let url = self.page_url(id);
        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(PageResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
            agent_string: None,
        }
    }

    fn source(lowercase: bool) -> HttpPageSource {
        let client = build_http_client(&create_test_config(), Duration::from_secs(5)).unwrap();
        HttpPageSource::new(
            client,
            "https://stockanalysis.com/stocks/{id}/company/",
            lowercase,
        )
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(15));
        assert!(client.is_ok());
    }

    #[test]
    fn test_page_url_substitution() {
        let id = Identifier::parse("brk.b").unwrap();
        assert_eq!(
            source(false).page_url(&id),
            "https://stockanalysis.com/stocks/BRK.B/company/"
        );
        assert_eq!(
            source(true).page_url(&id),
            "https://stockanalysis.com/stocks/brk.b/company/"
        );
    }

    #[test]
    fn test_page_url_escapes_reserved_characters() {
        let id = Identifier::parse("a/b?c#d e").unwrap();
        assert_eq!(
            source(false).page_url(&id),
            "https://stockanalysis.com/stocks/A%2FB%3FC%23D%20E/company/"
        );

        let id = Identifier::parse("BF-B_1~X").unwrap();
        assert_eq!(
            source(false).page_url(&id),
            "https://stockanalysis.com/stocks/BF-B_1~X/company/"
        );
    }

    #[test]
    fn test_transport_error_transience() {
        assert!(TransportError::new(TransportErrorKind::Timeout, "slow").is_transient());
        assert!(TransportError::new(TransportErrorKind::Connect, "refused").is_transient());
        assert!(!TransportError::new(TransportErrorKind::Fatal, "loop").is_transient());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(2)).unwrap();
        // Port 9 (discard) is closed on test machines
        let source = HttpPageSource::new(client, "http://127.0.0.1:9/{id}", false);
        let err = source
            .get(&Identifier::parse("AAPL").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected {:?}", err);
    }
}
