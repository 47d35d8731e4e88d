//! Fetch/retry state machine
//!
//! One call to [`Fetcher::fetch`] turns an identifier into exactly one
//! [`FetchOutcome`]. Every attempt, retries included, first takes a slot from
//! the [`RateLimiter`], so retries spend rate budget like any other request.
//!
//! # Classification
//!
//! | Condition | Outcome | Retried |
//! |-----------|---------|---------|
//! | HTTP 2xx | `Success` | - |
//! | HTTP 404 | `NotFound` | no |
//! | HTTP 429 | `RateLimited` | no, the caller decides |
//! | HTTP 5xx | `TransientError` | yes, with backoff |
//! | Timeout, connect, body error | `TransientError` | yes, with backoff |
//! | Other HTTP status | `FatalError` | no |
//! | Malformed request, redirect loop | `FatalError` | no |

use crate::config::RetryConfig;
use crate::harvest::limiter::RateLimiter;
use crate::harvest::source::{PageResponse, PageSource, TransportError};
use crate::state::Identifier;
use std::time::Duration;

/// Result of fetching one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The provider returned the page
    Success { content: String },

    /// The provider answered 429
    RateLimited,

    /// The provider has no page for this identifier
    NotFound,

    /// Network trouble or a server error that outlived the attempt budget
    TransientError { cause: String },

    /// A failure that retrying cannot fix
    FatalError { cause: String },
}

impl FetchOutcome {
    /// Returns true if the outcome should be retried within this fetch
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientError { .. })
    }
}

/// Maps an HTTP answer to an outcome
pub fn classify_response(response: PageResponse) -> FetchOutcome {
    match response.status {
        200..=299 => FetchOutcome::Success {
            content: response.body,
        },
        404 => FetchOutcome::NotFound,
        429 => FetchOutcome::RateLimited,
        500..=599 => FetchOutcome::TransientError {
            cause: format!("HTTP {}", response.status),
        },
        status => FetchOutcome::FatalError {
            cause: format!("HTTP {}", status),
        },
    }
}

/// Maps a transport failure to an outcome
pub fn classify_transport(error: TransportError) -> FetchOutcome {
    if error.is_transient() {
        FetchOutcome::TransientError {
            cause: error.to_string(),
        }
    } else {
        FetchOutcome::FatalError {
            cause: error.to_string(),
        }
    }
}

/// Fetches profile pages with bounded retries
#[derive(Debug, Clone)]
pub struct Fetcher<S> {
    source: S,
    retry: RetryConfig,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S, retry: RetryConfig) -> Self {
        Self { source, retry }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Delay before attempt `attempt + 1`: the initial backoff doubled per
    /// completed attempt, capped at the maximum
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay = self.retry.initial_backoff_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.retry.max_backoff_ms))
    }

    /// Fetches one identifier, retrying transient failures
    pub async fn fetch(&self, id: &Identifier, limiter: &mut RateLimiter) -> FetchOutcome {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            limiter.acquire().await;

            let outcome = match self.source.get(id).await {
                Ok(response) => classify_response(response),
                Err(e) => classify_transport(e),
            };

            if !outcome.is_retryable() || attempt >= max_attempts {
                if attempt > 1 {
                    tracing::debug!("{} finished after {} attempts", id, attempt);
                }
                return outcome;
            }

            let delay = self.backoff(attempt);
            tracing::debug!(
                "Attempt {}/{} for {} failed ({:?}), retrying in {:?}",
                attempt,
                max_attempts,
                id,
                outcome,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
