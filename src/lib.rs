//! Site-Harvest: a resumable, quota-aware profile page harvester
//!
//! This crate fetches one profile page per identifier, extracts the entity's
//! web presence (its company domain) from loosely structured markup, and
//! persists results incrementally so an interrupted batch resumes without
//! repeating completed work.

pub mod config;
pub mod extract;
pub mod harvest;
pub mod input;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Harvest operations
///
/// Only run-fatal conditions end up here. Per-identifier failures are
/// recorded in the record status instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Identifier source errors. All of them abort the run before any fetch.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Identifier source not found: {0}")]
    Missing(String),

    #[error("Failed to read identifier source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse identifier CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Identifier source {0} contains no identifiers")]
    Empty(String),
}

/// Errors raised while interpreting an extracted candidate as a web address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Not an outbound target: {0}")]
    Unusable(String),
}

/// Result type alias for Site-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for input operations
pub type InputResult<T> = std::result::Result<T, InputError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ExtractionOutcome, ExtractionResult, Extractor};
pub use harvest::{FetchOutcome, Fetcher, RateLimiter};
pub use state::{Identifier, Record, RecordStatus, UNRESOLVED};
pub use url::{normalize_candidate, DomainFilter};
