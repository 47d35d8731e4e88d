//! Persisted per-identifier results
//!
//! A `Record` is created once an identifier finishes processing and is never
//! mutated afterwards.

use crate::state::Identifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized value recorded when no usable candidate was found
pub const UNRESOLVED: &str = "N/A";

/// Final status of one identifier within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// A candidate was extracted and normalized
    Found,

    /// The provider has no page for the identifier, or the page holds no candidate
    NotFound,

    /// Transport failures exhausted the retry budget, or the page was unusable
    Error,

    /// The provider answered 429 and the run records rather than defers
    RateLimited,
}

impl RecordStatus {
    /// Returns true if a record with this status marks its identifier complete
    ///
    /// `Error` records stay in the store but their identifiers are retried by
    /// the next run.
    pub fn is_trusted(&self) -> bool {
        !matches!(self, Self::Error)
    }

    /// String form used in the record store
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Error => "error",
            Self::RateLimited => "rate_limited",
        }
    }

    /// Parses the record store string form
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "found" => Some(Self::Found),
            "not_found" => Some(Self::NotFound),
            "error" => Some(Self::Error),
            "rate_limited" => Some(Self::RateLimited),
            _ => None,
        }
    }

    /// Returns all statuses in reporting order
    pub fn all() -> [Self; 4] {
        [Self::Found, Self::NotFound, Self::Error, Self::RateLimited]
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Identifier")]
    pub identifier: Identifier,

    /// Text matched by the winning heuristic, if any
    #[serde(rename = "RawValue")]
    pub raw_value: Option<String>,

    /// Canonical host form of `raw_value`, or [`UNRESOLVED`]
    #[serde(rename = "NormalizedValue")]
    pub normalized_value: String,

    /// Profile page the value was extracted from
    #[serde(rename = "SourceURL")]
    pub source_url: String,

    #[serde(rename = "Status")]
    pub status: RecordStatus,
}

impl Record {
    /// Builds a record that carries no extracted value
    pub fn unresolved(identifier: Identifier, source_url: String, status: RecordStatus) -> Self {
        Self {
            identifier,
            raw_value: None,
            normalized_value: UNRESOLVED.to_string(),
            source_url,
            status,
        }
    }

    /// Returns true if the normalized value is a real domain
    pub fn is_resolved(&self) -> bool {
        self.normalized_value != UNRESOLVED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in RecordStatus::all() {
            assert_eq!(RecordStatus::from_str_value(status.as_str()), Some(status));
        }
        assert_eq!(RecordStatus::from_str_value("processed"), None);
    }

    #[test]
    fn test_trusted_statuses() {
        assert!(RecordStatus::Found.is_trusted());
        assert!(RecordStatus::NotFound.is_trusted());
        assert!(RecordStatus::RateLimited.is_trusted());
        assert!(!RecordStatus::Error.is_trusted());
    }

    #[test]
    fn test_unresolved_record() {
        let id = Identifier::parse("msft").unwrap();
        let record = Record::unresolved(
            id,
            "https://example.com/MSFT".to_string(),
            RecordStatus::NotFound,
        );
        assert_eq!(record.normalized_value, UNRESOLVED);
        assert!(record.raw_value.is_none());
        assert!(!record.is_resolved());
    }
}
