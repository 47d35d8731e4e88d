use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-normalized key naming one unit of work (e.g. a ticker symbol)
///
/// Identifiers are trimmed and upper-cased, so `aapl` and ` AAPL ` are the
/// same identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Normalizes a raw identifier, returning None for blank input
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Identifier {
    fn from(raw: String) -> Self {
        Self(raw.trim().to_uppercase())
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
