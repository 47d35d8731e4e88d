//! URL handling module for Site-Harvest
//!
//! This module turns raw extracted candidates into web addresses, decides
//! which candidates may be a company's own domain, and normalizes accepted
//! candidates into their canonical host-only form.

mod domain;
mod filter;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{candidate_host, parse_candidate};
pub(crate) use domain::suffix_label_count;
pub use filter::{DomainFilter, Rejection};
pub use matcher::{matches_suffix, matches_wildcard};
pub use normalize::{normalize_candidate, normalize_optional};
