//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `Identifier`: the case-normalized unit-of-work key
//! - `Record` / `RecordStatus`: the persisted outcome for one identifier
//! - `RateWindowState`: per-window request accounting owned by the rate limiter

mod identifier;
mod record;
mod window_state;

// Re-export main types
pub use identifier::Identifier;
pub use record::{Record, RecordStatus, UNRESOLVED};
pub use window_state::RateWindowState;
