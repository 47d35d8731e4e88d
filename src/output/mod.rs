//! Output module for run summaries and store statistics
//!
//! This module handles:
//! - Tallying record statuses
//! - Printing the end-of-run summary
//! - Printing statistics of a persisted record store

pub mod stats;

pub use stats::{
    print_statistics, print_summary, RunSummary, StatusCounts, StopReason, StoreStatistics,
};
