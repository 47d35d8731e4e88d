//! Run statistics
//!
//! This module tallies record statuses and prints the end-of-run summary and
//! the `--stats` view of a persisted record store.

use crate::state::{Record, RecordStatus};
use crate::storage::distinct_domains;
use chrono::{DateTime, Utc};
use std::fmt;

/// Count of records per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub found: u64,
    pub not_found: u64,
    pub error: u64,
    pub rate_limited: u64,
}

impl StatusCounts {
    /// Tallies the statuses of a record list
    pub fn from_records(records: &[Record]) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.add(record.status);
        }
        counts
    }

    pub fn add(&mut self, status: RecordStatus) {
        match status {
            RecordStatus::Found => self.found += 1,
            RecordStatus::NotFound => self.not_found += 1,
            RecordStatus::Error => self.error += 1,
            RecordStatus::RateLimited => self.rate_limited += 1,
        }
    }

    pub fn get(&self, status: RecordStatus) -> u64 {
        match status {
            RecordStatus::Found => self.found,
            RecordStatus::NotFound => self.not_found,
            RecordStatus::Error => self.error,
            RecordStatus::RateLimited => self.rate_limited,
        }
    }

    pub fn total(&self) -> u64 {
        self.found + self.not_found + self.error + self.rate_limited
    }

    /// Share of records with status `found`, in percent
    pub fn success_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.found as f64 * 100.0 / total as f64),
        }
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found={} not_found={} error={} rate_limited={}",
            self.found, self.not_found, self.error, self.rate_limited
        )
    }
}

/// Why the run loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every pending identifier was processed
    Completed,

    /// The shutdown signal fired
    Interrupted,

    /// Too many consecutive 429 answers
    RateLimited,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::RateLimited => "stopped after repeated rate limiting",
        };
        f.write_str(text)
    }
}

/// Advisory telemetry for one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Statuses of the records appended during this run
    pub counts: StatusCounts,

    /// Identifiers read from the source, duplicates included
    pub total_input: usize,

    pub duplicates_removed: usize,

    /// Identifiers skipped because a trusted record already existed
    pub skipped: usize,

    /// Identifiers left unrecorded after a 429, eligible next run
    pub deferred: usize,

    /// Identifiers never reached because the run stopped early
    pub unprocessed: usize,

    pub stop_reason: StopReason,

    /// Distinct resolved domains across the whole store after the run
    pub distinct_domains: usize,
}

impl RunSummary {
    pub fn stopped_early(&self) -> bool {
        self.stop_reason != StopReason::Completed
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints the end-of-run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Run:");
    println!("  Started:  {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration_seconds());
    println!("  Outcome:  {}", summary.stop_reason);
    println!();

    println!("Input:");
    println!("  Identifiers read:   {}", summary.total_input);
    println!("  Duplicates removed: {}", summary.duplicates_removed);
    println!("  Already complete:   {}", summary.skipped);
    println!();

    println!("This run:");
    for status in RecordStatus::all() {
        println!("  {:<13} {}", format!("{}:", status), summary.counts.get(status));
    }
    println!("  {:<13} {}", "total:", summary.counts.total());
    if let Some(rate) = summary.counts.success_rate() {
        println!("  success rate: {:.1}%", rate);
    }
    if summary.deferred > 0 {
        println!("  {:<13} {}", "deferred:", summary.deferred);
    }
    if summary.unprocessed > 0 {
        println!("  {:<13} {}", "unprocessed:", summary.unprocessed);
    }
    println!();

    println!("Distinct domains in store: {}", summary.distinct_domains);
}

/// Statistics of a persisted record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatistics {
    pub counts: StatusCounts,

    /// Identifiers appearing in more than one row (retried `error` rows)
    pub repeated_identifiers: usize,

    pub distinct_domains: usize,
}

impl StoreStatistics {
    pub fn from_records(records: &[Record]) -> Self {
        let mut seen = std::collections::HashSet::new();
        let repeated = records
            .iter()
            .filter(|record| !seen.insert(&record.identifier))
            .map(|record| &record.identifier)
            .collect::<std::collections::HashSet<_>>()
            .len();

        Self {
            counts: StatusCounts::from_records(records),
            repeated_identifiers: repeated,
            distinct_domains: distinct_domains(records).len(),
        }
    }
}

/// Prints store statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Record Store Statistics ===\n");

    let total = stats.counts.total();
    println!("Records by Status:");
    for status in RecordStatus::all() {
        let count = stats.counts.get(status);
        let percentage = if total > 0 {
            (count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!("  total: {}", total);
    println!();

    println!("Identifiers with repeated rows: {}", stats.repeated_identifiers);
    println!("Distinct domains: {}", stats.distinct_domains);
}
