//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and the
//! checkpoint set they derive on startup.

use crate::state::{Identifier, Record};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("Corrupt record store: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Identifiers whose persisted records are trusted as complete
///
/// Computed once at startup and never mutated during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointSet {
    completed: HashSet<Identifier>,
}

impl CheckpointSet {
    /// Collects the identifiers of every trusted record
    ///
    /// `error` records are not trusted, so their identifiers are retried.
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            completed: records
                .iter()
                .filter(|record| record.status.is_trusted())
                .map(|record| record.identifier.clone())
                .collect(),
        }
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.completed.contains(id)
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}

/// Trait for record store implementations
///
/// The store holds the full, append-only record list of the run in memory.
/// `flush` writes the whole list; it never mutates persisted files in place.
pub trait RecordStore {
    /// Loads persisted records and derives the checkpoint set
    ///
    /// A missing store is an empty store. Loaded records become the head of
    /// the in-memory list, so a flush preserves them.
    fn load(&mut self) -> StorageResult<CheckpointSet>;

    /// Appends one finished record to the in-memory list
    fn append(&mut self, record: Record);

    /// Atomically persists the in-memory list and its derived artifacts
    ///
    /// Safe to call repeatedly. On failure the in-memory list is untouched.
    fn flush(&mut self) -> StorageResult<()>;

    /// The in-memory record list, loaded records first
    fn records(&self) -> &[Record];

    /// Number of records appended since the last successful flush
    fn unflushed(&self) -> usize;
}
