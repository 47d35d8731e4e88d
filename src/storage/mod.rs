//! Storage module for persisting harvest results
//!
//! This module handles the record store, including:
//! - Loading persisted records and deriving the checkpoint set on startup
//! - Append-only in-memory accumulation during a run
//! - Atomic flushes of the record file and the derived domain list

mod csv_store;
mod traits;

pub use csv_store::{distinct_domains, CsvRecordStore};
pub use traits::{CheckpointSet, RecordStore, StorageError, StorageResult};

use crate::config::OutputConfig;

/// Opens the record store described by the output configuration
///
/// Nothing is read until [`RecordStore::load`] is called.
pub fn open_store(config: &OutputConfig) -> CsvRecordStore {
    CsvRecordStore::new(&config.records_path, &config.domains_path)
}
