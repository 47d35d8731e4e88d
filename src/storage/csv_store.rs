//! CSV-backed record store
//!
//! Two files are maintained:
//! - the record file, one row per [`Record`] in processing order
//! - the domain list, every distinct resolved value, sorted, one per line
//!
//! Both are written to a temporary file in the target directory and then
//! renamed over the old file, so an interrupted flush leaves the previous
//! version intact.

use crate::state::{Record, UNRESOLVED};
use crate::storage::traits::{CheckpointSet, RecordStore, StorageError, StorageResult};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Record store persisted as CSV plus a derived domain list
#[derive(Debug)]
pub struct CsvRecordStore {
    records_path: PathBuf,
    domains_path: PathBuf,
    records: Vec<Record>,
    flushed: usize,
}

impl CsvRecordStore {
    pub fn new(records_path: impl Into<PathBuf>, domains_path: impl Into<PathBuf>) -> Self {
        Self {
            records_path: records_path.into(),
            domains_path: domains_path.into(),
            records: Vec::new(),
            flushed: 0,
        }
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    pub fn domains_path(&self) -> &Path {
        &self.domains_path
    }

    /// Reads every record in the record file
    pub fn read_records(path: &Path) -> StorageResult<Vec<Record>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();

        for (index, row) in reader.deserialize::<Record>().enumerate() {
            let record = row.map_err(|e| {
                StorageError::Corrupt(format!("{} row {}: {}", path.display(), index + 2, e))
            })?;
            records.push(record);
        }

        Ok(records)
    }

    fn write_records(&self) -> StorageResult<()> {
        let mut buffer = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            for record in &self.records {
                writer.serialize(record)?;
            }
            if self.records.is_empty() {
                writer.write_record(["Identifier", "RawValue", "NormalizedValue", "SourceURL", "Status"])?;
            }
            writer.flush()?;
        }

        write_atomic(&self.records_path, &buffer)
    }

    fn write_domains(&self) -> StorageResult<()> {
        let mut content = String::new();
        for domain in distinct_domains(&self.records) {
            content.push_str(&domain);
            content.push('\n');
        }

        write_atomic(&self.domains_path, content.as_bytes())
    }
}

impl RecordStore for CsvRecordStore {
    fn load(&mut self) -> StorageResult<CheckpointSet> {
        self.records = Self::read_records(&self.records_path)?;
        self.flushed = self.records.len();

        let checkpoint = CheckpointSet::from_records(&self.records);
        tracing::info!(
            "Loaded {} records from {} ({} trusted)",
            self.records.len(),
            self.records_path.display(),
            checkpoint.len()
        );

        Ok(checkpoint)
    }

    fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.write_records()?;
        self.write_domains()?;
        self.flushed = self.records.len();

        tracing::debug!(
            "Flushed {} records to {}",
            self.records.len(),
            self.records_path.display()
        );
        Ok(())
    }

    fn records(&self) -> &[Record] {
        &self.records
    }

    fn unflushed(&self) -> usize {
        self.records.len() - self.flushed
    }
}

/// Sorted distinct resolved values
pub fn distinct_domains(records: &[Record]) -> BTreeSet<String> {
    records
        .iter()
        .map(|record| record.normalized_value.trim())
        .filter(|value| !value.is_empty() && *value != UNRESOLVED)
        .map(str::to_string)
        .collect()
}

/// Writes `content` to a sibling temporary file, syncs it, then renames it
/// over `path`
fn write_atomic(path: &Path, content: &[u8]) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(content)?;
    temp.flush()?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| StorageError::Persist {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
