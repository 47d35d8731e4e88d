//! Identifier source
//!
//! `.csv` files contribute the first column of every data row (the first row
//! is a header). Any other file is read one identifier per line. Values are
//! normalized through [`Identifier::parse`], so blank entries disappear and
//! case differences collapse.

use crate::state::Identifier;
use crate::{InputError, InputResult};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Reads every identifier from the source, in file order
///
/// # Errors
///
/// - [`InputError::Missing`] if the file does not exist
/// - [`InputError::Io`] / [`InputError::Csv`] if it cannot be read
/// - [`InputError::Empty`] if it holds no identifiers
pub fn load_identifiers(path: &Path) -> InputResult<Vec<Identifier>> {
    if !path.exists() {
        return Err(InputError::Missing(path.display().to_string()));
    }

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let identifiers = if is_csv {
        read_csv(path)?
    } else {
        read_lines(path)?
    };

    if identifiers.is_empty() {
        return Err(InputError::Empty(path.display().to_string()));
    }

    tracing::debug!("Read {} identifiers from {}", identifiers.len(), path.display());
    Ok(identifiers)
}

fn read_csv(path: &Path) -> InputResult<Vec<Identifier>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut identifiers = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(id) = row.get(0).and_then(Identifier::parse) {
            identifiers.push(id);
        }
    }

    Ok(identifiers)
}

fn read_lines(path: &Path) -> InputResult<Vec<Identifier>> {
    let content = fs::read_to_string(path)?;
    Ok(content.lines().filter_map(Identifier::parse).collect())
}

/// Removes repeated identifiers, keeping the first occurrence of each
///
/// Returns the unique identifiers and the number removed.
pub fn dedupe_identifiers(identifiers: Vec<Identifier>) -> (Vec<Identifier>, usize) {
    let total = identifiers.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<Identifier> = identifiers
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let removed = total - unique.len();
    (unique, removed)
}
