//! Parser for state files.

use crate::error::{Error, Result};
use crate::types::StateEntry;
use std::collections::HashSet;
use std::path::Path;

/// Parse a state file from disk.
pub fn parse_file(path: &Path) -> Result<Vec<StateEntry>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::StateFileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    parse_str(&content).map_err(|e| match e {
        Error::StateFileParse { line, message, .. } => Error::StateFileParse {
            path: Some(path.to_path_buf()),
            line,
            message,
        },
        other => other,
    })
}

/// Parse state file content.
///
/// A literal `null` is read as an empty list. Duplicate names are rejected.
pub fn parse_str(content: &str) -> Result<Vec<StateEntry>> {
    let entries: Option<Vec<StateEntry>> =
        serde_json::from_str(content).map_err(|e| Error::StateFileParse {
            path: None,
            line: e.line(),
            message: e.to_string(),
        })?;
    let entries = entries.unwrap_or_default();

    let mut seen = HashSet::new();
    for entry in &entries {
        if !seen.insert(entry.name.as_str()) {
            return Err(Error::DuplicatePackage {
                name: entry.name.clone(),
            });
        }
    }

    log::debug!("Parsed {} state file entries", entries.len());
    Ok(entries)
}
