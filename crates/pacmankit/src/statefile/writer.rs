//! Writer for generating state file content.

use crate::error::{Error, Result};
use crate::types::StateEntry;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// What to do when the target file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with [`Error::StateFileExists`] and leave the file untouched
    #[default]
    CreateNew,
    /// Replace the file atomically
    Overwrite,
}

/// Serialize entries to state file content, sorted by name.
pub fn write_string(entries: &[StateEntry]) -> Result<String> {
    let mut sorted = entries.to_vec();
    sorted.sort();

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    sorted.serialize(&mut ser)?;
    buf.push(b'\n');

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write entries to `path` through a temporary file in the same directory.
///
/// Creates the parent directory if needed. With [`WriteMode::CreateNew`] an
/// existing file is never modified, even if it appears between the check
/// and the rename.
pub fn write_file(path: &Path, entries: &[StateEntry], mode: WriteMode) -> Result<()> {
    if mode == WriteMode::CreateNew && path.exists() {
        return Err(Error::StateFileExists(path.to_path_buf()));
    }

    let content = write_string(entries)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;

    let persisted = match mode {
        WriteMode::CreateNew => tmp.persist_noclobber(path),
        WriteMode::Overwrite => tmp.persist(path),
    };
    persisted.map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            Error::StateFileExists(path.to_path_buf())
        } else {
            Error::Io(e.error)
        }
    })?;

    log::debug!("Wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}
