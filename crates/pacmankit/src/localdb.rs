//! Reader for the pacman local database.
//!
//! Every installed package has a directory `<db_path>/local/<name>-<version>/`
//! holding a `desc` file made of `%SECTION%` headers, each followed by one
//! value per line and a blank line.

use crate::error::{Error, Result};
use crate::types::{InstallReason, InstalledPackage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Handle to the local package database.
///
/// Opening validates the directory layout; reads happen on demand. The
/// handle owns nothing but paths, so dropping it releases everything.
#[derive(Debug, Clone)]
pub struct LocalDatabase {
    root: PathBuf,
}

impl LocalDatabase {
    /// Open the database rooted at `db_path` (normally `/var/lib/pacman`).
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let root = db_path.as_ref().join("local");
        if !root.is_dir() {
            return Err(Error::DatabaseNotFound(root));
        }
        log::debug!("Opened pacman local database at {}", root.display());
        Ok(Self { root })
    }

    /// Path of the `local/` directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Read every installed package, sorted by name.
    pub fn installed(&self) -> Result<Vec<InstalledPackage>> {
        let mut packages = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            // ALPM_DB_VERSION and friends live next to the package directories
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let desc = entry.path().join("desc");
            let content = std::fs::read_to_string(&desc).map_err(|e| Error::DescParse {
                path: desc.clone(),
                message: e.to_string(),
            })?;
            packages.push(parse_desc(&content, &desc)?);
        }

        packages.sort_by(|a, b| a.name.cmp(&b.name));
        log::debug!("Read {} packages from {}", packages.len(), self.root.display());
        Ok(packages)
    }

    /// Read the packages that were installed on request.
    pub fn explicit(&self) -> Result<Vec<InstalledPackage>> {
        let explicit: Vec<_> = self
            .installed()?
            .into_iter()
            .filter(InstalledPackage::is_explicit)
            .collect();
        log::debug!("{} packages are explicitly installed", explicit.len());
        Ok(explicit)
    }
}

/// Split a `desc` file into its sections.
fn parse_sections(content: &str) -> HashMap<&str, Vec<&str>> {
    let mut sections = HashMap::new();
    let mut current: Option<&str> = None;
    let mut values = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.len() > 2 && trimmed.starts_with('%') && trimmed.ends_with('%') {
            if let Some(section) = current.take() {
                sections.insert(section, std::mem::take(&mut values));
            }
            current = Some(&trimmed[1..trimmed.len() - 1]);
        } else if !trimmed.is_empty() {
            values.push(trimmed);
        }
    }

    if let Some(section) = current {
        sections.insert(section, values);
    }

    sections
}

/// Parse one `desc` file. `path` is only used for error reporting.
pub fn parse_desc(content: &str, path: &Path) -> Result<InstalledPackage> {
    let sections = parse_sections(content);
    let single = |key: &str| sections.get(key).and_then(|v| v.first()).copied();

    let name = single("NAME").ok_or_else(|| Error::DescParse {
        path: path.to_path_buf(),
        message: "missing %NAME%".to_string(),
    })?;
    let version = single("VERSION").ok_or_else(|| Error::DescParse {
        path: path.to_path_buf(),
        message: "missing %VERSION%".to_string(),
    })?;
    let reason = match single("REASON") {
        None => InstallReason::Explicit,
        Some(value) => InstallReason::from_desc(value).ok_or_else(|| Error::DescParse {
            path: path.to_path_buf(),
            message: format!("unknown install reason '{value}'"),
        })?,
    };

    Ok(InstalledPackage {
        name: name.to_string(),
        version: version.to_string(),
        reason,
    })
}
