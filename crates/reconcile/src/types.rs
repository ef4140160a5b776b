//! Core types for package reconciliation

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::{self, HashMap};
use std::collections::HashSet;
use std::process::Output;

/// A single package entry: a name and an optional version string
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package name, the identity of the record
    pub name: String,
    /// Version string, if known
    pub version: Option<String>,
}

impl PackageRecord {
    /// Create a record without version information
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::EmptyName);
        }
        Ok(Self {
            name,
            version: None,
        })
    }

    /// Create a record carrying a version
    pub fn versioned(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        Ok(Self::new(name)?.with_version(version))
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// An unordered set of package records keyed by name
///
/// Built once per run from either the persisted state file (desired) or the
/// host package database (observed), and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    records: HashMap<String, PackageRecord>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest, rejecting empty and duplicate names
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = PackageRecord>,
    {
        let records = records.into_iter();
        let mut index = HashMap::with_capacity(records.size_hint().0);

        for record in records {
            if record.name.trim().is_empty() {
                return Err(Error::EmptyName);
            }
            match index.entry(record.name.clone()) {
                hash_map::Entry::Occupied(_) => {
                    return Err(Error::DuplicatePackage { name: record.name });
                }
                hash_map::Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }

        Ok(Self { records: index })
    }

    /// Number of packages
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the manifest has no packages
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by name
    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.records.get(name)
    }

    /// Check if a package name is present
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Iterate records in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &PackageRecord> {
        self.records.values()
    }

    /// Iterate package names in unspecified order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Records ordered by name
    pub fn sorted(&self) -> Vec<&PackageRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }
}

/// A package present on both sides whose version differs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionChange {
    pub name: String,
    /// Version currently installed (observed)
    pub previous_version: Option<String>,
    /// Version declared in the manifest (desired)
    pub new_version: Option<String>,
}

/// Everything needed to move the observed manifest toward the desired one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    /// Declared but not installed
    pub additions: HashSet<PackageRecord>,
    /// Installed but not declared
    pub removals: HashSet<PackageRecord>,
    /// Present on both sides with differing versions
    pub changes: HashSet<VersionChange>,
}

impl Diff {
    /// Check if the two manifests are already converged
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty() && self.changes.is_empty()
    }

    /// Counts per category
    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            additions: self.additions.len(),
            removals: self.removals.len(),
            changes: self.changes.len(),
        }
    }

    /// Additions ordered by name
    pub fn sorted_additions(&self) -> Vec<&PackageRecord> {
        let mut records: Vec<_> = self.additions.iter().collect();
        records.sort();
        records
    }

    /// Removals ordered by name
    pub fn sorted_removals(&self) -> Vec<&PackageRecord> {
        let mut records: Vec<_> = self.removals.iter().collect();
        records.sort();
        records
    }

    /// Version changes ordered by name
    pub fn sorted_changes(&self) -> Vec<&VersionChange> {
        let mut changes: Vec<_> = self.changes.iter().collect();
        changes.sort();
        changes
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Number of packages to install
    pub additions: usize,
    /// Number of packages to remove
    pub removals: usize,
    /// Number of packages whose version differs
    pub changes: usize,
}

impl DiffSummary {
    /// Total number of differences
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.changes
    }

    /// Check if there are any differences
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Output from a package manager invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}
