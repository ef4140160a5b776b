//! Core types for pacman package management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the pacman databases.
pub const DEFAULT_DB_PATH: &str = "/var/lib/pacman";

/// Default pacman configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pacman.conf";

/// Sync repositories enabled unless configured otherwise.
pub const DEFAULT_REPOSITORIES: &[&str] = &["core", "extra"];

/// Optional repository enabled by `--multilib`.
pub const MULTILIB: &str = "multilib";

/// Why a package is present on the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallReason {
    /// Installed on request (`%REASON%` absent or `0`)
    #[default]
    Explicit,
    /// Pulled in to satisfy another package (`%REASON%` is `1`)
    Dependency,
}

impl InstallReason {
    /// Parse the value of a `%REASON%` section.
    pub fn from_desc(value: &str) -> Option<Self> {
        match value.trim() {
            "0" => Some(Self::Explicit),
            "1" => Some(Self::Dependency),
            _ => None,
        }
    }
}

impl std::fmt::Display for InstallReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::Dependency => write!(f, "dependency"),
        }
    }
}

/// A package recorded in the pacman local database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// Package name
    pub name: String,
    /// Full version string, e.g. `2.45.2-1`
    pub version: String,
    /// Install reason
    pub reason: InstallReason,
}

impl InstalledPackage {
    /// Check if the package was installed on request.
    pub fn is_explicit(&self) -> bool {
        self.reason == InstallReason::Explicit
    }
}

/// One entry of the persisted state file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateEntry {
    /// Package name
    #[serde(rename = "packageName")]
    pub name: String,
    /// Package version, omitted when unknown
    #[serde(
        rename = "packageVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
}

impl StateEntry {
    /// Create an entry with a name and optional version.
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl From<&InstalledPackage> for StateEntry {
    fn from(pkg: &InstalledPackage) -> Self {
        Self::new(&pkg.name, Some(pkg.version.clone()))
    }
}

/// How pacman is located and configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacmanOptions {
    /// Binary name (looked up in PATH) or absolute path
    pub binary: String,
    /// Database root, containing `local/` and `db.lck`
    pub db_path: PathBuf,
    /// pacman.conf to verify repositories against
    pub config: PathBuf,
    /// Sync repositories that must be enabled
    pub repositories: Vec<String>,
}

impl Default for PacmanOptions {
    fn default() -> Self {
        Self {
            binary: "pacman".to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            repositories: DEFAULT_REPOSITORIES.iter().map(|r| (*r).to_string()).collect(),
        }
    }
}

impl PacmanOptions {
    /// Add the multilib repository if it is not already enabled.
    #[must_use]
    pub fn with_multilib(mut self) -> Self {
        if !self.repositories.iter().any(|r| r == MULTILIB) {
            self.repositories.push(MULTILIB.to_string());
        }
        self
    }

    /// Path of the database lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.db_path.join("db.lck")
    }
}

/// Outcome of one pacman invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Arguments passed to pacman
    pub args: Vec<String>,
    /// Captured standard output
    pub stdout: String,
    /// Standard error, captured while it was forwarded to the terminal
    pub stderr: String,
    /// Exit code, `None` if terminated by a signal
    pub exit_code: Option<i32>,
}

impl Invocation {
    /// Check if pacman exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_reason_from_desc() {
        assert_eq!(InstallReason::from_desc("0"), Some(InstallReason::Explicit));
        assert_eq!(InstallReason::from_desc(" 1 "), Some(InstallReason::Dependency));
        assert_eq!(InstallReason::from_desc("2"), None);
    }

    #[test]
    fn test_with_multilib_is_idempotent() {
        let options = PacmanOptions::default().with_multilib().with_multilib();
        assert_eq!(options.repositories, ["core", "extra", "multilib"]);
    }

    #[test]
    fn test_state_entry_field_names() {
        let json = serde_json::to_string(&StateEntry::new("git", Some("2.45.2-1".into()))).unwrap();
        assert_eq!(json, r#"{"packageName":"git","packageVersion":"2.45.2-1"}"#);

        let json = serde_json::to_string(&StateEntry::new("git", None)).unwrap();
        assert_eq!(json, r#"{"packageName":"git"}"#);
    }

    #[test]
    fn test_invocation_success() {
        let mut inv = Invocation {
            exit_code: Some(0),
            ..Default::default()
        };
        assert!(inv.success());
        inv.exit_code = Some(1);
        assert!(!inv.success());
        inv.exit_code = None;
        assert!(!inv.success());
    }
}
