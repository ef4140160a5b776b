//! # pacmankit
//!
//! Pure Rust library for pacman package management.
//!
//! This crate provides functionality for:
//! - Reading explicitly installed packages from the pacman local database
//! - Running non-interactive `pacman -S` / `pacman -Rs` batches
//! - Reading and writing archnix state files
//!
//! ## Example
//!
//! ```no_run
//! use pacmankit::{Client, LocalDatabase, PacmanOptions, statefile};
//! use std::path::Path;
//!
//! let options = PacmanOptions::default();
//! let db = LocalDatabase::open(&options.db_path).expect("no pacman database");
//! let client = Client::new(options).expect("pacman not available");
//!
//! // Snapshot what the operator installed on purpose
//! let entries = client.capture_state(&db).expect("failed to read database");
//! statefile::write_file(
//!     Path::new(statefile::DEFAULT_PATH),
//!     &entries,
//!     statefile::WriteMode::CreateNew,
//! )
//! .expect("failed to write state file");
//!
//! // Install a batch
//! let run = client.install(&["git".to_string()]).expect("pacman did not start");
//! if let Some(err) = client.failure(&run) {
//!     eprintln!("{}: {}", err.category().description(), err);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod localdb;
pub mod statefile;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use localdb::LocalDatabase;
pub use types::{InstallReason, InstalledPackage, Invocation, PacmanOptions, StateEntry};

use backend::{Backend, pacman::PacmanBackend};
use std::path::{Path, PathBuf};

/// High-level client for pacman operations.
///
/// The client wraps a backend and turns failed invocations into
/// categorized errors.
pub struct Client {
    backend: Box<dyn Backend>,
    lock_path: PathBuf,
}

impl Client {
    /// Create a new Client with the real pacman backend.
    ///
    /// Returns an error if pacman is not installed or a repository is not enabled.
    pub fn new(options: PacmanOptions) -> Result<Self> {
        let lock_path = options.lock_path();
        let backend = PacmanBackend::new(options)?;
        Ok(Self {
            backend: Box::new(backend),
            lock_path,
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            lock_path: PacmanOptions::default().lock_path(),
        }
    }

    /// Check if pacman is available.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    // =========================================================================
    // Package Operations
    // =========================================================================

    /// Install a batch of packages.
    pub fn install(&self, names: &[String]) -> Result<Invocation> {
        self.backend.install(names)
    }

    /// Install a batch of packages, reinstalling those already up to date.
    pub fn reinstall(&self, names: &[String]) -> Result<Invocation> {
        self.backend.reinstall(names)
    }

    /// Remove a batch of packages and their unneeded dependencies.
    pub fn remove(&self, names: &[String]) -> Result<Invocation> {
        self.backend.remove(names)
    }

    /// Categorize a failed invocation. Returns `None` on success.
    pub fn failure(&self, invocation: &Invocation) -> Option<Error> {
        (!invocation.success())
            .then(|| Error::from_invocation(invocation, &self.lock_path))
    }

    // =========================================================================
    // State File Operations
    // =========================================================================

    /// Build state file entries from the explicitly installed packages.
    pub fn capture_state(&self, db: &LocalDatabase) -> Result<Vec<StateEntry>> {
        Ok(db.explicit()?.iter().map(StateEntry::from).collect())
    }

    /// Parse a state file from disk.
    pub fn parse_state_file(&self, path: &Path) -> Result<Vec<StateEntry>> {
        statefile::parse_file(path)
    }

    /// Write a state file.
    pub fn write_state_file(
        &self,
        path: &Path,
        entries: &[StateEntry],
        mode: statefile::WriteMode,
    ) -> Result<()> {
        statefile::write_file(path, entries, mode)
    }
}
