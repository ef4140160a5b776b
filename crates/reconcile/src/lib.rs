//! # Reconcile
//!
//! Declarative package reconciliation.
//!
//! This crate compares a desired package manifest against the packages
//! observed on a host and turns the difference into package manager calls.
//!
//! ## Core Concepts
//!
//! - **Manifest**: A set of [`PackageRecord`]s keyed by name
//! - **Diff**: Additions, removals, and version changes between two manifests
//! - **Apply**: An install phase followed by a removal phase, each isolated
//!   from the other's failure
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{
//!     ApplyOptions, CommandOutput, Manifest, PackageManager, PackageRecord,
//!     apply_simple, compute_diff,
//! };
//!
//! struct Echo;
//!
//! impl PackageManager for Echo {
//!     fn install(&self, names: &[String]) -> anyhow::Result<CommandOutput> {
//!         println!("install {}", names.join(" "));
//!         Ok(CommandOutput { success: true, ..Default::default() })
//!     }
//!     fn reinstall(&self, names: &[String]) -> anyhow::Result<CommandOutput> {
//!         println!("reinstall {}", names.join(" "));
//!         Ok(CommandOutput { success: true, ..Default::default() })
//!     }
//!     fn remove(&self, names: &[String]) -> anyhow::Result<CommandOutput> {
//!         println!("remove {}", names.join(" "));
//!         Ok(CommandOutput { success: true, ..Default::default() })
//!     }
//! }
//!
//! let desired = Manifest::from_records([PackageRecord::new("git")?])?;
//! let observed = Manifest::from_records([PackageRecord::new("htop")?])?;
//!
//! let diff = compute_diff(&desired, &observed);
//! let result = apply_simple(&diff, &Echo, &ApplyOptions::default());
//! assert!(result.is_success());
//! ```
//!
//! ## Provider Traits
//!
//! Host access goes through traits so the core stays free of I/O:
//!
//! - [`PackageDatabase`]: Lists explicitly installed packages
//! - [`PackageManager`]: Runs install and remove batches
//! - [`ProgressCallback`]: Receives phase progress updates

pub mod apply;
pub mod context;
pub mod diff;
pub mod error;
pub mod types;

// Re-export main types at crate root
pub use apply::{
    ApplyOptions, ApplyResult, ChangePolicy, Phase, PhaseOutcome, apply, apply_simple, plan,
};
pub use context::{NoProgress, PackageDatabase, PackageManager, ProgressCallback};
pub use diff::{DiffOptions, compute_diff, compute_diff_with_options};
pub use error::{Error, Result};
pub use types::{CommandOutput, Diff, DiffSummary, Manifest, PackageRecord, VersionChange};

/// Build the observed manifest from a package database
///
/// Fails if the database cannot be read or reports the same name twice.
pub fn observed_manifest<D: PackageDatabase + ?Sized>(database: &D) -> anyhow::Result<Manifest> {
    let records = database.explicit_packages()?;
    log::debug!("Observed {} explicitly installed packages", records.len());
    Ok(Manifest::from_records(records)?)
}
