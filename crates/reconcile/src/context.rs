//! Collaborator and callback traits
//!
//! These traits keep the reconciliation core free of any host-specific
//! code: the package database, the package manager process, and the
//! terminal are all supplied by the caller.

use crate::apply::{Phase, PhaseOutcome};
use crate::types::{CommandOutput, PackageRecord};
use anyhow::Result;

/// Source of the observed manifest
///
/// Implementations list packages the operator installed explicitly;
/// packages pulled in only as dependencies must be left out.
pub trait PackageDatabase {
    /// List explicitly installed packages with their versions
    fn explicit_packages(&self) -> Result<Vec<PackageRecord>>;
}

/// Runs package manager install/remove invocations
///
/// Each call receives the whole batch for its phase and must run
/// non-interactively. An `Err` means the process could not be run at all;
/// a process that ran and failed is reported through
/// [`CommandOutput::success`].
pub trait PackageManager {
    /// Install every named package in one invocation
    fn install(&self, names: &[String]) -> Result<CommandOutput>;

    /// Install every named package in one invocation, reinstalling any
    /// that are already present instead of skipping them
    fn reinstall(&self, names: &[String]) -> Result<CommandOutput>;

    /// Remove every named package in one invocation
    fn remove(&self, names: &[String]) -> Result<CommandOutput>;
}

/// Progress callback for apply phases
///
/// Implement this trait to receive progress updates during apply.
pub trait ProgressCallback {
    /// Called before a phase runs, with the batch it will act on
    fn on_phase_start(&mut self, phase: Phase, names: &[String]);

    /// Called when a phase has finished (or was skipped)
    fn on_phase_complete(&mut self, phase: Phase, outcome: &PhaseOutcome);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&mut self, _phase: Phase, _names: &[String]) {}
    fn on_phase_complete(&mut self, _phase: Phase, _outcome: &PhaseOutcome) {}
}
