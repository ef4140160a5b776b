//! Apply orchestrator - turns a diff into package manager invocations
//!
//! A run is always two phases in fixed order: install, then removal. The
//! phases are isolated from each other: whatever happens during install,
//! the removal phase still runs, and both outcomes are handed back to the
//! caller. Nothing here retries.

use crate::context::{NoProgress, PackageManager, ProgressCallback};
use crate::types::{CommandOutput, Diff, VersionChange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do with packages whose version differs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangePolicy {
    /// Leave version changes unapplied and hand them back to the operator
    #[default]
    Report,
    /// Add changed packages to the install batch and run it as a reinstall,
    /// so packages already present are not skipped
    Reinstall,
}

/// Options for apply
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Don't invoke the package manager, just report the batches
    pub dry_run: bool,
    /// Handling of version-only differences
    pub change_policy: ChangePolicy,
}

/// One of the two apply phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Install,
    Removal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Removal => write!(f, "removal"),
        }
    }
}

/// Result of a single phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Nothing to do for this phase
    Skipped,
    /// Dry run: the batch that would have been sent
    Planned { names: Vec<String> },
    /// The package manager reported success
    Succeeded { names: Vec<String>, output: String },
    /// The invocation could not run or exited non-zero
    Failed {
        names: Vec<String>,
        error: String,
        output: String,
    },
}

impl PhaseOutcome {
    /// Check if the phase did not fail
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the phase actually invoked the package manager
    pub fn was_invoked(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Packages the phase acted on (or would have)
    pub fn names(&self) -> &[String] {
        match self {
            Self::Skipped => &[],
            Self::Planned { names }
            | Self::Succeeded { names, .. }
            | Self::Failed { names, .. } => names,
        }
    }
}

/// Outcome of an apply run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub install: PhaseOutcome,
    pub removal: PhaseOutcome,
    /// Version changes left for the operator under [`ChangePolicy::Report`]
    pub unapplied_changes: Vec<VersionChange>,
}

impl ApplyResult {
    /// Check if no phase failed
    pub fn is_success(&self) -> bool {
        self.install.is_success() && self.removal.is_success()
    }

    /// Phases that failed, in execution order
    pub fn failed_phases(&self) -> Vec<Phase> {
        let mut failed = Vec::new();
        if !self.install.is_success() {
            failed.push(Phase::Install);
        }
        if !self.removal.is_success() {
            failed.push(Phase::Removal);
        }
        failed
    }

    /// Number of package manager invocations made
    pub fn invocations(&self) -> usize {
        usize::from(self.install.was_invoked()) + usize::from(self.removal.was_invoked())
    }
}

/// Apply a diff through the given package manager
///
/// # Arguments
/// * `diff` - The diff to realize
/// * `manager` - Package manager collaborator
/// * `options` - Dry run and version change policy
/// * `progress` - Progress callback
///
/// # Returns
/// The outcome of both phases; never short-circuits on a phase failure.
pub fn apply<M, P>(
    diff: &Diff,
    manager: &M,
    options: &ApplyOptions,
    progress: &mut P,
) -> ApplyResult
where
    M: PackageManager + ?Sized,
    P: ProgressCallback,
{
    let mut install_batch: Vec<String> = diff.additions.iter().map(|r| r.name.clone()).collect();
    let mut unapplied_changes = Vec::new();
    let mut reinstall = false;

    match options.change_policy {
        ChangePolicy::Reinstall => {
            reinstall = !diff.changes.is_empty();
            install_batch.extend(diff.changes.iter().map(|c| c.name.clone()));
        }
        ChangePolicy::Report => {
            unapplied_changes = diff.sorted_changes().into_iter().cloned().collect();
        }
    }
    install_batch.sort();

    let mut removal_batch: Vec<String> = diff.removals.iter().map(|r| r.name.clone()).collect();
    removal_batch.sort();

    let install = run_phase(Phase::Install, install_batch, options.dry_run, progress, |names| {
        if reinstall {
            manager.reinstall(names)
        } else {
            manager.install(names)
        }
    });
    let removal = run_phase(Phase::Removal, removal_batch, options.dry_run, progress, |names| {
        manager.remove(names)
    });

    ApplyResult {
        install,
        removal,
        unapplied_changes,
    }
}

/// Apply without progress reporting
pub fn apply_simple<M>(diff: &Diff, manager: &M, options: &ApplyOptions) -> ApplyResult
where
    M: PackageManager + ?Sized,
{
    apply(diff, manager, options, &mut NoProgress)
}

/// Report the batches an apply would run, without a package manager
///
/// Equivalent to [`apply`] with `dry_run` set: both phases come back as
/// [`PhaseOutcome::Planned`] or [`PhaseOutcome::Skipped`].
pub fn plan<P>(diff: &Diff, options: &ApplyOptions, progress: &mut P) -> ApplyResult
where
    P: ProgressCallback,
{
    let options = ApplyOptions {
        dry_run: true,
        ..options.clone()
    };
    apply(diff, &Detached, &options, progress)
}

/// Stand-in manager for [`plan`]; a dry run never calls it
struct Detached;

impl PackageManager for Detached {
    fn install(&self, _names: &[String]) -> anyhow::Result<CommandOutput> {
        anyhow::bail!("no package manager attached")
    }

    fn reinstall(&self, _names: &[String]) -> anyhow::Result<CommandOutput> {
        anyhow::bail!("no package manager attached")
    }

    fn remove(&self, _names: &[String]) -> anyhow::Result<CommandOutput> {
        anyhow::bail!("no package manager attached")
    }
}

/// Run one phase and capture its outcome
fn run_phase<P, F>(
    phase: Phase,
    names: Vec<String>,
    dry_run: bool,
    progress: &mut P,
    invoke: F,
) -> PhaseOutcome
where
    P: ProgressCallback,
    F: FnOnce(&[String]) -> anyhow::Result<CommandOutput>,
{
    if names.is_empty() {
        log::info!("{phase} phase: nothing to do");
        let outcome = PhaseOutcome::Skipped;
        progress.on_phase_complete(phase, &outcome);
        return outcome;
    }

    progress.on_phase_start(phase, &names);

    let outcome = if dry_run {
        log::info!("{phase} phase (dry run): {}", names.join(" "));
        PhaseOutcome::Planned { names }
    } else {
        log::info!("{phase} phase: {} package(s)", names.len());
        match invoke(&names) {
            Ok(output) if output.success => PhaseOutcome::Succeeded {
                names,
                output: output.stdout_str(),
            },
            Ok(output) => {
                let stderr = output.stderr_str();
                let error = if stderr.trim().is_empty() {
                    "package manager exited with a failure status".to_string()
                } else {
                    stderr.trim().to_string()
                };
                log::warn!("{phase} phase failed: {error}");
                PhaseOutcome::Failed {
                    names,
                    error,
                    output: output.stdout_str(),
                }
            }
            Err(e) => {
                log::warn!("{phase} phase could not run: {e:#}");
                PhaseOutcome::Failed {
                    names,
                    error: format!("{e:#}"),
                    output: String::new(),
                }
            }
        }
    };

    progress.on_phase_complete(phase, &outcome);
    outcome
}
