//! Backend abstraction for pacman operations.
//!
//! The [`Backend`] trait defines the interface for running pacman,
//! allowing for different implementations (real CLI, mock for testing).

pub mod pacman;

use crate::error::Result;
use crate::types::Invocation;

/// Backend trait for pacman operations.
///
/// `Err` is reserved for invocations that never started (missing binary,
/// held database lock). A pacman run that exits non-zero is an `Ok`
/// [`Invocation`] whose [`Invocation::success`] is false.
pub trait Backend: Send + Sync {
    /// Check if pacman can be executed.
    fn is_available(&self) -> bool;

    /// Install every named package in one non-interactive invocation.
    fn install(&self, names: &[String]) -> Result<Invocation>;

    /// Install every named package in one invocation, reinstalling those
    /// that are already up to date.
    fn reinstall(&self, names: &[String]) -> Result<Invocation>;

    /// Remove every named package in one non-interactive invocation.
    fn remove(&self, names: &[String]) -> Result<Invocation>;
}
