// Reconciliation commands
pub mod state;

// Configuration display
pub mod config;

use std::process::ExitCode;

/// How a command finished, when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// Drift under `--exit-code`, or a failed apply phase
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => Self::SUCCESS,
            Status::Failure => Self::FAILURE,
        }
    }
}
