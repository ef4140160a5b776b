//! Error types for manifest construction.

use thiserror::Error;

/// Errors raised when a manifest is malformed.
///
/// Both variants are fatal: a run must stop before any package manager
/// invocation when one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A package record was given an empty name
    #[error("package name must not be empty")]
    EmptyName,

    /// The same package name appeared twice in one manifest
    #[error("duplicate package in manifest: {name}")]
    DuplicatePackage {
        /// The repeated package name
        name: String,
    },
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;
