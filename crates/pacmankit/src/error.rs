//! Error types for pacman and state file operations.
//!
//! Errors are categorized so callers can tell storage and input problems,
//! which abort a run before pacman is ever started, apart from a failed
//! pacman invocation, which is reported for its phase only.

use crate::types::Invocation;
use std::path::PathBuf;
use thiserror::Error;

/// Categories of errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Target not found in any enabled repository
    NotFound,
    /// Operation requires root
    Permission,
    /// Another pacman process holds the database lock
    Locked,
    /// File or package conflict
    Conflict,
    /// Mirror or download failure
    Network,
    /// A required file is missing or pacman.conf does not match
    Storage,
    /// A file exists but its content is malformed
    Malformed,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether errors of this category are raised before any pacman invocation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage | Self::Malformed)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Package not found",
            Self::Permission => "Permission denied",
            Self::Locked => "pacman database is locked",
            Self::Conflict => "Package conflict",
            Self::Network => "Network connectivity issue",
            Self::Storage => "Required file not available",
            Self::Malformed => "Malformed input",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Check the package name or enable the repository that provides it",
            Self::Permission => "Run archnix as root (e.g. with sudo)",
            Self::Locked => "Wait for the other pacman process to finish, or remove a stale db.lck",
            Self::Conflict => "Resolve the conflict by hand, then apply again",
            Self::Network => "Check your mirrorlist and internet connection, then apply again",
            Self::Storage => "Check the path, or run 'archnix write' to create a state file",
            Self::Malformed => "Fix the file by hand or regenerate it with 'archnix write --overwrite'",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while talking to pacman or the state file.
#[derive(Debug, Error)]
pub enum Error {
    /// The pacman local database directory is missing
    #[error("pacman database not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    /// A `desc` entry in the local database could not be parsed
    #[error("invalid package entry {}: {message}", path.display())]
    DescParse {
        /// Path of the offending `desc` file
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// The persisted state file does not exist
    #[error("state file not found: {}", .0.display())]
    StateFileNotFound(PathBuf),

    /// The persisted state file already exists and overwriting was not requested
    #[error("state file already exists: {}", .0.display())]
    StateFileExists(PathBuf),

    /// The persisted state file is not valid JSON of the expected shape
    #[error("invalid state file{}: line {line}: {message}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    StateFileParse {
        /// Path of the file, when parsed from disk
        path: Option<PathBuf>,
        /// Line number where parsing failed (1-indexed)
        line: usize,
        /// Description of the syntax error
        message: String,
    },

    /// The same package name appears twice in a state file
    #[error("duplicate package in state file: {name}")]
    DuplicatePackage {
        /// The repeated name
        name: String,
    },

    /// A sync repository is not enabled in pacman.conf
    #[error("repository '{repo}' is not enabled in {}", config.display())]
    RepositoryNotConfigured {
        /// Requested repository name
        repo: String,
        /// pacman.conf that was inspected
        config: PathBuf,
    },

    /// The pacman executable could not be located
    #[error("pacman not found: {0}")]
    PacmanNotFound(String),

    /// Target not found in the sync databases
    #[error("target not found: {name}")]
    NotFound {
        /// Name reported by pacman
        name: String,
    },

    /// pacman refused to run without root
    #[error("permission denied: {message}")]
    Permission {
        /// Message reported by pacman
        message: String,
    },

    /// Another process holds the pacman database lock
    #[error("pacman database is locked: {}", .0.display())]
    DatabaseLocked(PathBuf),

    /// File or package conflict
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// Download or mirror failure
    #[error("network error: {message}")]
    Network {
        /// Detailed error message
        message: String,
    },

    /// pacman ran and failed for an unrecognized reason, or could not be started
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::DatabaseLocked(_) => ErrorCategory::Locked,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Network { .. } => ErrorCategory::Network,
            Error::DatabaseNotFound(_)
            | Error::StateFileNotFound(_)
            | Error::StateFileExists(_)
            | Error::RepositoryNotConfigured { .. }
            | Error::PacmanNotFound(_)
            | Error::Io(_) => ErrorCategory::Storage,
            Error::DescParse { .. }
            | Error::StateFileParse { .. }
            | Error::DuplicatePackage { .. }
            | Error::Json(_) => ErrorCategory::Malformed,
            Error::CommandFailed { .. } => ErrorCategory::Other,
        }
    }

    /// Whether this error must abort the run before pacman is invoked.
    pub fn is_fatal(&self) -> bool {
        self.category().is_fatal()
    }

    /// Classify a failed invocation.
    ///
    /// pacman prints `error:` lines on stderr, so that stream decides. Details
    /// such as the list of conflicting files land on stdout, which is consulted
    /// when stderr alone does not name a category.
    pub fn from_invocation(invocation: &Invocation, db_lock: &std::path::Path) -> Self {
        let from_stderr = Self::from_pacman_output(&invocation.stderr, db_lock);
        if !matches!(from_stderr, Error::CommandFailed { .. }) {
            return from_stderr;
        }

        let from_stdout = Self::from_pacman_output(&invocation.stdout, db_lock);
        if matches!(from_stdout, Error::CommandFailed { .. }) && !invocation.stderr.trim().is_empty() {
            return from_stderr;
        }
        from_stdout
    }

    /// Create an error from the output of a failed pacman invocation.
    ///
    /// pacman exits 1 for every failure, so the text is all there is to go on.
    pub fn from_pacman_output(output: &str, db_lock: &std::path::Path) -> Self {
        let lower = output.to_lowercase();

        if lower.contains("unable to lock database") {
            return Error::DatabaseLocked(db_lock.to_path_buf());
        }

        if let Some(name) = output
            .lines()
            .find_map(|l| l.trim().strip_prefix("error: target not found:"))
        {
            return Error::NotFound {
                name: name.trim().to_string(),
            };
        }

        if lower.contains("you cannot perform this operation unless you are root")
            || lower.contains("permission denied")
        {
            return Error::Permission {
                message: output.trim().to_string(),
            };
        }

        if lower.contains("conflicting files")
            || lower.contains("conflicting dependencies")
            || lower.contains("are in conflict")
            || lower.contains("exists in filesystem")
            || lower.contains("could not satisfy dependencies")
            || lower.contains("breaks dependency")
        {
            return Error::Conflict {
                message: output.trim().to_string(),
            };
        }

        if lower.contains("failed retrieving file")
            || lower.contains("failed to retrieve some files")
            || lower.contains("could not resolve host")
            || lower.contains("connection timed out")
            || lower.contains("operation too slow")
        {
            return Error::Network {
                message: output.trim().to_string(),
            };
        }

        Error::CommandFailed {
            message: if output.trim().is_empty() {
                "pacman exited with a failure status".to_string()
            } else {
                output.trim().to_string()
            },
        }
    }
}

/// Result type for pacmankit operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const LOCK: &str = "/var/lib/pacman/db.lck";

    fn classify(output: &str) -> Error {
        Error::from_pacman_output(output, Path::new(LOCK))
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify("error: target not found: definitely-not-a-package\n");
        assert!(matches!(&err, Error::NotFound { name } if name == "definitely-not-a-package"));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_classify_lock() {
        let err = classify(
            "error: failed to init transaction (unable to lock database)\nerror: could not lock database: File exists",
        );
        assert!(matches!(&err, Error::DatabaseLocked(p) if p == Path::new(LOCK)));
    }

    #[test]
    fn test_classify_permission() {
        let err = classify("error: you cannot perform this operation unless you are root.");
        assert_eq!(err.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_classify_conflict_and_network() {
        let err = classify("error: failed to commit transaction (conflicting files)\nfoo: /usr/bin/foo exists in filesystem");
        assert_eq!(err.category(), ErrorCategory::Conflict);

        let err = classify("error: failed retrieving file 'git-2.45.tar.zst' from mirror : Could not resolve host");
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_classify_unknown() {
        assert!(matches!(
            classify(""),
            Error::CommandFailed { message } if message == "pacman exited with a failure status"
        ));
        assert_eq!(classify("something odd").category(), ErrorCategory::Other);
    }

    fn failed(stdout: &str, stderr: &str) -> Invocation {
        Invocation {
            args: vec!["-S".into(), "--needed".into(), "--noconfirm".into()],
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(1),
        }
    }

    #[test]
    fn test_invocation_classified_from_stderr() {
        let err = Error::from_invocation(
            &failed("resolving dependencies...\n", "error: target not found: nope\n"),
            Path::new(LOCK),
        );
        assert!(matches!(&err, Error::NotFound { name } if name == "nope"));
    }

    #[test]
    fn test_invocation_details_on_stdout() {
        let err = Error::from_invocation(
            &failed(
                "foo: /usr/bin/foo exists in filesystem\n",
                "error: failed to commit transaction\nErrors occurred, no packages were upgraded.\n",
            ),
            Path::new(LOCK),
        );
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_unclassified_invocation_keeps_stderr_message() {
        let err = Error::from_invocation(
            &failed("resolving dependencies...\n", "error: something unexpected\n"),
            Path::new(LOCK),
        );
        assert!(matches!(&err, Error::CommandFailed { message } if message == "error: something unexpected"));

        let err = Error::from_invocation(&failed("", ""), Path::new(LOCK));
        assert!(matches!(
            &err,
            Error::CommandFailed { message } if message == "pacman exited with a failure status"
        ));
    }

    #[test]
    fn test_fatal_categories() {
        assert!(Error::DatabaseNotFound(PathBuf::from("/var/lib/pacman/local")).is_fatal());
        assert!(Error::DuplicatePackage { name: "git".into() }.is_fatal());
        assert!(!classify("error: target not found: x").is_fatal());
    }

    #[test]
    fn test_state_file_parse_message() {
        let err = Error::StateFileParse {
            path: Some(PathBuf::from("/var/lib/archnix/packages.json")),
            line: 3,
            message: "trailing comma".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid state file /var/lib/archnix/packages.json: line 3: trailing comma"
        );

        let err = Error::StateFileParse {
            path: None,
            line: 1,
            message: "EOF".into(),
        };
        assert_eq!(err.to_string(), "invalid state file: line 1: EOF");
    }

    #[test]
    fn test_repository_message() {
        let err = Error::RepositoryNotConfigured {
            repo: "multilib".into(),
            config: PathBuf::from("/etc/pacman.conf"),
        };
        assert_eq!(
            err.to_string(),
            "repository 'multilib' is not enabled in /etc/pacman.conf"
        );
    }
}
