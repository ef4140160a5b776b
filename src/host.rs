//! Host collaborators for the reconciliation core
//!
//! Wraps the pacman local database and the pacman client behind the
//! `reconcile` traits, and converts between state file entries and
//! manifests.

use anyhow::{Context, Result};
use pacmankit::{Client, LocalDatabase, StateEntry};
use reconcile::{CommandOutput, Manifest, PackageDatabase, PackageManager, PackageRecord};
use std::path::Path;

/// Explicitly installed packages from the local database
pub struct HostDatabase<'a> {
    db: &'a LocalDatabase,
}

impl<'a> HostDatabase<'a> {
    pub fn new(db: &'a LocalDatabase) -> Self {
        Self { db }
    }
}

impl PackageDatabase for HostDatabase<'_> {
    fn explicit_packages(&self) -> Result<Vec<PackageRecord>> {
        let packages = self
            .db
            .explicit()
            .with_context(|| format!("Failed to read {}", self.db.path().display()))?;
        packages
            .into_iter()
            .map(|p| PackageRecord::versioned(p.name, p.version).map_err(anyhow::Error::from))
            .collect()
    }
}

/// Runs install/remove batches through pacman
pub struct HostPacman {
    client: Client,
}

impl HostPacman {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn convert(&self, invocation: &pacmankit::Invocation) -> CommandOutput {
        let stderr = self
            .client
            .failure(invocation)
            .map(|err| {
                format!(
                    "{err} ({}: {})",
                    err.category().description(),
                    err.category().advice()
                )
            })
            .unwrap_or_default();

        CommandOutput {
            stdout: invocation.stdout.clone().into_bytes(),
            stderr: stderr.into_bytes(),
            success: invocation.success(),
        }
    }
}

impl PackageManager for HostPacman {
    fn install(&self, names: &[String]) -> Result<CommandOutput> {
        let invocation = self.client.install(names)?;
        Ok(self.convert(&invocation))
    }

    fn reinstall(&self, names: &[String]) -> Result<CommandOutput> {
        let invocation = self.client.reinstall(names)?;
        Ok(self.convert(&invocation))
    }

    fn remove(&self, names: &[String]) -> Result<CommandOutput> {
        let invocation = self.client.remove(names)?;
        Ok(self.convert(&invocation))
    }
}

/// Read the desired manifest from a state file
pub fn read_desired(path: &Path) -> Result<Manifest> {
    let entries = pacmankit::statefile::parse_file(path)?;
    manifest_from_entries(entries)
        .with_context(|| format!("Invalid state file {}", path.display()))
}

/// Build a manifest from state file entries
pub fn manifest_from_entries(entries: Vec<StateEntry>) -> Result<Manifest> {
    let records = entries
        .into_iter()
        .map(|e| -> reconcile::Result<PackageRecord> {
            let record = PackageRecord::new(e.name)?;
            Ok(match e.version {
                Some(v) => record.with_version(v),
                None => record,
            })
        })
        .collect::<reconcile::Result<Vec<_>>>()?;
    Ok(Manifest::from_records(records)?)
}

/// State file entries for a manifest, sorted by name
pub fn entries_from_manifest(manifest: &Manifest) -> Vec<StateEntry> {
    manifest
        .sorted()
        .into_iter()
        .map(|r| StateEntry::new(&r.name, r.version.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacmankit::backend::Backend;
    use pacmankit::Invocation;

    struct Canned {
        stdout: &'static str,
        stderr: &'static str,
        code: i32,
    }

    impl Backend for Canned {
        fn is_available(&self) -> bool {
            true
        }

        fn install(&self, names: &[String]) -> pacmankit::Result<Invocation> {
            Ok(Invocation {
                args: names.to_vec(),
                stdout: self.stdout.to_string(),
                stderr: self.stderr.to_string(),
                exit_code: Some(self.code),
            })
        }

        fn reinstall(&self, names: &[String]) -> pacmankit::Result<Invocation> {
            let mut args = vec!["--reinstall".to_string()];
            args.extend_from_slice(names);
            Ok(Invocation {
                stdout: args.join(" "),
                args,
                exit_code: Some(0),
                ..Default::default()
            })
        }

        fn remove(&self, _names: &[String]) -> pacmankit::Result<Invocation> {
            Err(pacmankit::Error::DatabaseLocked("/var/lib/pacman/db.lck".into()))
        }
    }

    #[test]
    fn test_failed_install_carries_category() {
        let pacman = HostPacman::new(Client::with_backend(Box::new(Canned {
            stdout: "resolving dependencies...\n",
            stderr: "error: target not found: nope\n",
            code: 1,
        })));

        let output = pacman.install(&["nope".to_string()]).unwrap();
        assert!(!output.success);
        assert_eq!(output.stdout_str(), "resolving dependencies...\n");
        assert!(output.stderr_str().starts_with("target not found: nope (Package not found"));
    }

    #[test]
    fn test_successful_install_has_no_error_text() {
        let pacman = HostPacman::new(Client::with_backend(Box::new(Canned {
            stdout: "there is nothing to do\n",
            stderr: "",
            code: 0,
        })));

        let output = pacman.install(&["git".to_string()]).unwrap();
        assert!(output.success);
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn test_invocation_that_never_ran_is_an_error() {
        let pacman = HostPacman::new(Client::with_backend(Box::new(Canned {
            stdout: "",
            stderr: "",
            code: 0,
        })));

        let err = pacman.remove(&["htop".to_string()]).unwrap_err();
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_reinstall_uses_reinstall_invocation() {
        let pacman = HostPacman::new(Client::with_backend(Box::new(Canned {
            stdout: "",
            stderr: "",
            code: 0,
        })));

        let output = pacman.reinstall(&["curl".to_string()]).unwrap();
        assert!(output.success);
        assert_eq!(output.stdout_str(), "--reinstall curl");
    }

    #[test]
    fn test_manifest_entries_conversion() {
        let manifest = manifest_from_entries(vec![
            StateEntry::new("vim", Some("9.1.0-1".into())),
            StateEntry::new("base", None),
        ])
        .unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(
            entries_from_manifest(&manifest),
            [
                StateEntry::new("base", None),
                StateEntry::new("vim", Some("9.1.0-1".into())),
            ]
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = manifest_from_entries(vec![StateEntry::new("  ", None)]).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }
}
