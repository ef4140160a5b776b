//! Reconciliation commands
//!
//! - `write` - Save the observed packages as the desired state
//! - `diff` - Compare the desired state with the host
//! - `apply` - Install and remove packages to match the desired state
//! - `show` - List the observed packages

use anyhow::{Context as AnyhowContext, Result, bail};
use pacmankit::statefile::{self, WriteMode};
use pacmankit::{Client, LocalDatabase};
use reconcile::{
    Diff, Manifest, apply as run_apply, compute_diff_with_options, observed_manifest, plan,
};

use super::Status;
use crate::Context;
use crate::host::{self, HostDatabase, HostPacman};
use crate::lock::StateLock;
use crate::paths;
use crate::render::{self, TerminalProgress};
use crate::ui;

/// Read the observed manifest through a database handle scoped to this call
fn observe(ctx: &Context) -> Result<Manifest> {
    let options = ctx.config.pacman_options(ctx.multilib);
    let db = LocalDatabase::open(&options.db_path).context("Failed to open the pacman database")?;
    let observed = observed_manifest(&HostDatabase::new(&db))?;
    drop(db);
    Ok(observed)
}

fn read_desired(ctx: &Context) -> Result<Manifest> {
    let desired = host::read_desired(&ctx.state_file)?;
    log::debug!(
        "Desired state has {} packages ({})",
        desired.len(),
        ctx.state_file.display()
    );
    Ok(desired)
}

fn diff_host(ctx: &Context) -> Result<Diff> {
    let desired = read_desired(ctx)?;
    let observed = observe(ctx)?;
    Ok(compute_diff_with_options(
        &desired,
        &observed,
        &ctx.config.diff_options(),
    ))
}

fn lock(ctx: &Context, command: &str) -> Result<StateLock> {
    let lock_path = paths::lock_file(&ctx.state_file);
    Ok(StateLock::acquire(&lock_path, &format!("archnix {command}"))?)
}

// ============================================================================
// write
// ============================================================================

pub fn write(ctx: &Context, overwrite: bool) -> Result<Status> {
    let _lock = lock(ctx, "write")?;

    let observed = observe(ctx)?;
    let entries = host::entries_from_manifest(&observed);
    let mode = if overwrite {
        WriteMode::Overwrite
    } else {
        WriteMode::CreateNew
    };

    match statefile::write_file(&ctx.state_file, &entries, mode) {
        Ok(()) => {}
        Err(pacmankit::Error::StateFileExists(path)) => {
            bail!(
                "A state file already exists at {}\nPass --overwrite to replace it",
                path.display()
            );
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to write {}", ctx.state_file.display())
            });
        }
    }

    if !ctx.quiet {
        ui::success(&format!(
            "Saved {} to {}",
            ui::packages(entries.len()),
            ctx.state_file.display()
        ));
    }
    Ok(Status::Success)
}

// ============================================================================
// diff
// ============================================================================

pub fn diff(ctx: &Context, json: bool, exit_code: bool) -> Result<Status> {
    let diff = diff_host(ctx)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&render::diff_json(&diff))?);
    } else {
        render::display_diff(&diff);
    }

    if exit_code && !diff.is_empty() {
        return Ok(Status::Failure);
    }
    Ok(Status::Success)
}

// ============================================================================
// apply
// ============================================================================

pub fn apply(ctx: &Context, dry_run: bool, reinstall_changed: bool) -> Result<Status> {
    let _lock = lock(ctx, "apply")?;

    let diff = diff_host(ctx)?;
    render::display_diff(&diff);

    if diff.is_empty() {
        return Ok(Status::Success);
    }

    let options = ctx.config.apply_options(dry_run, reinstall_changed);
    let mut progress = TerminalProgress::new(ctx.quiet);

    let result = if dry_run {
        println!();
        ui::info("Dry run - pacman will not be invoked");
        println!();
        plan(&diff, &options, &mut progress)
    } else {
        let client = Client::new(ctx.config.pacman_options(ctx.multilib))
            .context("pacman is not usable")?;
        let manager = HostPacman::new(client);
        println!();
        run_apply(&diff, &manager, &options, &mut progress)
    };
    render::display_apply_result(&result);

    if !result.is_success() && ctx.config.apply.fail_on_phase_error {
        return Ok(Status::Failure);
    }
    Ok(Status::Success)
}

// ============================================================================
// show
// ============================================================================

pub fn show(ctx: &Context, json: bool) -> Result<Status> {
    let observed = observe(ctx)?;

    if json {
        print!(
            "{}",
            statefile::write_string(&host::entries_from_manifest(&observed))?
        );
    } else {
        render::display_manifest(&observed);
        if !ctx.quiet {
            println!();
            ui::dim(&format!("{} explicitly installed", ui::packages(observed.len())));
        }
    }
    Ok(Status::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigSource};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn fake_host(root: &Path) -> Context {
        for (name, version, reason) in [
            ("git", "2.45.2-1", "0"),
            ("vim", "9.1.0-1", "0"),
            ("pcre2", "10.43-1", "1"),
        ] {
            let dir = root.join("db/local").join(format!("{name}-{version}"));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(
                dir.join("desc"),
                format!("%NAME%\n{name}\n\n%VERSION%\n{version}\n\n%REASON%\n{reason}\n"),
            )
            .unwrap();
        }

        let mut config = Config::default();
        config.pacman.db_path = root.join("db").display().to_string();

        Context {
            quiet: true,
            multilib: false,
            state_file: root.join("state/packages.json"),
            config,
            config_source: ConfigSource::Defaults(PathBuf::from("/nonexistent/config.toml")),
        }
    }

    #[test]
    fn test_write_snapshots_explicit_packages() {
        let temp = TempDir::new().unwrap();
        let ctx = fake_host(temp.path());

        write(&ctx, false).unwrap();

        let entries = statefile::parse_file(&ctx.state_file).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["git", "vim"]);
    }

    #[test]
    fn test_write_without_overwrite_leaves_file_unchanged() {
        let temp = TempDir::new().unwrap();
        let ctx = fake_host(temp.path());
        std::fs::create_dir_all(ctx.state_file.parent().unwrap()).unwrap();
        std::fs::write(&ctx.state_file, "[{\"packageName\": \"hand-edited\"}]").unwrap();
        let before = std::fs::read(&ctx.state_file).unwrap();

        let err = write(&ctx, false).unwrap_err();

        assert!(err.to_string().contains("--overwrite"));
        assert_eq!(std::fs::read(&ctx.state_file).unwrap(), before);
    }

    #[test]
    fn test_write_with_overwrite_replaces_file() {
        let temp = TempDir::new().unwrap();
        let ctx = fake_host(temp.path());
        std::fs::create_dir_all(ctx.state_file.parent().unwrap()).unwrap();
        std::fs::write(&ctx.state_file, "[]").unwrap();

        write(&ctx, true).unwrap();

        assert_eq!(statefile::parse_file(&ctx.state_file).unwrap().len(), 2);
    }

    #[test]
    fn test_diff_against_fresh_snapshot_is_empty() {
        let temp = TempDir::new().unwrap();
        let ctx = fake_host(temp.path());
        write(&ctx, false).unwrap();

        assert!(diff_host(&ctx).unwrap().is_empty());
        assert_eq!(diff(&ctx, true, true).unwrap(), Status::Success);
    }

    #[test]
    fn test_diff_exit_code_on_drift() {
        let temp = TempDir::new().unwrap();
        let ctx = fake_host(temp.path());
        std::fs::create_dir_all(ctx.state_file.parent().unwrap()).unwrap();
        std::fs::write(
            &ctx.state_file,
            "[{\"packageName\": \"git\"}, {\"packageName\": \"zsh\"}]",
        )
        .unwrap();

        let drift = diff_host(&ctx).unwrap();
        let additions: Vec<_> = drift.sorted_additions().iter().map(|r| r.name.clone()).collect();
        let removals: Vec<_> = drift.sorted_removals().iter().map(|r| r.name.clone()).collect();
        assert_eq!(additions, ["zsh"]);
        assert_eq!(removals, ["vim"]);
        assert!(drift.changes.is_empty());

        assert_eq!(diff(&ctx, true, true).unwrap(), Status::Failure);
        assert_eq!(diff(&ctx, true, false).unwrap(), Status::Success);
    }

    #[test]
    fn test_diff_without_state_file_fails() {
        let temp = TempDir::new().unwrap();
        let ctx = fake_host(temp.path());

        let err = diff(&ctx, false, false).unwrap_err();
        assert!(err.to_string().contains("state file not found"));
    }

    #[test]
    fn test_malformed_state_file_fails_before_apply() {
        let temp = TempDir::new().unwrap();
        let ctx = fake_host(temp.path());
        std::fs::create_dir_all(ctx.state_file.parent().unwrap()).unwrap();
        std::fs::write(
            &ctx.state_file,
            "[{\"packageName\": \"git\"}, {\"packageName\": \"git\"}]",
        )
        .unwrap();

        let err = apply(&ctx, true, false).unwrap_err();
        assert!(err.to_string().contains("duplicate package"));
    }

    fn with_fake_pacman(ctx: &mut Context, root: &Path, binary: &str) {
        let conf = root.join("pacman.conf");
        std::fs::write(&conf, "[options]\n\n[core]\n\n[extra]\n").unwrap();
        ctx.config.pacman.binary = binary.to_string();
        ctx.config.pacman.config = conf.display().to_string();
        std::fs::create_dir_all(ctx.state_file.parent().unwrap()).unwrap();
        std::fs::write(&ctx.state_file, "[{\"packageName\": \"git\"}, {\"packageName\": \"zsh\"}]").unwrap();
    }

    #[test]
    fn test_apply_dry_run_succeeds_without_invoking() {
        let temp = TempDir::new().unwrap();
        let mut ctx = fake_host(temp.path());
        with_fake_pacman(&mut ctx, temp.path(), "false");

        assert_eq!(apply(&ctx, true, false).unwrap(), Status::Success);
    }

    #[test]
    fn test_apply_dry_run_without_pacman() {
        let temp = TempDir::new().unwrap();
        let mut ctx = fake_host(temp.path());
        with_fake_pacman(&mut ctx, temp.path(), "definitely-not-pacman-archnix");
        ctx.config.pacman.config = temp.path().join("missing.conf").display().to_string();

        assert_eq!(apply(&ctx, true, true).unwrap(), Status::Success);
        assert!(apply(&ctx, false, false).is_err());
    }

    #[test]
    fn test_apply_phase_failure_sets_exit_status() {
        let temp = TempDir::new().unwrap();
        let mut ctx = fake_host(temp.path());
        with_fake_pacman(&mut ctx, temp.path(), "false");

        assert_eq!(apply(&ctx, false, false).unwrap(), Status::Failure);

        ctx.config.apply.fail_on_phase_error = false;
        assert_eq!(apply(&ctx, false, false).unwrap(), Status::Success);
    }

    #[test]
    fn test_apply_multilib_requires_repository() {
        let temp = TempDir::new().unwrap();
        let mut ctx = fake_host(temp.path());
        with_fake_pacman(&mut ctx, temp.path(), "true");
        ctx.multilib = true;

        let err = apply(&ctx, false, false).unwrap_err();
        assert!(format!("{err:#}").contains("'multilib' is not enabled"));
    }

    #[test]
    fn test_missing_database_fails() {
        let temp = TempDir::new().unwrap();
        let mut ctx = fake_host(temp.path());
        ctx.config.pacman.db_path = temp.path().join("elsewhere").display().to_string();

        assert!(show(&ctx, false).is_err());
    }
}
