//! Centralized path resolution for archnix
//!
//! # Environment Variables
//!
//! - `ARCHNIX_CONFIG_DIR` - Override config directory
//! - `ARCHNIX_STATE_FILE` - Override the state file location
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `ARCHNIX_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/archnix` (if set)
//! 3. `~/.config/archnix`
//!
//! For state_file():
//! 1. `--state-file` flag
//! 2. `ARCHNIX_STATE_FILE` environment variable
//! 3. `state_file` in config.toml
//! 4. `/var/lib/archnix/packages.json`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "ARCHNIX_CONFIG_DIR";

/// Environment variable for state file override
pub const ENV_STATE_FILE: &str = "ARCHNIX_STATE_FILE";

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Name of the advisory lock file next to the state file
pub const LOCK_FILE: &str = ".lock";

/// Get the archnix config directory path
pub fn config_dir() -> Result<PathBuf> {
    resolve_config_dir(|key| std::env::var(key).ok(), dirs::home_dir())
}

/// Get the config file path
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

fn resolve_config_dir<F>(env: F, home: Option<PathBuf>) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    // 1. Check environment variable override
    if let Some(dir) = env(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    // 2. Check XDG_CONFIG_HOME
    if let Some(xdg_config) = env("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        let path = PathBuf::from(xdg_config).join("archnix");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    // 3. Default: ~/.config/archnix
    let home = home.context("Could not determine home directory")?;
    let path = home.join(".config").join("archnix");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the state file path
///
/// `flag` is the `--state-file` argument, `configured` the value from config.toml.
pub fn state_file(flag: Option<&Path>, configured: Option<&str>) -> PathBuf {
    resolve_state_file(flag, std::env::var(ENV_STATE_FILE).ok(), configured)
}

fn resolve_state_file(flag: Option<&Path>, env: Option<String>, configured: Option<&str>) -> PathBuf {
    if let Some(path) = flag {
        log::debug!("Using state file from --state-file: {}", path.display());
        return path.to_path_buf();
    }

    if let Some(value) = env {
        let path = expand(&value);
        log::debug!("Using state file from {}: {}", ENV_STATE_FILE, path.display());
        return path;
    }

    if let Some(value) = configured {
        let path = expand(value);
        log::debug!("Using state file from config: {}", path.display());
        return path;
    }

    let path = PathBuf::from(pacmankit::statefile::DEFAULT_PATH);
    log::debug!("Using default state file: {}", path.display());
    path
}

/// Path of the advisory lock guarding a state file
pub fn lock_file(state_file: &Path) -> PathBuf {
    state_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join(LOCK_FILE)
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
