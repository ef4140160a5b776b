//! archnix configuration file
//!
//! An optional `config.toml` in the config directory. Every key has a
//! default, so a missing file or an empty one behaves the same.

use anyhow::{Context, Result};
use pacmankit::PacmanOptions;
use reconcile::{ApplyOptions, ChangePolicy, DiffOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Location of the persisted manifest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<String>,
    pub pacman: PacmanConfig,
    pub diff: DiffConfig,
    pub apply: ApplyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacmanConfig {
    pub binary: String,
    pub db_path: String,
    pub config: String,
    pub repositories: Vec<String>,
}

impl Default for PacmanConfig {
    fn default() -> Self {
        let defaults = PacmanOptions::default();
        Self {
            binary: defaults.binary,
            db_path: defaults.db_path.display().to_string(),
            config: defaults.config.display().to_string(),
            repositories: defaults.repositories,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Report a version known on only one side as a change
    pub one_sided_version_is_change: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplyConfig {
    pub change_policy: ChangePolicy,
    /// Exit non-zero when an apply phase fails
    pub fail_on_phase_error: bool,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            change_policy: ChangePolicy::Report,
            fail_on_phase_error: true,
        }
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file at this path; defaults in effect
    Defaults(PathBuf),
}

impl Config {
    /// Load the config file from the config directory
    pub fn load() -> Result<(Self, ConfigSource)> {
        let path = paths::config_file()?;
        Self::load_from(&path)
    }

    /// Load a config file, falling back to defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<(Self, ConfigSource)> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok((Self::default(), ConfigSource::Defaults(path.to_path_buf())));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// pacman settings, with multilib added on request
    pub fn pacman_options(&self, multilib: bool) -> PacmanOptions {
        let options = PacmanOptions {
            binary: self.pacman.binary.clone(),
            db_path: paths::expand(&self.pacman.db_path),
            config: paths::expand(&self.pacman.config),
            repositories: self.pacman.repositories.clone(),
        };
        if multilib {
            options.with_multilib()
        } else {
            options
        }
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            one_sided_version_is_change: self.diff.one_sided_version_is_change,
        }
    }

    /// Apply settings; `reinstall_changed` overrides the configured policy
    pub fn apply_options(&self, dry_run: bool, reinstall_changed: bool) -> ApplyOptions {
        ApplyOptions {
            dry_run,
            change_policy: if reinstall_changed {
                ChangePolicy::Reinstall
            } else {
                self.apply.change_policy
            },
        }
    }
}
