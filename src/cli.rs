use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "archnix")]
#[command(version)]
#[command(
    about = "Declarative package state for Arch Linux",
    long_about = "Snapshot the explicitly installed pacman packages into a state file, \
                  then diff the host against it or apply it."
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also require the multilib repository
    #[arg(long, global = true)]
    pub multilib: bool,

    /// State file to read and write
    #[arg(long, global = true, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save the explicitly installed packages as the desired state
    #[command(visible_alias = "write-state")]
    Write {
        /// Replace an existing state file
        #[arg(long)]
        overwrite: bool,
    },

    /// Show how the host differs from the desired state
    #[command(visible_alias = "diff-state")]
    Diff {
        /// Print the diff as JSON
        #[arg(long)]
        json: bool,

        /// Exit with status 1 when the host has drifted
        #[arg(long)]
        exit_code: bool,
    },

    /// Install and remove packages until the host matches the desired state
    #[command(visible_alias = "apply-state")]
    Apply {
        /// Show what would run without invoking pacman
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Reinstall packages whose version differs from the state file
        #[arg(long)]
        reinstall_changed: bool,
    },

    /// List the explicitly installed packages
    #[command(visible_alias = "show-state")]
    Show {
        /// Print in state file format
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Command {
    /// Name used in lock metadata and log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Write { .. } => "write",
            Self::Diff { .. } => "diff",
            Self::Apply { .. } => "apply",
            Self::Show { .. } => "show",
            Self::Config => "config",
            Self::Completions { .. } => "completions",
        }
    }
}
