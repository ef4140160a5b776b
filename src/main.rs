mod cli;
mod commands;
mod config;
mod host;
mod lock;
mod paths;
mod render;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use commands::Status;
use config::{Config, ConfigSource};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Require the multilib repository in addition to the configured ones
    pub multilib: bool,
    pub state_file: PathBuf,
    pub config: Config,
    pub config_source: ConfigSource,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version go to stdout and are not failures
            let failed = e.use_stderr();
            let _ = e.print();
            return if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(status) => status.into(),
        Err(e) => {
            ui::error(&format!("{e:#}"));
            if let Some(err) = e.chain().find_map(|c| c.downcast_ref::<pacmankit::Error>()) {
                let category = err.category();
                ui::dim_err(&format!("{}: {}", category.description(), category.advice()));
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Status> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "archnix", &mut io::stdout());
        return Ok(Status::Success);
    }

    let (config, config_source) = Config::load()?;
    let state_file = paths::state_file(cli.state_file.as_deref(), config.state_file.as_deref());
    log::info!("archnix {} using {}", cli.command.name(), state_file.display());

    let ctx = Context {
        quiet: cli.quiet,
        multilib: cli.multilib,
        state_file,
        config,
        config_source,
    };

    match cli.command {
        Command::Write { overwrite } => commands::state::write(&ctx, overwrite),
        Command::Diff { json, exit_code } => commands::state::diff(&ctx, json, exit_code),
        Command::Apply {
            dry_run,
            reinstall_changed,
        } => commands::state::apply(&ctx, dry_run, reinstall_changed),
        Command::Show { json } => commands::state::show(&ctx, json),
        Command::Config => commands::config::run(&ctx),
        Command::Completions { .. } => Ok(Status::Success),
    }
}
