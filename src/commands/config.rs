use anyhow::Result;

use super::Status;
use crate::Context;
use crate::config::ConfigSource;
use crate::ui;

pub fn run(ctx: &Context) -> Result<Status> {
    ui::header("Configuration");

    println!();
    match &ctx.config_source {
        ConfigSource::File(path) => ui::kv("Config file", &path.display().to_string()),
        ConfigSource::Defaults(path) => {
            ui::kv("Config file", &format!("{} (not found, using defaults)", path.display()));
        }
    }
    ui::kv("State file", &ctx.state_file.display().to_string());

    let pacman = ctx.config.pacman_options(ctx.multilib);
    ui::kv("Repositories", &pacman.repositories.join(", "));

    ui::section("Effective settings");
    println!();
    print!("{}", ctx.config.to_toml()?);
    Ok(Status::Success)
}
