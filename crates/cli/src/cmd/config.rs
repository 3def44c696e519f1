//! Show system configuration

use crate::system_config;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(show_path: bool, show_effective: bool) -> Result<()> {
    if show_path {
        match system_config::config_file_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine config directory"),
        }
        return Ok(());
    }

    if show_effective {
        let config = system_config::load()?;
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(path) = system_config::config_file_path() {
        let state = if path.exists() { "exists" } else { "not created" };
        println!("{}", format!("# {} ({})", path.display(), state).dimmed());
    }
    print!("{}", system_config::example_config());

    Ok(())
}
