//! Select the project used outside of project directories

use crate::system_config;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use vv_core::store::clean_path;
use vv_journal::ProjectContext;

pub fn run(config_path: &Path) -> Result<()> {
    let context = system_config::context_store()?;

    // A project directory is accepted as well as the config file itself
    let config_path = if config_path.is_dir() {
        config_path
            .join(vv_journal::project::META_DIR)
            .join(vv_journal::project::CONFIG_FILE)
    } else {
        config_path.to_path_buf()
    };
    let config_path = if config_path.is_absolute() {
        config_path
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(config_path)
    };
    let config_path = clean_path(&config_path);

    let (store, project) = vv_journal::load_project(&config_path)?;

    context.save(&ProjectContext {
        project_name: project.name.clone(),
        config_path: store.config_path(),
    })?;

    println!(
        "{} Selected {} ({} versions)",
        "✓".green(),
        project.name.bold(),
        project.versions.len()
    );
    println!("  {}", store.config_path().display().to_string().dimmed());

    Ok(())
}
