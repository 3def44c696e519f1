//! Initialize version tracking for a project file

use crate::system_config;
use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use vv_journal::{ProjectContext, VersionEngine};

pub fn run(project_file: &Path, force: bool) -> Result<()> {
    let config = system_config::load()?;
    let context = system_config::context_store()?;

    println!("{}", "Initializing vervids project...".bold());
    println!();

    let backend = config.open_default_backend()?;
    println!("{} Checking {} storage...", "→".cyan(), backend.kind());

    let engine = VersionEngine::new(backend, config.project.engine_options());
    let (store, project) = engine.initialize(project_file, force)?;

    context
        .save(&ProjectContext {
            project_name: project.name.clone(),
            config_path: store.config_path(),
        })
        .context("Failed to select the new project")?;

    println!("  {} Storage ready ({})", "✓".green(), project.namespace_id.dimmed());

    if let Some(v0) = project.latest() {
        println!(
            "  {} Stored {} ({})",
            "✓".green(),
            project.name,
            util::format_size(v0.size)
        );
        println!(
            "  {} Tracked {} assets ({})",
            "✓".green(),
            v0.asset_count,
            util::format_size(v0.total_size)
        );
        if v0.assets.len() < v0.asset_count {
            println!(
                "  {} {} assets could not be stored (run with RUST_LOG=warn for details)",
                "!".yellow(),
                v0.asset_count - v0.assets.len()
            );
        }
    }

    println!();
    println!("{} Initialized {}", "✓".green(), project.project_id.bold());
    println!("  Metadata: {}", store.meta_dir().display().to_string().dimmed());
    println!();
    println!("{}", "Next: vervids commit \"<message>\"".dimmed());

    Ok(())
}
