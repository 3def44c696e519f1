//! List projects known to the configured storage

use crate::system_config;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;
use vv_core::store::sanitize_project_id;

pub fn run() -> Result<()> {
    let config = system_config::load()?;
    let context = system_config::context_store()?;
    let backend = config.open_default_backend()?;

    let projects = vv_journal::list_projects(backend.as_ref(), "")?;
    let selected = context.load()?;

    println!(
        "{} ({} storage, {})",
        "Projects".bold(),
        backend.kind(),
        backend.namespace_id().dimmed()
    );
    println!();

    if projects.is_empty() {
        println!("{}", "No projects yet".dimmed());
        println!("{}", "Start one with: vervids init <project file>".dimmed());
        return Ok(());
    }

    let selected_id = selected
        .as_ref()
        .map(|ctx| sanitize_project_id(Path::new(&ctx.project_name)));

    for info in &projects {
        if selected_id.as_deref() == Some(info.name.as_str()) {
            println!("{} {}", "*".green(), info.name.green());
        } else {
            println!("  {}", info.name);
        }
    }

    if let Some(ctx) = selected {
        println!();
        println!(
            "{}",
            format!("Selected: {} ({})", ctx.project_name, ctx.config_path.display()).dimmed()
        );
    }

    Ok(())
}
