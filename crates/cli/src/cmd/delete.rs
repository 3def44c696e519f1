//! Delete a project's stored versions and local metadata

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::io::Write;

pub fn run(yes: bool) -> Result<()> {
    let (_config, context, session) = util::open_current_project()?;
    let project = &session.project;

    if !yes {
        println!("{}", "Delete Project".bold());
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("Project:  {}", project.name);
        println!("Versions: {}", project.versions.len());
        println!("Storage:  {} ({})", project.backend, project.namespace_id);
        println!();
        println!(
            "{}",
            "Warning: This removes every stored version and asset!".red().bold()
        );
        println!();

        print!("Continue? [y/N] ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Delete cancelled".yellow());
            return Ok(());
        }
    }

    session.engine.delete_project(&session.store, project)?;

    if context.clear_if_selected(&session.store.config_path())? {
        tracing::debug!("Cleared selected project");
    }

    println!("{} Deleted {}", "✓".green(), project.project_id.bold());
    println!(
        "{}",
        format!("The project file {} was not touched", project.project_path.display()).dimmed()
    );

    Ok(())
}
