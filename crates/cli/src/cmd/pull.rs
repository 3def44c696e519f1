//! Restore a version's project file and assets into a directory

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub fn run(number: &str, out_dir: Option<PathBuf>) -> Result<()> {
    let number = util::parse_version_number(number)?;
    let (_config, _context, session) = util::open_current_project()?;

    let version = session.project.get_version(number)?;
    let out_dir = match out_dir {
        Some(dir) => dir,
        None => std::env::current_dir()
            .context("Failed to get current directory")?
            .join(format!("{}_v{:03}", session.project.project_id, version.number)),
    };

    println!(
        "{} Pulling {} into {}",
        "→".cyan(),
        format!("v{:03}", version.number).yellow(),
        out_dir.display()
    );

    let report = session.engine.pull_version(&session.project, number, &out_dir)?;

    println!("  {} {}", "✓".green(), report.project_file.display());
    println!("  {} {} assets", "✓".green(), report.assets.len());

    if !report.failed.is_empty() {
        println!();
        println!("{}", format!("{} assets could not be restored:", report.failed.len()).yellow());
        for (filename, reason) in &report.failed {
            println!("  {} {} {}", "!".yellow(), filename, reason.dimmed());
        }
    }

    Ok(())
}
