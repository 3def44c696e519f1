//! Display version history

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(limit: Option<usize>) -> Result<()> {
    let (_config, _context, session) = util::open_current_project()?;
    let project = &session.project;

    println!("{} {}", "Project:".bold(), project.name);
    println!(
        "{} {} ({})",
        "Storage:".bold(),
        project.backend,
        project.namespace_id.dimmed()
    );
    println!();

    if project.versions.is_empty() {
        println!("{}", "No versions yet".dimmed());
        return Ok(());
    }

    let limit = limit.unwrap_or(20);
    let latest = project.latest().map(|v| v.number);

    for summary in project.summaries().iter().rev().take(limit) {
        util::display_version_compact(summary, Some(summary.number) == latest);
    }

    let hidden = project.versions.len().saturating_sub(limit);
    if hidden > 0 {
        println!();
        println!("{}", format!("... {} older versions (use --limit)", hidden).dimmed());
    }

    Ok(())
}
