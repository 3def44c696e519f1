//! Drop versions whose stored project file has disappeared

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let (_config, _context, mut session) = util::open_current_project()?;

    println!("{} Checking {} versions...", "→".cyan(), session.project.versions.len());

    let removed = session
        .engine
        .prune_missing(&session.store, &mut session.project)?;

    if removed == 0 {
        println!("  {} All versions are backed by storage", "✓".green());
    } else {
        println!(
            "  {} Pruned {} versions ({} remaining)",
            "✓".green(),
            removed,
            session.project.versions.len()
        );
    }

    Ok(())
}
