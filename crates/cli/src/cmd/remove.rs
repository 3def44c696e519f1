//! Remove a version from history

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(number: &str) -> Result<()> {
    let number = util::parse_version_number(number)?;
    let (_config, _context, mut session) = util::open_current_project()?;

    let removed = session
        .engine
        .remove_version(&session.store, &mut session.project, number)?;

    println!(
        "{} Removed {} {}",
        "✓".green(),
        format!("v{:03}", removed.number).yellow(),
        removed.message
    );
    println!(
        "{}",
        "Stored files are kept; remaining versions keep their numbers".dimmed()
    );

    Ok(())
}
