//! Record a new version

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use vv_journal::AssetStatusKind;

pub fn run(message: &str, project_file: Option<PathBuf>) -> Result<()> {
    let (_config, _context, mut session) = util::open_current_project()?;

    let project_file = project_file.unwrap_or_else(|| session.project.project_path.clone());

    let version = session
        .engine
        .commit(&session.store, &mut session.project, message, &project_file)?;

    println!(
        "{} Committed {} {}",
        "✓".green(),
        format!("v{:03}", version.number).yellow(),
        version.message
    );
    println!(
        "  Project file: {} ({})",
        project_file.display(),
        util::format_size(version.size)
    );
    println!(
        "  Assets:       {} ({})",
        version.asset_count,
        util::format_size(version.total_size)
    );

    // Tracking is informational; a missing record only hides the breakdown
    if let Ok(tracking) = session
        .engine
        .load_tracking(&session.project, version.number as i64)
    {
        println!(
            "  Changes:      {} new, {} unchanged, {} removed",
            tracking.count(AssetStatusKind::New).to_string().green(),
            tracking.count(AssetStatusKind::Present),
            tracking.count(AssetStatusKind::Removed).to_string().red()
        );
    }

    if version.assets.len() < version.asset_count {
        println!(
            "  {} {} assets could not be stored",
            "!".yellow(),
            version.asset_count - version.assets.len()
        );
    }

    Ok(())
}
