//! Show one version in detail

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use vv_journal::AssetStatusKind;

pub fn run(number: &str, show_assets: bool) -> Result<()> {
    let number = util::parse_version_number(number)?;
    let (_config, _context, session) = util::open_current_project()?;
    let version = session.project.get_version(number)?;

    println!(
        "{} {}",
        format!("Version {:03}", version.number).yellow().bold(),
        version.message
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Created:      {} ({})",
        util::format_absolute_time(version.ts_unix_ms),
        util::format_relative_time(version.ts_unix_ms).dimmed()
    );
    println!("Project file: {}", util::format_size(version.size));
    println!("Stored at:    {}", version.backend_key.dimmed());
    println!(
        "Assets:       {} ({})",
        version.asset_count,
        util::format_size(version.total_size)
    );

    if !show_assets {
        println!();
        println!("{}", "Use --assets to list referenced files".dimmed());
        return Ok(());
    }

    println!();
    if version.assets.is_empty() {
        println!("{}", "No stored assets".dimmed());
    }
    for asset in &version.assets {
        println!(
            "  {} {} {}",
            asset.relative_path.display(),
            format!("({})", util::format_size(asset.size)).dimmed(),
            format!("→ {}", asset.backend_key).dimmed()
        );
    }

    match session.engine.load_tracking(&session.project, number) {
        Ok(tracking) => {
            let removed: Vec<_> = tracking.with_status(AssetStatusKind::Removed).collect();
            if !removed.is_empty() {
                println!();
                println!("{}", "Removed since previous version:".bold());
                for asset in removed {
                    println!("  {} {}", "-".red(), asset.filename);
                }
            }
            let added: Vec<_> = tracking.with_status(AssetStatusKind::New).collect();
            if !added.is_empty() {
                println!();
                println!("{}", "New in this version:".bold());
                for asset in added {
                    println!("  {} {}", "+".green(), asset.filename);
                }
            }
        }
        Err(e) => {
            tracing::debug!("No tracking record: {:#}", e);
        }
    }

    Ok(())
}
