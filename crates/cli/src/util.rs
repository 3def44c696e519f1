//! Shared utilities for CLI commands

use crate::system_config::{self, SystemConfig};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use vv_journal::{ContextStore, Project, ProjectStore, VersionEngine, VersionError, VersionSummary};

/// A project resolved for a command, with the engine bound to its backend
pub struct ProjectSession {
    pub store: ProjectStore,
    pub project: Project,
    pub engine: VersionEngine,
}

/// Resolve the project a command operates on
///
/// Walks up from the current directory looking for `.vervids/`, then falls
/// back to the selected project in the context record.
pub fn open_project(config: &SystemConfig, context: &ContextStore) -> Result<ProjectSession> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    let store = match ProjectStore::discover(&cwd) {
        Ok(store) => store,
        Err(_) => match context.load()? {
            Some(ctx) => ProjectStore::from_config_path(&ctx.config_path).with_context(|| {
                format!(
                    "Selected project '{}' is gone (run 'vervids use <config>' to pick another)",
                    ctx.project_name
                )
            })?,
            None => return Err(VersionError::NotAProject(cwd).into()),
        },
    };

    let project = store.load()?;
    let engine = VersionEngine::for_project(
        &project,
        &config.storage,
        config.project.engine_options(),
    );

    tracing::debug!("Using project {} at {}", project.project_id, store.project_dir().display());

    Ok(ProjectSession {
        store,
        project,
        engine,
    })
}

/// Load config and context and resolve the current project
pub fn open_current_project() -> Result<(SystemConfig, ContextStore, ProjectSession)> {
    let config = system_config::load()?;
    let context = system_config::context_store()?;
    let session = open_project(&config, &context)?;
    Ok((config, context, session))
}

/// Parse a user-supplied version number
pub fn parse_version_number(raw: &str) -> Result<i64> {
    let trimmed = raw.trim().trim_start_matches(|c: char| c == 'v' || c == 'V');
    trimmed
        .parse::<i64>()
        .with_context(|| format!("Invalid version number: '{}'", raw))
}

/// Format timestamp as relative time ("2 hours ago")
pub fn format_relative_time(ts_ms: u64) -> String {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    let duration = Duration::from_millis(ts_ms);
    let datetime = UNIX_EPOCH + duration;

    if let Ok(elapsed) = SystemTime::now().duration_since(datetime) {
        let seconds = elapsed.as_secs();

        if seconds < 60 {
            format!("{} seconds ago", seconds)
        } else if seconds < 3600 {
            format!("{} minutes ago", seconds / 60)
        } else if seconds < 86400 {
            format!("{} hours ago", seconds / 3600)
        } else if seconds < 604800 {
            format!("{} days ago", seconds / 86400)
        } else {
            format!("{} weeks ago", seconds / 604800)
        }
    } else {
        "in the future".to_string()
    }
}

/// Format timestamp as local absolute time ("2024-01-03 14:30:00")
pub fn format_absolute_time(ts_ms: u64) -> String {
    use chrono::{Local, TimeZone};

    match Local.timestamp_millis_opt(ts_ms as i64).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "unknown time".to_string(),
    }
}

/// Format size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Print a one-line version summary
pub fn display_version_compact(version: &VersionSummary, is_latest: bool) {
    let marker = if is_latest {
        format!(" {}", "(latest)".green())
    } else {
        String::new()
    };

    println!(
        "{} {}{}",
        format!("v{:03}", version.number).yellow(),
        version.message,
        marker
    );
    println!(
        "     {} · {} · {} assets ({})",
        format_relative_time(version.ts_unix_ms).dimmed(),
        format_size(version.size).dimmed(),
        version.asset_count,
        format_size(version.total_size).dimmed()
    );
}
