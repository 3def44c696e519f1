//! Selected-project context
//!
//! A small JSON record naming the project commands operate on when run
//! outside a project directory. Callers load it explicitly and pass it along.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vv_core::store::atomic_write;

/// File name of the context record inside the vervids home directory
pub const CONTEXT_FILE: &str = "current_project.json";

/// The currently selected project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_name: String,
    /// Path of the project's `config.json`
    pub config_path: PathBuf,
}

/// Persists the [`ProjectContext`] record
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(home: &Path) -> Self {
        Self {
            path: home.join(CONTEXT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the selected project, if any
    pub fn load(&self) -> Result<Option<ProjectContext>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let context = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(context))
    }

    pub fn save(&self, context: &ProjectContext) -> Result<()> {
        let json = serde_json::to_vec_pretty(context)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        atomic_write(dir, &self.path, &json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Remove the record (idempotent)
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Clear the record only if it selects the project at `config_path`
    ///
    /// Returns true if the record was cleared.
    pub fn clear_if_selected(&self, config_path: &Path) -> Result<bool> {
        match self.load()? {
            Some(ctx) if ctx.config_path == config_path => {
                self.clear()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
