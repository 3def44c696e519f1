//! Project aggregate and its on-disk store
//!
//! The store is a single JSON record at `<project dir>/.vervids/config.json`
//! holding the project metadata and the full version history. It is rewritten
//! in full on every mutation.

use crate::error::VersionError;
use crate::version::{Version, VersionSummary};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vv_core::store::atomic_write;
use vv_core::BackendKind;

/// Name of the metadata directory next to the project file
pub const META_DIR: &str = ".vervids";

/// Name of the project record inside [`META_DIR`]
pub const CONFIG_FILE: &str = "config.json";

/// A tracked project and its history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project file name (e.g. `intro.aepx`)
    pub name: String,
    /// Absolute path of the most recently committed project file
    pub project_path: PathBuf,
    /// Backend namespace of the project, fixed at initialization
    pub project_id: String,
    /// Timestamp (Unix milliseconds)
    pub created_at_ms: u64,
    pub backend: BackendKind,
    /// Backend root directory or volume name
    pub namespace_id: String,
    pub versions: Vec<Version>,
}

impl Project {
    /// Look up a version by its stored ordinal
    pub fn get_version(&self, number: i64) -> Result<&Version> {
        self.position(number)
            .map(|i| &self.versions[i])
            .ok_or_else(|| VersionError::VersionNotFound(number).into())
    }

    /// Most recent version
    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    /// Ordinal for the next commit
    ///
    /// Equals the version count unless versions were removed, and never
    /// reuses an ordinal still present in history.
    pub fn next_number(&self) -> u32 {
        let count = self.versions.len() as u32;
        let after_highest = self
            .versions
            .iter()
            .map(|v| v.number + 1)
            .max()
            .unwrap_or(0);
        count.max(after_highest)
    }

    pub fn summaries(&self) -> Vec<VersionSummary> {
        self.versions.iter().map(Version::summary).collect()
    }

    /// Remove the version with this stored ordinal, without renumbering
    pub fn remove_version(&mut self, number: i64) -> Result<Version> {
        let index = self
            .position(number)
            .ok_or(VersionError::VersionNotFound(number))?;
        Ok(self.versions.remove(index))
    }

    fn position(&self, number: i64) -> Option<usize> {
        let number = u32::try_from(number).ok()?;
        self.versions.iter().position(|v| v.number == number)
    }
}

/// Location of a project record on disk
#[derive(Debug, Clone)]
pub struct ProjectStore {
    project_dir: PathBuf,
    meta_dir: PathBuf,
}

impl ProjectStore {
    /// Store for the project living in `project_dir` (nothing is touched)
    pub fn at(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            meta_dir: project_dir.join(META_DIR),
        }
    }

    /// Store for a project file, rooted at the file's directory
    pub fn for_project_file(project_file: &Path) -> Self {
        let dir = project_file.parent().unwrap_or_else(|| Path::new("."));
        Self::at(dir)
    }

    /// Store from a path to its `config.json`
    pub fn from_config_path(config_path: &Path) -> Result<Self> {
        let meta_dir = config_path
            .parent()
            .filter(|d| d.file_name().map_or(false, |n| n == META_DIR))
            .ok_or_else(|| VersionError::NotAProject(config_path.to_path_buf()))?;
        let project_dir = meta_dir
            .parent()
            .ok_or_else(|| VersionError::NotAProject(config_path.to_path_buf()))?;
        Self::open(project_dir)
    }

    /// Create the metadata directory
    ///
    /// Fails if a project already exists unless `force` is set, in which case
    /// the existing record is left for the caller to overwrite.
    pub fn init(project_dir: &Path, force: bool) -> Result<Self> {
        let store = Self::at(project_dir);
        if store.exists() && !force {
            return Err(VersionError::AlreadyInitialized(project_dir.to_path_buf()).into());
        }
        fs::create_dir_all(&store.meta_dir)
            .with_context(|| format!("Failed to create {}", store.meta_dir.display()))?;
        Ok(store)
    }

    /// Open an existing store
    pub fn open(project_dir: &Path) -> Result<Self> {
        let store = Self::at(project_dir);
        if !store.exists() {
            return Err(VersionError::NotAProject(project_dir.to_path_buf()).into());
        }
        Ok(store)
    }

    /// Find the nearest project at or above `start`
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = start;
        loop {
            if current.join(META_DIR).join(CONFIG_FILE).is_file() {
                return Ok(Self::at(current));
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return Err(VersionError::NotAProject(start.to_path_buf()).into()),
            }
        }
    }

    pub fn exists(&self) -> bool {
        self.config_path().is_file()
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn meta_dir(&self) -> &Path {
        &self.meta_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.meta_dir.join(CONFIG_FILE)
    }

    pub fn load(&self) -> Result<Project> {
        let path = self.config_path();
        if !path.is_file() {
            return Err(VersionError::NotAProject(self.project_dir.clone()).into());
        }
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let project = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse project record {}", path.display()))?;
        Ok(project)
    }

    /// Rewrite the project record in full
    pub fn save(&self, project: &Project) -> Result<()> {
        let json = serde_json::to_vec_pretty(project).context("Failed to serialize project")?;
        atomic_write(&self.meta_dir, &self.config_path(), &json)
            .with_context(|| format!("Failed to write {}", self.config_path().display()))?;
        tracing::debug!("Saved project record with {} versions", project.versions.len());
        Ok(())
    }

    /// Delete the metadata directory
    pub fn remove(&self) -> Result<()> {
        if self.meta_dir.exists() {
            fs::remove_dir_all(&self.meta_dir)
                .with_context(|| format!("Failed to remove {}", self.meta_dir.display()))?;
        }
        Ok(())
    }
}
