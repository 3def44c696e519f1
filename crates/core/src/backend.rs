//! Storage backend abstraction and the local directory-tree backend
//!
//! A backend is an opaque key-addressed byte store. Keys are `/`-separated
//! relative strings (see [`crate::store`] for the layout used by projects).

use crate::config::StorageConfig;
use crate::docker::DockerBackend;
use crate::store::{atomic_copy, is_version_segment, normalize_key};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which kind of backend a project is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Directory tree on the local filesystem
    #[default]
    Local,
    /// Long-running container reached through the docker CLI
    Docker,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Docker => write!(f, "docker"),
        }
    }
}

/// Backend failures that callers need to tell apart
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage backend version {found} is not supported (requires {required} or newer)")]
    UnsupportedVersion { found: String, required: String },

    #[error("Invalid storage key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
}

/// Key-addressed byte store used by the versioning engine
pub trait Backend {
    /// Backend discriminator recorded in the project
    fn kind(&self) -> BackendKind;

    /// Backend-specific namespace identifier (root directory or volume name)
    fn namespace_id(&self) -> String;

    /// Readiness/bootstrap check; must succeed before any copy
    fn ready(&self) -> Result<()>;

    /// Copy a local file into the store under `key`
    fn copy_in(&self, local_path: &Path, key: &str) -> Result<()>;

    /// Copy the object at `key` out to a local file
    fn copy_out(&self, key: &str, local_path: &Path) -> Result<()>;

    /// Whether an object or namespace exists at `key`
    fn exists(&self, key: &str) -> bool;

    /// Create a namespace (and its parents) at `key`
    fn make_namespace(&self, key: &str) -> Result<()>;

    /// Delete a namespace and everything under it
    fn delete_namespace(&self, key: &str) -> Result<()>;

    /// Enumerate project namespaces below `namespace_root` ("" for the top level)
    ///
    /// A project namespace is one holding at least one `vNNN` version namespace.
    fn exec_list(&self, namespace_root: &str) -> Result<Vec<String>>;
}

/// Open the backend a project was created with
pub fn open_backend(kind: BackendKind, namespace_id: &str, config: &StorageConfig) -> Box<dyn Backend> {
    match kind {
        BackendKind::Local => Box::new(LocalBackend::new(namespace_id)),
        BackendKind::Docker => {
            let mut docker = config.docker.clone();
            if !namespace_id.is_empty() {
                docker.volume_name = namespace_id.to_string();
            }
            Box::new(DockerBackend::new(docker))
        }
    }
}

/// Backend storing objects as plain files under a root directory
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let rel = normalize_key(key).map_err(|e| BackendError::InvalidKey {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.root.join(rel))
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl Backend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn namespace_id(&self) -> String {
        self.root.display().to_string()
    }

    fn ready(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            BackendError::Unavailable(format!("cannot create {}: {}", self.root.display(), e))
        })?;

        let probe = self.root.join(format!(".write-probe-{}", uuid::Uuid::new_v4()));
        fs::write(&probe, b"").map_err(|e| {
            BackendError::Unavailable(format!("{} is not writable: {}", self.root.display(), e))
        })?;
        let _ = fs::remove_file(&probe);

        Ok(())
    }

    fn copy_in(&self, local_path: &Path, key: &str) -> Result<()> {
        let target = self.resolve(key)?;
        atomic_copy(local_path, &target)
            .with_context(|| format!("Failed to copy {} into {}", local_path.display(), key))?;
        tracing::debug!("Stored {} at {}", local_path.display(), key);
        Ok(())
    }

    fn copy_out(&self, key: &str, local_path: &Path) -> Result<()> {
        let source = self.resolve(key)?;
        if !source.is_file() {
            anyhow::bail!("Object not found: {}", key);
        }

        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(&source, local_path)
            .with_context(|| format!("Failed to copy {} to {}", key, local_path.display()))?;
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.resolve(key).map(|p| p.exists()).unwrap_or(false)
    }

    fn make_namespace(&self, key: &str) -> Result<()> {
        let dir = self.resolve(key)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create namespace {}", key))?;
        Ok(())
    }

    fn delete_namespace(&self, key: &str) -> Result<()> {
        let dir = self.resolve(key)?;
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to delete namespace {}", key))?;
        }
        Ok(())
    }

    fn exec_list(&self, namespace_root: &str) -> Result<Vec<String>> {
        let base = if namespace_root.is_empty() {
            self.root.clone()
        } else {
            self.resolve(namespace_root)?
        };

        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut namespaces: Vec<String> = WalkDir::new(&base)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter(|e| is_version_segment(&e.file_name().to_string_lossy()))
            .filter_map(|e| e.path().parent().and_then(|p| self.key_for(p)))
            .collect();

        namespaces.sort();
        namespaces.dedup();
        Ok(namespaces)
    }
}
