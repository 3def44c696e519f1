//! Commit/versioning engine
//!
//! Orchestrates extraction, the shared asset pool and the tracking differ
//! against one backend. The project record is the durability boundary: a
//! commit has happened only once the record has been rewritten. Objects
//! copied before a failed save are left behind as orphans.

use crate::error::VersionError;
use crate::project::{Project, ProjectStore};
use crate::shared::SharedAssetPool;
use crate::tracking::{diff_assets, AssetTracking};
use crate::version::{current_timestamp_ms, AssetReference, Version};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use vv_core::store::{
    clean_path, join_key, sanitize_project_id, shared_assets_namespace, version_namespace,
    TRACKING_FILE,
};
use vv_core::{extract_assets, open_backend, Backend, StorageConfig};

/// Message recorded for version 0
pub const INITIAL_MESSAGE: &str = "Initial version";

/// Engine behavior knobs
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Extension (without dot) every project file must have; `None` accepts any
    pub required_extension: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            required_extension: Some("aepx".to_string()),
        }
    }
}

/// Result of restoring a version into a directory
#[derive(Debug, Clone, Default)]
pub struct PullReport {
    /// Restored project file
    pub project_file: PathBuf,
    /// Restored assets
    pub assets: Vec<PathBuf>,
    /// Assets that could not be restored, with the reason
    pub failed: Vec<(String, String)>,
}

/// Drives every history mutation of a project against one backend
pub struct VersionEngine {
    backend: Box<dyn Backend>,
    options: EngineOptions,
}

impl VersionEngine {
    pub fn new(backend: Box<dyn Backend>, options: EngineOptions) -> Self {
        Self { backend, options }
    }

    /// Engine bound to the backend a project was created with
    pub fn for_project(project: &Project, storage: &StorageConfig, options: EngineOptions) -> Self {
        Self::new(
            open_backend(project.backend, &project.namespace_id, storage),
            options,
        )
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Create a project for `project_file` with version 0
    ///
    /// With `force`, an existing project record next to the file is replaced.
    pub fn initialize(&self, project_file: &Path, force: bool) -> Result<(ProjectStore, Project)> {
        let project_file = self.check_project_file(project_file)?;

        let project_id = sanitize_project_id(&project_file);
        if project_id.is_empty() {
            anyhow::bail!(
                "Cannot derive a project id from {}",
                project_file.display()
            );
        }

        let store = ProjectStore::init(
            ProjectStore::for_project_file(&project_file).project_dir(),
            force,
        )?;
        self.backend.ready()?;

        let mut project = Project {
            name: file_name(&project_file),
            project_path: project_file.clone(),
            project_id,
            created_at_ms: current_timestamp_ms(),
            backend: self.backend.kind(),
            namespace_id: self.backend.namespace_id(),
            versions: Vec::new(),
        };

        self.record_version(&store, &mut project, INITIAL_MESSAGE, &project_file)?;

        tracing::info!(
            "Initialized project {} ({} backend, namespace {})",
            project.project_id,
            project.backend,
            project.namespace_id
        );

        Ok((store, project))
    }

    /// Record a new version of `project` from `project_file`
    pub fn commit(
        &self,
        store: &ProjectStore,
        project: &mut Project,
        message: &str,
        project_file: &Path,
    ) -> Result<Version> {
        let project_file = self.check_project_file(project_file)?;
        self.backend.ready()?;
        self.record_version(store, project, message, &project_file)
    }

    /// Remove the version with this stored ordinal and persist
    ///
    /// Backend objects are left in place; remaining versions keep their numbers.
    pub fn remove_version(
        &self,
        store: &ProjectStore,
        project: &mut Project,
        number: i64,
    ) -> Result<Version> {
        let mut updated = project.clone();
        let removed = updated.remove_version(number)?;
        store.save(&updated)?;
        *project = updated;

        tracing::info!("Removed version {} from {}", removed.number, project.project_id);
        Ok(removed)
    }

    /// Drop versions whose stored project file is gone from the backend
    ///
    /// Versions without a recorded key are kept. Returns how many were dropped.
    pub fn prune_missing(&self, store: &ProjectStore, project: &mut Project) -> Result<usize> {
        self.backend.ready()?;

        let mut updated = project.clone();
        updated
            .versions
            .retain(|v| v.backend_key.is_empty() || self.backend.exists(&v.backend_key));

        let removed = project.versions.len() - updated.versions.len();
        if removed > 0 {
            store.save(&updated)?;
            *project = updated;
            tracing::info!("Pruned {} versions from {}", removed, project.project_id);
        }

        Ok(removed)
    }

    /// Tear down the project's backend namespace and its local record
    pub fn delete_project(&self, store: &ProjectStore, project: &Project) -> Result<()> {
        self.backend.ready()?;
        self.backend
            .delete_namespace(&project.project_id)
            .with_context(|| format!("Failed to delete storage for {}", project.project_id))?;
        store.remove()?;

        tracing::info!("Deleted project {}", project.project_id);
        Ok(())
    }

    /// Copy a version's project file and assets into `out_dir`
    ///
    /// The project file lands at `<out_dir>/<name>` and assets at
    /// `<out_dir>/assets/<filename>`. Asset failures are reported, not fatal.
    pub fn pull_version(&self, project: &Project, number: i64, out_dir: &Path) -> Result<PullReport> {
        let version = project.get_version(number)?;
        self.backend.ready()?;

        if version.backend_key.is_empty() {
            anyhow::bail!("Version {} has no stored project file", version.number);
        }

        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;

        let name = version
            .backend_key
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| project.name.clone());

        let mut report = PullReport {
            project_file: out_dir.join(&name),
            ..PullReport::default()
        };

        self.backend
            .copy_out(&version.backend_key, &report.project_file)
            .with_context(|| format!("Failed to restore project file of version {}", version.number))?;

        let assets_dir = out_dir.join("assets");
        for asset in &version.assets {
            let target = assets_dir.join(&asset.filename);
            match self.backend.copy_out(&asset.backend_key, &target) {
                Ok(()) => report.assets.push(target),
                Err(e) => {
                    tracing::warn!("Failed to restore asset {}: {:#}", asset.filename, e);
                    report.failed.push((asset.filename.clone(), format!("{:#}", e)));
                }
            }
        }

        Ok(report)
    }

    /// Read back the tracking record stored with a version
    pub fn load_tracking(&self, project: &Project, number: i64) -> Result<AssetTracking> {
        let version = project.get_version(number)?;
        self.backend.ready()?;

        let key = join_key(
            &version_namespace(&project.project_id, version.number),
            TRACKING_FILE,
        );

        let temp = tempfile::tempdir().context("Failed to create temp directory")?;
        let local = temp.path().join(TRACKING_FILE);
        self.backend
            .copy_out(&key, &local)
            .with_context(|| format!("No tracking record for version {}", version.number))?;

        let bytes = fs::read(&local)?;
        AssetTracking::from_json(&bytes)
    }

    fn record_version(
        &self,
        store: &ProjectStore,
        project: &mut Project,
        message: &str,
        project_file: &Path,
    ) -> Result<Version> {
        let number = project.next_number();

        let extraction = extract_assets(project_file)?;
        for missing in &extraction.missing {
            tracing::warn!("Referenced asset not found: {}", missing.display());
        }

        let size = fs::metadata(project_file)
            .with_context(|| format!("Failed to stat {}", project_file.display()))?
            .len();

        let namespace = version_namespace(&project.project_id, number);
        self.backend.make_namespace(&namespace)?;

        let backend_key = join_key(&namespace, &file_name(project_file));
        self.backend
            .copy_in(project_file, &backend_key)
            .context("Failed to store project file")?;

        self.backend
            .make_namespace(&shared_assets_namespace(&project.project_id))?;

        let mut pool = SharedAssetPool::new(self.backend.as_ref(), &project.project_id, &project.versions);
        let stored = pool.store_all(&extraction.assets);
        let copied = stored.iter().filter(|s| s.newly_copied).count();
        let reused = stored.len() - copied;
        let assets: Vec<AssetReference> = stored.into_iter().map(|s| s.reference).collect();

        let previous = project.latest().map(|v| v.assets.as_slice()).unwrap_or(&[]);
        let tracking = diff_assets(number, message, &assets, previous);

        let version = Version {
            number,
            message: message.to_string(),
            ts_unix_ms: current_timestamp_ms(),
            size,
            backend_key,
            assets,
            asset_count: extraction.assets.len(),
            total_size: extraction.total_size,
        };

        if let Err(e) = self.save_tracking(&namespace, &tracking) {
            tracing::warn!("Failed to save asset tracking for version {}: {:#}", number, e);
        }

        let mut updated = project.clone();
        updated.versions.push(version.clone());
        updated.project_path = project_file.to_path_buf();
        store.save(&updated).context("Failed to save project record")?;
        *project = updated;

        tracing::info!(
            "Committed version {} of {} ({} assets copied, {} reused, {} missing)",
            number,
            project.project_id,
            copied,
            reused,
            extraction.missing.len()
        );

        Ok(version)
    }

    fn save_tracking(&self, namespace: &str, tracking: &AssetTracking) -> Result<()> {
        let json = tracking.to_json()?;

        let mut temp = tempfile::NamedTempFile::new().context("Failed to create temp file")?;
        temp.write_all(&json)?;
        temp.flush()?;

        self.backend
            .copy_in(temp.path(), &join_key(namespace, TRACKING_FILE))
    }

    /// Absolute path of an existing project file with the required extension
    fn check_project_file(&self, project_file: &Path) -> Result<PathBuf> {
        let absolute = if project_file.is_absolute() {
            clean_path(project_file)
        } else {
            clean_path(
                &std::env::current_dir()
                    .context("Failed to get current directory")?
                    .join(project_file),
            )
        };

        if !absolute.is_file() {
            return Err(VersionError::FileNotFound(absolute).into());
        }

        if let Some(expected) = &self.options.required_extension {
            let matches = absolute
                .extension()
                .map_or(false, |e| e.to_string_lossy().eq_ignore_ascii_case(expected));
            if !matches {
                return Err(VersionError::WrongExtension {
                    path: absolute,
                    expected: expected.clone(),
                }
                .into());
            }
        }

        Ok(absolute)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
