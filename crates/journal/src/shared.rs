//! Shared asset pool coordinator
//!
//! Assets are stored once per distinct filename under `<project-id>/assets/`
//! and reused by every later commit that references a file with the same
//! name. Identity is the filename alone; contents are not compared.

use crate::version::{AssetReference, Version};
use anyhow::Result;
use std::collections::HashMap;
use vv_core::store::{join_key, shared_assets_namespace};
use vv_core::{Backend, ExtractedAsset};

/// Outcome of storing one asset
#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub reference: AssetReference,
    /// Bytes were copied for this commit rather than reused
    pub newly_copied: bool,
}

/// Decides per asset whether to copy into the pool or reuse an existing object
pub struct SharedAssetPool<'a> {
    backend: &'a dyn Backend,
    namespace: String,
    known: HashMap<String, String>,
}

impl<'a> SharedAssetPool<'a> {
    /// Build the pool, reconstructing filename -> key from prior history
    pub fn new(backend: &'a dyn Backend, project_id: &str, history: &[Version]) -> Self {
        let mut known = HashMap::new();
        for version in history {
            for asset in &version.assets {
                known.insert(asset.filename.clone(), asset.backend_key.clone());
            }
        }

        Self {
            backend,
            namespace: shared_assets_namespace(project_id),
            known,
        }
    }

    /// Key in the shared namespace for a filename
    pub fn shared_key(&self, filename: &str) -> String {
        join_key(&self.namespace, filename)
    }

    /// Store a single asset, or reuse the object already pooled under its name
    pub fn store(&mut self, asset: &ExtractedAsset) -> Result<StoredAsset> {
        if asset.filename.is_empty() {
            anyhow::bail!("Asset path has no file name: {}", asset.path.display());
        }

        let shared_key = self.shared_key(&asset.filename);

        if self.backend.exists(&shared_key) {
            let key = self
                .known
                .get(&asset.filename)
                .cloned()
                .unwrap_or(shared_key);
            tracing::debug!("Reusing pooled asset {} at {}", asset.filename, key);
            return Ok(StoredAsset {
                reference: AssetReference::from_extracted(asset, key),
                newly_copied: false,
            });
        }

        self.backend.copy_in(&asset.path, &shared_key)?;
        self.known.insert(asset.filename.clone(), shared_key.clone());
        tracing::debug!("Copied new asset {} to {}", asset.filename, shared_key);

        Ok(StoredAsset {
            reference: AssetReference::from_extracted(asset, shared_key),
            newly_copied: true,
        })
    }

    /// Store every asset, dropping the ones that fail
    pub fn store_all(&mut self, assets: &[ExtractedAsset]) -> Vec<StoredAsset> {
        let mut stored = Vec::with_capacity(assets.len());
        for asset in assets {
            match self.store(asset) {
                Ok(s) => stored.push(s),
                Err(e) => {
                    tracing::warn!("Skipping asset {}: {:#}", asset.path.display(), e);
                }
            }
        }
        stored
    }
}
