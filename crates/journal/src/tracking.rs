//! Per-commit asset tracking records
//!
//! Each commit gets an audit record comparing its assets against the
//! immediately preceding commit, keyed by filename.

use crate::version::AssetReference;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Classification of one asset relative to the previous commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatusKind {
    /// Referenced by both commits
    Present,
    /// Referenced only by the current commit
    New,
    /// Referenced only by the previous commit
    Removed,
}

/// Status entry for a single asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStatus {
    pub filename: String,
    /// Backend key of the stored asset
    pub path: String,
    pub extension: String,
    pub size: u64,
    pub status: AssetStatusKind,
    /// Part of the current commit
    pub present: bool,
    /// Part of the previous commit
    pub in_previous: bool,
}

/// Tracking record stored next to a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTracking {
    pub version: u32,
    pub commit_message: String,
    /// RFC 3339 creation time
    pub timestamp: String,
    pub assets: Vec<AssetStatus>,
    /// All entries, including removed ones
    pub total_assets: usize,
    /// Entries carried into the current commit
    pub present_assets: usize,
    /// Entries not carried into the current commit (`total - present`)
    pub missing_assets: usize,
    pub new_assets: usize,
    pub removed_assets: usize,
}

impl AssetTracking {
    /// Number of entries with the given classification
    pub fn count(&self, kind: AssetStatusKind) -> usize {
        self.assets.iter().filter(|a| a.status == kind).count()
    }

    /// Entries with the given classification
    pub fn with_status(&self, kind: AssetStatusKind) -> impl Iterator<Item = &AssetStatus> {
        self.assets.iter().filter(move |a| a.status == kind)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).context("Failed to serialize asset tracking")
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Failed to parse asset tracking")
    }
}

/// Classify the current commit's assets against the previous commit's
///
/// Pass an empty `previous` slice for the first commit.
pub fn diff_assets(
    version: u32,
    message: &str,
    current: &[AssetReference],
    previous: &[AssetReference],
) -> AssetTracking {
    let previous_names: HashSet<&str> = previous.iter().map(|a| a.filename.as_str()).collect();
    let current_names: HashSet<&str> = current.iter().map(|a| a.filename.as_str()).collect();

    let mut assets = Vec::with_capacity(current.len() + previous.len());
    let mut present_assets = 0;
    let mut new_assets = 0;
    let mut removed_assets = 0;

    for asset in current {
        let in_previous = previous_names.contains(asset.filename.as_str());
        let status = if in_previous {
            AssetStatusKind::Present
        } else {
            new_assets += 1;
            AssetStatusKind::New
        };
        present_assets += 1;
        assets.push(status_entry(asset, status, true, in_previous));
    }

    for asset in previous {
        if !current_names.contains(asset.filename.as_str()) {
            removed_assets += 1;
            assets.push(status_entry(asset, AssetStatusKind::Removed, false, true));
        }
    }

    let total_assets = assets.len();

    AssetTracking {
        version,
        commit_message: message.to_string(),
        timestamp: chrono::Local::now().to_rfc3339(),
        assets,
        total_assets,
        present_assets,
        missing_assets: total_assets - present_assets,
        new_assets,
        removed_assets,
    }
}

fn status_entry(
    asset: &AssetReference,
    status: AssetStatusKind,
    present: bool,
    in_previous: bool,
) -> AssetStatus {
    AssetStatus {
        filename: asset.filename.clone(),
        path: asset.backend_key.clone(),
        extension: asset.extension.clone(),
        size: asset.size,
        status,
        present,
        in_previous,
    }
}
