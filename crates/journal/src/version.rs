//! Version and asset reference records

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vv_core::ExtractedAsset;

/// One binary dependency captured at a specific commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    /// Absolute source path at commit time
    pub original_path: PathBuf,
    /// Path relative to the project file's directory
    pub relative_path: PathBuf,
    pub filename: String,
    /// Extension with leading dot (`.mp4`)
    pub extension: String,
    pub size: u64,
    /// Where the bytes live in the backend (usually the shared pool)
    pub backend_key: String,
}

impl AssetReference {
    pub fn from_extracted(asset: &ExtractedAsset, backend_key: String) -> Self {
        Self {
            original_path: asset.path.clone(),
            relative_path: asset.relative_path.clone(),
            filename: asset.filename.clone(),
            extension: asset.extension.clone(),
            size: asset.size,
            backend_key,
        }
    }
}

/// An immutable, numbered snapshot of the project file and its assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Ordinal number (stable across removals)
    pub number: u32,
    pub message: String,
    /// Timestamp (Unix milliseconds)
    pub ts_unix_ms: u64,
    /// Size of the project file at commit time
    pub size: u64,
    /// Backend key of the stored project file (empty if never stored)
    pub backend_key: String,
    /// Assets successfully stored for this commit
    pub assets: Vec<AssetReference>,
    /// Number of assets found by the extractor
    pub asset_count: usize,
    /// Total bytes of assets found by the extractor
    pub total_size: u64,
}

/// Summary fields for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSummary {
    pub number: u32,
    pub message: String,
    pub ts_unix_ms: u64,
    pub size: u64,
    pub asset_count: usize,
    pub total_size: u64,
}

impl Version {
    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            number: self.number,
            message: self.message.clone(),
            ts_unix_ms: self.ts_unix_ms,
            size: self.size,
            asset_count: self.asset_count,
            total_size: self.total_size,
        }
    }
}

pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn sample_version() -> Version {
        Version {
            number: 3,
            message: "Color pass".to_string(),
            ts_unix_ms: 1_700_000_000_000,
            size: 2048,
            backend_key: "intro/v003/intro.aepx".to_string(),
            assets: vec![AssetReference {
                original_path: PathBuf::from("/work/intro/footage/a.mp4"),
                relative_path: PathBuf::from("footage/a.mp4"),
                filename: "a.mp4".to_string(),
                extension: ".mp4".to_string(),
                size: 1000,
                backend_key: "intro/assets/a.mp4".to_string(),
            }],
            asset_count: 2,
            total_size: 1500,
        }
    }

    #[test]
    fn test_summary_copies_listing_fields() {
        let version = sample_version();
        let summary = version.summary();

        assert_eq!(summary.number, 3);
        assert_eq!(summary.message, "Color pass");
        assert_eq!(summary.size, 2048);
        assert_eq!(summary.asset_count, 2);
        assert_eq!(summary.total_size, 1500);
    }

    #[test]
    fn test_from_extracted() {
        let extracted = ExtractedAsset {
            path: PathBuf::from("/work/intro/img.png"),
            relative_path: PathBuf::from("img.png"),
            filename: "img.png".to_string(),
            extension: ".png".to_string(),
            size: 12,
        };

        let reference = AssetReference::from_extracted(&extracted, "intro/assets/img.png".to_string());
        assert_eq!(reference.original_path, Path::new("/work/intro/img.png"));
        assert_eq!(reference.filename, "img.png");
        assert_eq!(reference.backend_key, "intro/assets/img.png");
    }

    #[test]
    fn test_timestamp_is_recent() {
        // 2020-01-01 in ms
        assert!(current_timestamp_ms() > 1_577_836_800_000);
    }
}
