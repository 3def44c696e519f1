//! Version history and commit engine
//!
//! This crate provides:
//! - Version and asset reference records
//! - Project aggregate and its JSON store
//! - Asset tracking differ
//! - Shared asset pool coordinator
//! - Versioning engine (init, commit, remove, prune, pull, delete)
//! - Selected-project context record

pub mod context;
pub mod engine;
pub mod error;
pub mod project;
pub mod query;
pub mod shared;
pub mod tracking;
pub mod version;

// Re-exports
pub use context::{ContextStore, ProjectContext};
pub use engine::{EngineOptions, PullReport, VersionEngine};
pub use error::VersionError;
pub use project::{Project, ProjectStore};
pub use query::{list_projects, load_project, ProjectInfo};
pub use shared::{SharedAssetPool, StoredAsset};
pub use tracking::{diff_assets, AssetStatus, AssetStatusKind, AssetTracking};
pub use version::{AssetReference, Version, VersionSummary};

/// Result type for journal operations
pub type Result<T> = anyhow::Result<T>;
