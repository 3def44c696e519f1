//! Vervids Core - storage primitives for versioned creative projects
//!
//! This crate provides the foundational storage layer:
//! - Backend abstraction with local directory and docker container stores
//! - Asset reference extraction from XML project documents
//! - Backend key layout and atomic file helpers
//! - Storage configuration

pub mod backend;
pub mod config;
pub mod docker;
pub mod extract;
pub mod store;

// Re-export main types for convenience
pub use backend::{open_backend, Backend, BackendError, BackendKind, LocalBackend};
pub use config::{DockerConfig, StorageConfig};
pub use docker::DockerBackend;
pub use extract::{extract_assets, ExtractedAsset, Extraction};

/// Common result type used throughout vv-core
pub type Result<T> = anyhow::Result<T>;
