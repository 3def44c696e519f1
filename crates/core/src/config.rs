//! Storage configuration shared by the CLI and the engine

use crate::backend::{open_backend, Backend, BackendKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which backend new projects go to, and how to reach it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend for newly initialized projects (default: local)
    pub backend: BackendKind,

    /// Root directory of the local backend (default: `<vervids home>/storage`)
    pub local_root: Option<PathBuf>,

    /// Container backend settings
    pub docker: DockerConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            local_root: None,
            docker: DockerConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Open the backend configured for new projects
    pub fn open_default(&self, default_local_root: &Path) -> Box<dyn Backend> {
        let namespace = match self.backend {
            BackendKind::Local => self
                .local_root
                .clone()
                .unwrap_or_else(|| default_local_root.to_path_buf())
                .display()
                .to_string(),
            BackendKind::Docker => self.docker.volume_name.clone(),
        };
        open_backend(self.backend, &namespace, self)
    }
}

/// Container backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Name of the long-running storage container
    pub container_name: String,

    /// Volume mounted into the container (recorded as the project namespace id)
    pub volume_name: String,

    /// Mount point of the volume inside the container
    pub storage_path: String,

    /// Image used when the container has to be created
    pub image: String,

    /// Oldest supported docker client major version
    pub min_major_version: u32,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            container_name: "vervids-storage".to_string(),
            volume_name: "vervids-data".to_string(),
            storage_path: "/storage/projects".to_string(),
            image: "alpine:latest".to_string(),
            min_major_version: 24,
        }
    }
}
