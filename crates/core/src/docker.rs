//! Container backend driven through the docker CLI
//!
//! Objects live inside a long-running container on a named volume mounted at
//! `storage_path`. The container is only reachable through copy-in, copy-out
//! and exec, so every primitive maps onto one `docker` invocation.

use crate::backend::{Backend, BackendError, BackendKind};
use crate::config::DockerConfig;
use crate::store::{is_version_segment, normalize_key};
use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Output};

/// State of the storage container as reported by `docker ps`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerState {
    Missing,
    Stopped,
    Running,
}

/// Backend storing objects inside a docker container volume
#[derive(Debug, Clone)]
pub struct DockerBackend {
    config: DockerConfig,
}

impl DockerBackend {
    pub fn new(config: DockerConfig) -> Self {
        Self { config }
    }

    fn docker(&self, args: &[&str]) -> Result<Output> {
        Command::new("docker")
            .args(args)
            .output()
            .with_context(|| format!("Failed to run 'docker {}'", args.join(" ")))
    }

    fn exec(&self, args: &[&str]) -> Result<String> {
        let mut full = vec!["exec", self.config.container_name.as_str()];
        full.extend_from_slice(args);

        let output = self.docker(&full)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("docker exec {} failed: {}", args.join(" "), stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Absolute path of a key inside the container
    fn container_path(&self, key: &str) -> Result<String> {
        let rel = normalize_key(key).map_err(|e| BackendError::InvalidKey {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(format!(
            "{}/{}",
            self.config.storage_path.trim_end_matches('/'),
            rel.to_string_lossy()
        ))
    }

    fn container_state(&self) -> ContainerState {
        let filter = format!("name=^/{}$", self.config.container_name);
        let listed = |all: bool| -> bool {
            let mut args = vec!["ps"];
            if all {
                args.push("-a");
            }
            args.extend_from_slice(&["--filter", filter.as_str(), "--format", "{{.Names}}"]);
            match self.docker(&args) {
                Ok(out) if out.status.success() => {
                    String::from_utf8_lossy(&out.stdout).trim() == self.config.container_name
                }
                _ => false,
            }
        };

        if listed(false) {
            ContainerState::Running
        } else if listed(true) {
            ContainerState::Stopped
        } else {
            ContainerState::Missing
        }
    }

    fn create_container(&self) -> Result<()> {
        let output = self.docker(&["volume", "create", &self.config.volume_name])?;
        if !output.status.success() {
            return Err(BackendError::Unavailable(format!(
                "failed to create volume {}: {}",
                self.config.volume_name,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }

        let mount = format!("{}:{}", self.config.volume_name, self.config.storage_path);
        let output = self.docker(&[
            "run",
            "-d",
            "--name",
            &self.config.container_name,
            "-v",
            &mount,
            &self.config.image,
            "tail",
            "-f",
            "/dev/null",
        ])?;
        if !output.status.success() {
            return Err(BackendError::Unavailable(format!(
                "failed to create container {}: {}",
                self.config.container_name,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }

        tracing::info!(
            "Created storage container {} on volume {}",
            self.config.container_name,
            self.config.volume_name
        );
        Ok(())
    }
}

impl Backend for DockerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Docker
    }

    fn namespace_id(&self) -> String {
        self.config.volume_name.clone()
    }

    fn ready(&self) -> Result<()> {
        let output = Command::new("docker").arg("--version").output().map_err(|_| {
            BackendError::Unavailable("docker is not installed or not on PATH".to_string())
        })?;
        if !output.status.success() {
            return Err(BackendError::Unavailable("docker --version failed".to_string()).into());
        }

        let version_line = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let major = parse_major_version(&version_line).ok_or_else(|| {
            BackendError::Unavailable(format!("cannot parse docker version from '{}'", version_line))
        })?;
        if major < self.config.min_major_version {
            return Err(BackendError::UnsupportedVersion {
                found: version_line,
                required: format!("{}.0.0", self.config.min_major_version),
            }
            .into());
        }

        let info = self.docker(&["info", "--format", "{{.ServerVersion}}"])?;
        if !info.status.success() {
            return Err(BackendError::Unavailable("docker daemon is not running".to_string()).into());
        }

        match self.container_state() {
            ContainerState::Running => {}
            ContainerState::Stopped => {
                let output = self.docker(&["start", &self.config.container_name])?;
                if !output.status.success() {
                    return Err(BackendError::Unavailable(format!(
                        "failed to start container {}",
                        self.config.container_name
                    ))
                    .into());
                }
                tracing::info!("Started storage container {}", self.config.container_name);
            }
            ContainerState::Missing => self.create_container()?,
        }

        Ok(())
    }

    fn copy_in(&self, local_path: &Path, key: &str) -> Result<()> {
        let dest = self.container_path(key)?;
        if let Some((parent, _)) = dest.rsplit_once('/') {
            self.exec(&["mkdir", "-p", parent])?;
        }

        let target = format!("{}:{}", self.config.container_name, dest);
        let local = local_path.to_string_lossy();
        let output = self.docker(&["cp", local.as_ref(), &target])?;
        if !output.status.success() {
            anyhow::bail!(
                "Failed to copy {} into container: {}",
                local_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        tracing::debug!("Stored {} at {}", local_path.display(), key);
        Ok(())
    }

    fn copy_out(&self, key: &str, local_path: &Path) -> Result<()> {
        let src = format!("{}:{}", self.config.container_name, self.container_path(key)?);

        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let local = local_path.to_string_lossy();
        let output = self.docker(&["cp", &src, local.as_ref()])?;
        if !output.status.success() {
            anyhow::bail!(
                "Failed to copy {} out of container: {}",
                key,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        match self.container_path(key) {
            Ok(path) => self.exec(&["test", "-e", &path]).is_ok(),
            Err(_) => false,
        }
    }

    fn make_namespace(&self, key: &str) -> Result<()> {
        let path = self.container_path(key)?;
        self.exec(&["mkdir", "-p", &path])
            .with_context(|| format!("Failed to create namespace {}", key))?;
        Ok(())
    }

    fn delete_namespace(&self, key: &str) -> Result<()> {
        let path = self.container_path(key)?;
        self.exec(&["rm", "-rf", &path])
            .with_context(|| format!("Failed to delete namespace {}", key))?;
        Ok(())
    }

    fn exec_list(&self, namespace_root: &str) -> Result<Vec<String>> {
        let base = if namespace_root.is_empty() {
            self.config.storage_path.trim_end_matches('/').to_string()
        } else {
            self.container_path(namespace_root)?
        };

        // find exits non-zero when the base does not exist yet
        let listing = match self.exec(&[
            "find", &base, "-mindepth", "2", "-maxdepth", "2", "-type", "d", "-name", "v[0-9][0-9][0-9]",
        ]) {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!("No project namespaces under {}: {}", base, e);
                return Ok(Vec::new());
            }
        };

        Ok(namespaces_from_listing(&self.config.storage_path, &listing))
    }
}

/// Extract the major version from `docker --version` output or a bare version
///
/// Accepts `Docker version 24.0.7, build afdd53b` as well as `24.0.7`.
pub fn parse_major_version(version: &str) -> Option<u32> {
    let token = version
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|t| t.chars().next().map_or(false, |c| c.is_ascii_digit()))?;
    token.split('.').next()?.parse().ok()
}

/// Turn `find` output of version directories into sorted project keys
fn namespaces_from_listing(storage_path: &str, listing: &str) -> Vec<String> {
    let prefix = format!("{}/", storage_path.trim_end_matches('/'));

    let mut namespaces: Vec<String> = listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (parent, last) = line.rsplit_once('/')?;
            if !is_version_segment(last) {
                return None;
            }
            let key = parent.strip_prefix(&prefix)?;
            (!key.is_empty()).then(|| key.to_string())
        })
        .collect();

    namespaces.sort();
    namespaces.dedup();
    namespaces
}
