//! Read-only queries used by the CLI

use crate::project::{Project, ProjectStore};
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use vv_core::Backend;

/// A project namespace found in a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    /// Last segment of the namespace key
    pub name: String,
    /// Full namespace key below the listing root
    pub key: String,
}

/// List project namespaces known to a backend below `root` ("" for all)
pub fn list_projects(backend: &dyn Backend, root: &str) -> Result<Vec<ProjectInfo>> {
    backend.ready()?;

    let projects = backend
        .exec_list(root)?
        .into_iter()
        .map(|key| ProjectInfo {
            name: key.rsplit('/').next().unwrap_or(&key).to_string(),
            key,
        })
        .collect();

    Ok(projects)
}

/// Load a project from the path of its `config.json`
pub fn load_project(config_path: &Path) -> Result<(ProjectStore, Project)> {
    let store = ProjectStore::from_config_path(config_path)?;
    let project = store.load()?;
    Ok((store, project))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vv_core::LocalBackend;

    #[test]
    fn test_list_projects() -> Result<()> {
        let temp = TempDir::new()?;
        let backend = LocalBackend::new(temp.path().join("storage"));
        backend.ready()?;

        backend.make_namespace("intro/v000")?;
        backend.make_namespace("intro/assets")?;
        backend.make_namespace("clients/acme/v000")?;
        backend.make_namespace("empty/assets")?;

        let projects = list_projects(&backend, "")?;
        assert_eq!(
            projects,
            vec![ProjectInfo {
                name: "intro".to_string(),
                key: "intro".to_string(),
            }]
        );

        let nested = list_projects(&backend, "clients")?;
        assert_eq!(
            nested,
            vec![ProjectInfo {
                name: "acme".to_string(),
                key: "clients/acme".to_string(),
            }]
        );
        Ok(())
    }
}
