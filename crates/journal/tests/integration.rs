//! Integration tests for the versioning engine over the local backend

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vv_core::{Backend, BackendKind, LocalBackend};
use vv_journal::{
    diff_assets, AssetStatusKind, EngineOptions, Project, ProjectStore, VersionEngine,
    VersionError,
};

const MIB: u64 = 1024 * 1024;

fn write_sized(path: &Path, len: u64) -> Result<()> {
    let file = fs::File::create(path)?;
    file.set_len(len)?;
    Ok(())
}

fn write_project(path: &Path, refs: &[&str]) -> Result<()> {
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<AfterEffectsProject xmlns=\"http://www.adobe.com/products/aftereffects\">\n",
    );
    for r in refs {
        doc.push_str(&format!(
            "  <Pin><fileReference fullpath=\"{}\" target_is_folder=\"0\"/></Pin>\n",
            r
        ));
    }
    doc.push_str("</AfterEffectsProject>\n");
    fs::write(path, doc)?;
    Ok(())
}

fn local_engine(storage: &Path) -> VersionEngine {
    VersionEngine::new(Box::new(LocalBackend::new(storage)), EngineOptions::default())
}

fn status_of(tracking: &vv_journal::AssetTracking, name: &str) -> Option<AssetStatusKind> {
    tracking
        .assets
        .iter()
        .find(|a| a.filename == name)
        .map(|a| a.status)
}

/// Local backend that refuses to store objects whose key ends with a given name
struct FlakyBackend {
    inner: LocalBackend,
    fail_suffix: String,
}

impl Backend for FlakyBackend {
    fn kind(&self) -> BackendKind {
        self.inner.kind()
    }

    fn namespace_id(&self) -> String {
        self.inner.namespace_id()
    }

    fn ready(&self) -> Result<()> {
        self.inner.ready()
    }

    fn copy_in(&self, local_path: &Path, key: &str) -> Result<()> {
        if key.ends_with(&self.fail_suffix) {
            anyhow::bail!("injected copy failure for {}", key);
        }
        self.inner.copy_in(local_path, key)
    }

    fn copy_out(&self, key: &str, local_path: &Path) -> Result<()> {
        self.inner.copy_out(key, local_path)
    }

    fn exists(&self, key: &str) -> bool {
        self.inner.exists(key)
    }

    fn make_namespace(&self, key: &str) -> Result<()> {
        self.inner.make_namespace(key)
    }

    fn delete_namespace(&self, key: &str) -> Result<()> {
        self.inner.delete_namespace(key)
    }

    fn exec_list(&self, namespace_root: &str) -> Result<Vec<String>> {
        self.inner.exec_list(namespace_root)
    }
}

#[test]
fn test_initialize_with_two_assets() -> Result<()> {
    let temp = TempDir::new()?;
    let work = temp.path().join("work");
    fs::create_dir_all(&work)?;

    write_sized(&work.join("video1.mp4"), 10 * MIB)?;
    write_sized(&work.join("image1.png"), 2 * MIB)?;
    let project_file = work.join("proj.aepx");
    write_project(&project_file, &["video1.mp4", "image1.png"])?;

    let engine = local_engine(&temp.path().join("storage"));
    let (_store, project) = engine.initialize(&project_file, false)?;

    assert_eq!(project.versions.len(), 1);
    let v0 = &project.versions[0];
    assert_eq!(v0.number, 0);
    assert_eq!(v0.asset_count, 2);
    assert_eq!(v0.total_size, 12_582_912);
    assert_eq!(v0.assets.len(), 2);

    // Assets are sorted by absolute path
    let names: Vec<_> = v0.assets.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["image1.png", "video1.mp4"]);
    assert_eq!(v0.assets[0].relative_path, PathBuf::from("image1.png"));
    assert_eq!(v0.assets[0].extension, ".png");

    let tracking = engine.load_tracking(&project, 0)?;
    assert_eq!(tracking.count(AssetStatusKind::New), 2);
    assert_eq!(tracking.count(AssetStatusKind::Present), 0);
    assert_eq!(tracking.removed_assets, 0);

    Ok(())
}

#[test]
fn test_commit_swaps_an_asset() -> Result<()> {
    let temp = TempDir::new()?;
    let work = temp.path().join("work");
    fs::create_dir_all(&work)?;

    write_sized(&work.join("video1.mp4"), 10 * MIB)?;
    write_sized(&work.join("image1.png"), 2 * MIB)?;
    write_sized(&work.join("image2.png"), MIB)?;
    let project_file = work.join("proj.aepx");
    write_project(&project_file, &["video1.mp4", "image1.png"])?;

    let engine = local_engine(&temp.path().join("storage"));
    let (store, mut project) = engine.initialize(&project_file, false)?;

    write_project(&project_file, &["video1.mp4", "image2.png"])?;
    let v1 = engine.commit(&store, &mut project, "Swap stills", &project_file)?;
    assert_eq!(v1.number, 1);
    assert_eq!(v1.asset_count, 2);
    assert_eq!(v1.total_size, 11 * MIB);

    let tracking = engine.load_tracking(&project, 1)?;
    assert_eq!(tracking.commit_message, "Swap stills");
    assert_eq!(status_of(&tracking, "video1.mp4"), Some(AssetStatusKind::Present));
    assert_eq!(status_of(&tracking, "image1.png"), Some(AssetStatusKind::Removed));
    assert_eq!(status_of(&tracking, "image2.png"), Some(AssetStatusKind::New));
    assert_eq!(tracking.new_assets, 1);
    assert_eq!(tracking.removed_assets, 1);

    // Persisted history matches memory
    assert_eq!(store.load()?, project);
    Ok(())
}

#[test]
fn test_ordinals_follow_version_count() -> Result<()> {
    let temp = TempDir::new()?;
    let project_file = temp.path().join("cut.aepx");
    write_project(&project_file, &[])?;

    let engine = local_engine(&temp.path().join("storage"));
    let (store, mut project) = engine.initialize(&project_file, false)?;

    for i in 1..5u32 {
        let before = project.versions.len() as u32;
        let version = engine.commit(&store, &mut project, &format!("pass {}", i), &project_file)?;
        assert_eq!(version.number, before);
        assert!(engine.backend().exists(&format!("cut/v{:03}/cut.aepx", i)));
    }

    Ok(())
}

#[test]
fn test_same_filename_reuses_pooled_asset() -> Result<()> {
    let temp = TempDir::new()?;
    let work = temp.path().join("work");
    let other = work.join("other");
    fs::create_dir_all(&other)?;

    fs::write(work.join("logo.png"), b"original logo")?;
    fs::write(other.join("logo.png"), b"a different file with the same name")?;

    let project_file = work.join("brand.aepx");
    write_project(&project_file, &["logo.png"])?;

    let engine = local_engine(&temp.path().join("storage"));
    let (store, mut project) = engine.initialize(&project_file, false)?;
    let first_key = project.versions[0].assets[0].backend_key.clone();
    assert_eq!(first_key, "brand/assets/logo.png");

    // Filename identity only: the second file is not stored
    write_project(&project_file, &["other/logo.png"])?;
    let v1 = engine.commit(&store, &mut project, "new logo", &project_file)?;
    assert_eq!(v1.assets[0].backend_key, first_key);
    assert_eq!(v1.assets[0].original_path, other.join("logo.png"));

    let out = temp.path().join("pulled");
    let report = engine.pull_version(&project, 1, &out)?;
    assert_eq!(fs::read(out.join("assets").join("logo.png"))?, b"original logo");
    assert!(report.failed.is_empty());

    Ok(())
}

#[test]
fn test_asset_copy_failure_is_not_fatal() -> Result<()> {
    let temp = TempDir::new()?;
    let work = temp.path().join("work");
    fs::create_dir_all(&work)?;

    fs::write(work.join("a.mp4"), vec![1u8; 100])?;
    fs::write(work.join("b.wav"), vec![2u8; 50])?;
    let project_file = work.join("mix.aepx");
    write_project(&project_file, &["a.mp4", "b.wav"])?;

    let backend = FlakyBackend {
        inner: LocalBackend::new(temp.path().join("storage")),
        fail_suffix: "b.wav".to_string(),
    };
    let engine = VersionEngine::new(Box::new(backend), EngineOptions::default());
    let (store, project) = engine.initialize(&project_file, false)?;

    let v0 = &project.versions[0];
    assert_eq!(v0.assets.len(), 1);
    assert_eq!(v0.assets[0].filename, "a.mp4");
    // Counts come from the extractor, not from what was stored
    assert_eq!(v0.asset_count, 2);
    assert_eq!(v0.total_size, 150);
    assert!(!engine.backend().exists("mix/assets/b.wav"));
    assert_eq!(store.load()?.versions.len(), 1);

    Ok(())
}

#[test]
fn test_tracking_write_failure_is_a_warning() -> Result<()> {
    let temp = TempDir::new()?;
    let project_file = temp.path().join("intro.aepx");
    write_project(&project_file, &[])?;

    let backend = FlakyBackend {
        inner: LocalBackend::new(temp.path().join("storage")),
        fail_suffix: "asset-tracking.json".to_string(),
    };
    let engine = VersionEngine::new(Box::new(backend), EngineOptions::default());
    let (_store, project) = engine.initialize(&project_file, false)?;

    assert_eq!(project.versions.len(), 1);
    assert!(engine.load_tracking(&project, 0).is_err());
    Ok(())
}

#[test]
fn test_project_file_copy_failure_aborts_commit() -> Result<()> {
    let temp = TempDir::new()?;
    let project_file = temp.path().join("intro.aepx");
    write_project(&project_file, &[])?;

    let storage = temp.path().join("storage");
    let engine = local_engine(&storage);
    let (store, project) = engine.initialize(&project_file, false)?;

    let flaky = VersionEngine::new(
        Box::new(FlakyBackend {
            inner: LocalBackend::new(&storage),
            fail_suffix: "intro.aepx".to_string(),
        }),
        EngineOptions::default(),
    );
    let mut working = project.clone();
    assert!(flaky.commit(&store, &mut working, "doomed", &project_file).is_err());
    assert_eq!(working, project);
    assert_eq!(store.load()?.versions.len(), 1);
    Ok(())
}

#[test]
fn test_get_version_boundaries() -> Result<()> {
    let temp = TempDir::new()?;
    let project_file = temp.path().join("intro.aepx");
    write_project(&project_file, &[])?;

    let engine = local_engine(&temp.path().join("storage"));
    let (store, project) = engine.initialize(&project_file, false)?;

    for bad in [-1i64, 1, 99] {
        let err = project.get_version(bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VersionError>(),
            Some(VersionError::VersionNotFound(_))
        ));
    }
    assert_eq!(store.load()?, project);
    Ok(())
}

#[test]
fn test_project_record_round_trip() -> Result<()> {
    let temp = TempDir::new()?;
    let work = temp.path().join("work");
    fs::create_dir_all(&work)?;
    fs::write(work.join("a.mp4"), b"a")?;
    fs::write(work.join("b.png"), b"bb")?;
    let project_file = work.join("trip.aepx");
    write_project(&project_file, &["a.mp4", "missing.mov"])?;

    let engine = local_engine(&temp.path().join("storage"));
    let (store, mut project) = engine.initialize(&project_file, false)?;
    write_project(&project_file, &["a.mp4", "b.png"])?;
    engine.commit(&store, &mut project, "two", &project_file)?;
    engine.commit(&store, &mut project, "three", &project_file)?;

    let reloaded: Project = ProjectStore::open(&work)?.load()?;
    assert_eq!(reloaded.versions.len(), 3);
    for (a, b) in reloaded.versions.iter().zip(project.versions.iter()) {
        assert_eq!(a, b);
    }
    assert_eq!(reloaded, project);
    Ok(())
}

#[test]
fn test_discovery_lists_initialized_projects() -> Result<()> {
    let temp = TempDir::new()?;
    let storage = temp.path().join("storage");
    let engine = local_engine(&storage);

    for name in ["beta", "alpha"] {
        let dir = temp.path().join(name);
        fs::create_dir_all(&dir)?;
        let file = dir.join(format!("{}.aepx", name));
        write_project(&file, &[])?;
        engine.initialize(&file, false)?;
    }

    let projects = vv_journal::list_projects(engine.backend(), "")?;
    let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    Ok(())
}

#[test]
fn test_differ_matches_engine_history() -> Result<()> {
    let temp = TempDir::new()?;
    let work = temp.path().join("work");
    fs::create_dir_all(&work)?;
    for name in ["a.wav", "b.wav", "c.wav", "d.wav"] {
        fs::write(work.join(name), name)?;
    }
    let project_file = work.join("song.aepx");
    write_project(&project_file, &["a.wav", "b.wav", "d.wav"])?;

    let engine = local_engine(&temp.path().join("storage"));
    let (store, mut project) = engine.initialize(&project_file, false)?;
    write_project(&project_file, &["a.wav", "b.wav", "c.wav"])?;
    engine.commit(&store, &mut project, "c for d", &project_file)?;

    let recomputed = diff_assets(
        1,
        "c for d",
        &project.versions[1].assets,
        &project.versions[0].assets,
    );
    let stored = engine.load_tracking(&project, 1)?;

    assert_eq!(recomputed.count(AssetStatusKind::Present), 2);
    assert_eq!(stored.count(AssetStatusKind::Present), 2);
    assert_eq!(stored.new_assets, recomputed.new_assets);
    assert_eq!(stored.removed_assets, recomputed.removed_assets);
    assert_eq!(stored.assets, recomputed.assets);
    Ok(())
}
