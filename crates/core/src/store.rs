//! Backend key layout, path normalization and atomic file writes
//!
//! Every project lives under a single namespace in the backend:
//! ```text
//! <project-id>/
//!   v000/
//!     <project file>
//!     asset-tracking.json
//!   v001/
//!     ...
//!   assets/
//!     <filename>        (shared pool, one object per distinct filename)
//! ```

use anyhow::Result;
use std::path::{Component, Path, PathBuf};

/// Name of the per-commit tracking record inside a version namespace
pub const TRACKING_FILE: &str = "asset-tracking.json";

/// Name of the project-wide shared asset namespace
pub const SHARED_ASSETS_DIR: &str = "assets";

const MAX_PROJECT_ID_LEN: usize = 100;

/// Namespace holding a single commit: `<project-id>/v%03d`
pub fn version_namespace(project_id: &str, number: u32) -> String {
    join_key(project_id, &format!("v{:03}", number))
}

/// Namespace holding the shared asset pool: `<project-id>/assets`
pub fn shared_assets_namespace(project_id: &str) -> String {
    join_key(project_id, SHARED_ASSETS_DIR)
}

/// Join two key segments with a single `/`
pub fn join_key(namespace: &str, name: &str) -> String {
    let namespace = namespace.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", namespace, name)
    }
}

/// Whether a key segment names a version namespace (`v` followed by three digits)
pub fn is_version_segment(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 4 && bytes[0] == b'v' && bytes[1..].iter().all(u8::is_ascii_digit)
}

/// Derive a backend-safe project id from a project file name
///
/// Takes the file stem and replaces characters that are unsafe in
/// filesystem or container paths with `_`.
pub fn sanitize_project_id(project_file: &Path) -> String {
    let stem = project_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut id = stem
        .replace(' ', "_")
        .replace('/', "_")
        .replace('\\', "_")
        .replace("..", "_");

    for ch in [':', '*', '?', '"', '<', '>', '|'] {
        id = id.replace(ch, "_");
    }

    if id.chars().count() > MAX_PROJECT_ID_LEN {
        id = id.chars().take(MAX_PROJECT_ID_LEN).collect();
    }

    id
}

/// Normalize a backend key
///
/// - Rejects absolute keys and `..` segments
/// - Removes `./` prefix
/// - Converts backslashes to `/`
pub fn normalize_key(key: &str) -> Result<PathBuf> {
    let unified = key.replace('\\', "/");
    let path = Path::new(&unified);

    if path.is_absolute() || unified.starts_with('/') {
        anyhow::bail!("Absolute keys not allowed: {}", key);
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                anyhow::bail!("Key traversal not allowed: {}", key);
            }
            Component::RootDir | Component::Prefix(_) => {
                anyhow::bail!("Absolute keys not allowed: {}", key);
            }
            _ => {}
        }
    }

    let normalized = unified.strip_prefix("./").unwrap_or(&unified);
    if normalized.is_empty() {
        anyhow::bail!("Empty key");
    }

    Ok(PathBuf::from(normalized))
}

/// Lexically clean `.` and `..` segments without touching the filesystem
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` above the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Express `path` relative to `base`, both absolute and already cleaned
///
/// Walks up from `base` with `..` when `path` is not below it.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<_> = path.components().collect();
    let base_parts: Vec<_> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &path_parts[common..] {
        rel.push(part.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        rel
    }
}

/// Atomic write helper
///
/// Writes data to a temporary file, fsyncs it, then renames it to the target path.
pub fn atomic_write(tmp_dir: &Path, target: &Path, data: &[u8]) -> Result<()> {
    use std::fs;
    use std::io::Write;

    fs::create_dir_all(tmp_dir)?;

    let temp_path = tmp_dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));

    let mut temp_file = fs::File::create(&temp_path)?;
    temp_file.write_all(data)?;
    temp_file.sync_all()?;
    drop(temp_file);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::rename(&temp_path, target)?;

    // Fsync parent directory for durability
    if let Some(parent) = target.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

/// Atomic copy helper
///
/// Same pattern as [`atomic_write`] but streams from a source file, so large
/// assets are never held in memory.
pub fn atomic_copy(src: &Path, target: &Path) -> Result<u64> {
    use std::fs;

    let parent = target
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Target has no parent: {}", target.display()))?;
    fs::create_dir_all(parent)?;

    let temp_path = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
    let result = fs::copy(src, &temp_path).and_then(|n| {
        fs::File::open(&temp_path)?.sync_all()?;
        fs::rename(&temp_path, target)?;
        Ok(n)
    });

    let copied = match result {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
    };

    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }

    Ok(copied)
}
