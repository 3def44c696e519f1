//! Precondition errors surfaced to callers

use std::path::PathBuf;

/// Failures detected before any side effect is performed
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("Not a vervids project: {0} (run 'vervids init <file>' first)")]
    NotAProject(PathBuf),

    #[error("Project file does not exist: {0}")]
    FileNotFound(PathBuf),

    #[error("Project file must have a .{expected} extension: {path}")]
    WrongExtension { path: PathBuf, expected: String },

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Version {0} not found")]
    VersionNotFound(i64),
}
