//! CLI command implementations

pub mod commit;
pub mod config;
pub mod delete;
pub mod init;
pub mod log;
pub mod projects;
pub mod prune;
pub mod pull;
pub mod remove;
pub mod show;
pub mod use_project;
