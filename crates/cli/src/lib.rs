//! vervids CLI library - exports modules for testing

pub mod cmd;
pub mod system_config;
pub mod util;
