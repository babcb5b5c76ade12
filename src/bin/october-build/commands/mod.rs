//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod flags;
pub mod header;
pub mod init;
pub mod toolchain;
