//! High-level operations.
//!
//! This module contains the implementation of october-build commands.

pub mod october_build;
pub mod october_clean;
pub mod october_flags;
pub mod october_header;
pub mod october_new;

pub use october_build::{
    build, load_workspace, repeated_targets, select_targets, workspace_toolchain_config, Artifact,
    BuildOptions, BuildResult, UnknownTargetError,
};
pub use october_clean::clean;
pub use october_flags::{flags, TargetCommands};
pub use october_header::{write_headers, HeaderOptions};
pub use october_new::{init_project, module_name_for, InitOptions, InitResult};
