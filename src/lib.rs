//! october-build - builds a tree-sitter grammar into a loadable module
//!
//! This crate provides the library behind the `october-build` binary:
//! manifest loading, target validation, build planning against the host
//! C toolchain, and incremental execution.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use core::{
    grammar::GrammarBinding, manifest::Manifest, target::ExtensionTarget, workspace::Workspace,
};

pub use builder::{BuildPlan, Toolchain};
pub use util::context::GlobalContext;
