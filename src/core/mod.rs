//! Core data structures.
//!
//! - Extension targets and their validation
//! - The October.toml manifest and build profiles
//! - The workspace (project root and output layout)
//! - Grammar binding names derived from a target

pub mod grammar;
pub mod manifest;
pub mod target;
pub mod workspace;

pub use grammar::GrammarBinding;
pub use manifest::{Manifest, Profile};
pub use target::{ExtensionTarget, MacroDef, TargetError};
pub use workspace::{find_manifest_in, ManifestError, Workspace, MANIFEST_NAME};
