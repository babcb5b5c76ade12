//! Workspace: the project root, its manifest, and where outputs go.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::core::manifest::{Manifest, Profile};

/// Manifest file name.
pub const MANIFEST_NAME: &str = "October.toml";

/// Per-project state directory, relative to the root.
pub const PROJECT_DIR_NAME: &str = ".october";

/// Errors locating the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no manifest found: could not find `October.toml` in `{}` or any parent directory", .dir.display())]
    NotFound { dir: PathBuf },
}

/// The manifest path in `dir`, if present.
pub fn find_manifest_in(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(MANIFEST_NAME);
    path.is_file().then_some(path)
}

/// A loaded project.
#[derive(Debug)]
pub struct Workspace {
    manifest: Manifest,
    root: PathBuf,
    target_dir: PathBuf,
    profile: String,
}

impl Workspace {
    pub fn new(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        Ok(Self::from_manifest(manifest))
    }

    /// Workspace over an already-parsed manifest, rooted at its directory.
    pub fn from_manifest(manifest: Manifest) -> Self {
        let root = manifest.manifest_dir.clone();
        let target_dir = root.join(PROJECT_DIR_NAME).join("target");

        Workspace {
            manifest,
            root,
            target_dir,
            profile: "debug".to_string(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profile_name(&self) -> &str {
        &self.profile
    }

    /// Effective settings of the selected profile.
    pub fn profile(&self) -> Result<&Profile> {
        self.manifest.profile(&self.profile)
    }

    /// `<root>/.october`
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR_NAME)
    }

    /// Project `config.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.project_dir().join("config.toml")
    }

    /// Project `toolchain.toml`.
    pub fn toolchain_config_path(&self) -> PathBuf {
        self.project_dir().join("toolchain.toml")
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// `<target-dir>/<profile>`; built modules land here.
    pub fn output_dir(&self) -> PathBuf {
        self.target_dir.join(&self.profile)
    }

    /// Object files for one extension.
    pub fn object_dir(&self, target: &str) -> PathBuf {
        self.output_dir().join("obj").join(target)
    }

    pub fn fingerprint_path(&self) -> PathBuf {
        self.output_dir().join(".fingerprints.json")
    }

    pub fn compile_commands_path(&self) -> PathBuf {
        self.project_dir().join("compile_commands.json")
    }
}
