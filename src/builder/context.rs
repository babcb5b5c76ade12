//! Build context - toolchain, profile and output locations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::builder::toolchain::{detect_toolchain, Toolchain};
use crate::core::manifest::Profile;
use crate::core::target::ExtensionTarget;
use crate::core::Workspace;
use crate::util::config::ToolchainConfig;

/// Everything needed to turn targets into commands.
#[derive(Clone)]
pub struct BuildContext {
    /// Toolchain implementation
    pub toolchain: Arc<dyn Toolchain>,

    /// Effective profile settings
    pub profile: Profile,

    pub profile_name: String,

    /// Directory built modules are written to
    pub output_dir: PathBuf,

    /// Working directory of every toolchain process
    pub workspace_root: PathBuf,

    pub fingerprint_path: PathBuf,

    /// `[toolchain] cflags` from config
    pub cflags: Vec<String>,

    /// `[toolchain] ldflags` from config
    pub ldflags: Vec<String>,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("toolchain", &self.toolchain.platform())
            .field("compiler", &self.toolchain.compiler_path())
            .field("profile", &self.profile)
            .field("profile_name", &self.profile_name)
            .field("output_dir", &self.output_dir)
            .field("workspace_root", &self.workspace_root)
            .field("cflags", &self.cflags)
            .field("ldflags", &self.ldflags)
            .finish()
    }
}

impl BuildContext {
    /// Detect the toolchain and create a context for the workspace's profile.
    pub fn new(ws: &Workspace, config: &ToolchainConfig) -> Result<Self> {
        let toolchain = detect_toolchain(config)?;
        Self::with_toolchain(ws, toolchain, config)
    }

    /// Create a context around an already chosen toolchain.
    pub fn with_toolchain(
        ws: &Workspace,
        toolchain: Arc<dyn Toolchain>,
        config: &ToolchainConfig,
    ) -> Result<Self> {
        let profile = ws.profile()?.clone();

        Ok(BuildContext {
            toolchain,
            profile,
            profile_name: ws.profile_name().to_string(),
            output_dir: ws.output_dir(),
            workspace_root: ws.root().to_path_buf(),
            fingerprint_path: ws.fingerprint_path(),
            cflags: config.toolchain.cflags.clone(),
            ldflags: config.toolchain.ldflags.clone(),
        })
    }

    /// Compiler flags for a target: profile flags, then config flags, then
    /// the target's `extra_compile_args`.
    pub fn compile_flags(&self, target: &ExtensionTarget) -> Vec<String> {
        let mut flags = self.toolchain.profile_flags(&self.profile);
        flags.extend(self.cflags.iter().cloned());
        flags.extend(target.extra_compile_args.iter().cloned());
        flags
    }

    /// Linker flags for a target: config flags, then `extra_link_args`.
    pub fn link_flags(&self, target: &ExtensionTarget) -> Vec<String> {
        let mut flags = self.ldflags.clone();
        flags.extend(target.extra_link_args.iter().cloned());
        flags
    }

    /// Where a target's module is written.
    pub fn module_path(&self, target: &ExtensionTarget) -> PathBuf {
        self.output_dir
            .join(target.output_path(self.toolchain.module_extension()))
    }

    /// Object files for one target.
    pub fn object_dir(&self, target: &ExtensionTarget) -> PathBuf {
        self.output_dir.join("obj").join(&target.name)
    }

    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    pub fn root(&self) -> &Path {
        &self.workspace_root
    }
}
