//! Configuration files.
//!
//! Two files are read, each from a global and a project location:
//!
//! - `config.toml`: build defaults (`[build]`)
//! - `toolchain.toml`: compiler overrides (`[toolchain]`)
//!
//! Project files live in `<project>/.october/` and take precedence over the
//! global ones.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Build defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub build: BuildConfig,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Parallel compile jobs (None = one per core)
    pub jobs: Option<usize>,

    /// Always write compile_commands.json
    pub emit_compile_commands: bool,

    /// Default profile when `--release` is not given
    pub profile: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load, falling back to defaults with a warning when the file is broken.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("ignoring {}: {:#}", path.display(), e);
            Self::default()
        })
    }

    /// Merge `other` into `self`; set values in `other` win.
    pub fn merge(&mut self, other: Config) {
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.emit_compile_commands {
            self.build.emit_compile_commands = true;
        }
        if other.build.profile.is_some() {
            self.build.profile = other.build.profile;
        }
    }
}

/// Global then project, project wins.
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();
    config.merge(Config::load_or_default(global_path));
    config.merge(Config::load_or_default(project_path));
    config
}

/// Compiler overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub toolchain: ToolchainSettings,
}

/// `[toolchain]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// C compiler path
    pub cc: Option<PathBuf>,

    /// Flags prepended to every compile command
    pub cflags: Vec<String>,

    /// Flags appended to every link command
    pub ldflags: Vec<String>,
}

impl ToolchainConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse toolchain config: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize toolchain config")?;
        crate::util::fs::write_string(path, &contents)
    }

    /// Whether any field differs from the defaults.
    pub fn has_overrides(&self) -> bool {
        self.toolchain.cc.is_some()
            || !self.toolchain.cflags.is_empty()
            || !self.toolchain.ldflags.is_empty()
    }

    /// Resolve a relative `cc` path such as `tools/cc` against `root`.
    ///
    /// A bare program name like `clang` is left for the PATH search.
    pub fn anchored_at(mut self, root: &Path) -> Self {
        if let Some(cc) = &self.toolchain.cc {
            if is_relative_path(cc) {
                self.toolchain.cc = Some(root.join(cc));
            }
        }
        self
    }

    /// Merge `other` into `self`. Flag lists are replaced, not appended.
    pub fn merge(&mut self, other: ToolchainConfig) {
        if other.toolchain.cc.is_some() {
            self.toolchain.cc = other.toolchain.cc;
        }
        if !other.toolchain.cflags.is_empty() {
            self.toolchain.cflags = other.toolchain.cflags;
        }
        if !other.toolchain.ldflags.is_empty() {
            self.toolchain.ldflags = other.toolchain.ldflags;
        }
    }
}

/// A relative path with a directory part, as opposed to a bare program name.
pub fn is_relative_path(path: &Path) -> bool {
    path.is_relative() && path.components().count() > 1
}

/// Global then project, project wins. Unreadable files are skipped.
pub fn load_toolchain_config(global_path: &Path, project_path: &Path) -> ToolchainConfig {
    let mut config = ToolchainConfig::default();

    for path in [global_path, project_path] {
        if !path.exists() {
            continue;
        }
        match ToolchainConfig::load(path) {
            Ok(loaded) => config.merge(loaded),
            Err(e) => tracing::warn!("ignoring {}: {:#}", path.display(), e),
        }
    }

    config
}
