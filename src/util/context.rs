//! Global context: working directory, user-level paths, output preferences.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::core::workspace::{find_manifest_in, ManifestError, PROJECT_DIR_NAME};

static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("", "", "october-build"));

/// Process-wide settings shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    cwd: PathBuf,
    home: PathBuf,
    verbose: bool,
    color: bool,
}

impl GlobalContext {
    /// Context rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Context rooted at an explicit directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = match PROJECT_DIRS.as_ref() {
            Some(dirs) => dirs.config_dir().to_path_buf(),
            None => cwd.join(PROJECT_DIR_NAME),
        };

        GlobalContext {
            cwd,
            home,
            verbose: false,
            color: true,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Global `config.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Global `toolchain.toml`.
    pub fn toolchain_config_path(&self) -> PathBuf {
        self.home.join("toolchain.toml")
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Find `October.toml` in the working directory or any ancestor.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        let mut current = self.cwd.clone();
        loop {
            if let Some(path) = find_manifest_in(&current) {
                return Ok(path);
            }
            if !current.pop() {
                return Err(ManifestError::NotFound {
                    dir: self.cwd.clone(),
                });
            }
        }
    }
}
