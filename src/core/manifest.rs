//! October.toml manifest parsing and schema.
//!
//! ```toml
//! [package]
//! name = "tree-sitter-october"
//! version = "0.1.0"
//!
//! [[extension]]
//! name = "tree_sitter_october"
//! sources = ["src/parser.c"]
//! extra_compile_args = ["-std=c11"]
//! include_dirs = ["src"]
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::core::target::{ExtensionTarget, TargetError};

/// `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,

    /// Semver version string
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub repository: Option<String>,
}

impl PackageMetadata {
    /// Parse the version as semver.
    pub fn version(&self) -> Result<Version> {
        Version::parse(&self.version)
            .with_context(|| format!("invalid version `{}` in [package]", self.version))
    }
}

/// Optimisation and debug-info defaults for one build profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Optimisation level: "0", "1", "2", "3", "s" or "z"
    pub opt_level: String,

    /// Emit debug info
    pub debug: bool,

    /// Extra flags emitted before every target's own flags
    #[serde(default)]
    pub cflags: Vec<String>,
}

impl Profile {
    pub fn debug() -> Self {
        Profile {
            opt_level: "0".to_string(),
            debug: true,
            cflags: Vec::new(),
        }
    }

    pub fn release() -> Self {
        Profile {
            opt_level: "2".to_string(),
            debug: false,
            cflags: Vec::new(),
        }
    }

    /// Built-in profile by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "debug" | "dev" => Some(Profile::debug()),
            "release" => Some(Profile::release()),
            _ => None,
        }
    }

    fn apply(&mut self, overrides: ProfileOverride) {
        if let Some(opt) = overrides.opt_level {
            self.opt_level = opt;
        }
        if let Some(debug) = overrides.debug {
            self.debug = debug;
        }
        if let Some(cflags) = overrides.cflags {
            self.cflags = cflags;
        }
    }
}

/// `[profile.<name>]` as written; unset fields keep the built-in value.
#[derive(Debug, Clone, Default, Deserialize)]
struct ProfileOverride {
    #[serde(default, deserialize_with = "deserialize_opt_level")]
    opt_level: Option<String>,
    debug: Option<bool>,
    cflags: Option<Vec<String>>,
}

/// Accept `opt_level = 2` as well as `opt_level = "s"`.
fn deserialize_opt_level<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OptLevel {
        Int(u32),
        Str(String),
    }

    Ok(Option::<OptLevel>::deserialize(deserializer)?.map(|level| match level {
        OptLevel::Int(n) => n.to_string(),
        OptLevel::Str(s) => s,
    }))
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    package: PackageMetadata,

    #[serde(default, rename = "extension")]
    extensions: Vec<ExtensionTarget>,

    #[serde(default)]
    profile: BTreeMap<String, ProfileOverride>,
}

/// A parsed and validated October.toml.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub package: PackageMetadata,

    /// Extension targets in declared order
    pub targets: Vec<ExtensionTarget>,

    /// Effective profiles (built-ins merged with overrides)
    pub profiles: BTreeMap<String, Profile>,

    /// Directory containing the manifest
    pub manifest_dir: PathBuf,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        let dir = manifest_dir(path)?;

        Self::parse(&contents, dir)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    pub fn parse(contents: &str, manifest_dir: PathBuf) -> Result<Self> {
        let raw: RawManifest = toml::from_str(contents)?;

        raw.package.version()?;

        if raw.extensions.is_empty() {
            bail!("no `[[extension]]` targets declared");
        }

        let mut seen = HashSet::new();
        for target in &raw.extensions {
            target.validate()?;
            if !seen.insert(target.name.as_str()) {
                return Err(TargetError::DuplicateTarget {
                    name: target.name.clone(),
                }
                .into());
            }
        }

        let mut profiles = BTreeMap::new();
        profiles.insert("debug".to_string(), Profile::debug());
        profiles.insert("release".to_string(), Profile::release());
        for (name, overrides) in raw.profile {
            let mut profile = Profile::builtin(&name).unwrap_or_else(Profile::debug);
            profile.apply(overrides);
            profiles.insert(name, profile);
        }

        Ok(Manifest {
            package: raw.package,
            targets: raw.extensions,
            profiles,
            manifest_dir,
        })
    }

    pub fn target(&self, name: &str) -> Option<&ExtensionTarget> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name.as_str()).collect()
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles.get(name).with_context(|| {
            format!(
                "unknown profile `{}`\navailable profiles: {}",
                name,
                self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })
    }
}

/// Render the default manifest for a grammar package.
///
/// The single extension compiles the generated parser as C11 with `src` on
/// the include path. A hand-written `src/scanner.c` is listed as a second
/// source when `with_scanner` is set.
pub fn generate_manifest(package: &str, module: &str, with_scanner: bool) -> String {
    let sources = if with_scanner {
        r#"["src/parser.c", "src/scanner.c"]"#
    } else {
        r#"["src/parser.c"]"#
    };

    format!(
        r#"[package]
name = "{package}"
version = "0.1.0"

[[extension]]
name = "{module}"
sources = {sources}
extra_compile_args = ["-std=c11"]
include_dirs = ["src"]
"#
    )
}

/// Absolute directory holding the manifest at `path`.
///
/// A bare `October.toml` has an empty parent, so the path is made absolute
/// against the current directory first.
fn manifest_dir(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(absolute))
}
