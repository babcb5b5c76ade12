//! Build fingerprinting for incremental builds.
//!
//! Fingerprints capture all inputs to a build step, allowing us to skip
//! rebuilding when nothing has changed. The full ordered argument list is
//! part of every fingerprint, so any flag change forces the step to run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::plan::{CompileStep, LinkStep};
use crate::util::fs::glob_files;
use crate::util::hash::{sha256_file, Fingerprint as HashFingerprint};

const HEADER_PATTERNS: &[&str] = &["**/*.h"];

fn args_hash(args: &[String]) -> String {
    let mut fp = HashFingerprint::new();
    fp.update_strs(args.iter().map(String::as_str));
    fp.finish()
}

/// Fingerprint for a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileFingerprint {
    /// Source file hash
    pub source_hash: String,

    /// Compiler identity
    pub compiler: String,

    /// Hash of the full argument list
    pub args_hash: String,

    /// Hashes of headers under the include directories
    pub header_hashes: BTreeMap<PathBuf, String>,
}

impl CompileFingerprint {
    /// Fingerprint a planned step; relative paths resolve against `root`.
    pub fn for_step(root: &Path, step: &CompileStep, compiler: &str) -> Result<Self> {
        let source = root.join(&step.source);
        let source_hash = sha256_file(&source)?;

        let mut header_hashes = BTreeMap::new();
        for dir in &step.include_dirs {
            let dir = root.join(dir);
            if !dir.is_dir() {
                continue;
            }
            for header in glob_files(&dir, HEADER_PATTERNS)? {
                let hash = sha256_file(&header)?;
                header_hashes.insert(header, hash);
            }
        }

        Ok(CompileFingerprint {
            source_hash,
            compiler: compiler.to_string(),
            args_hash: args_hash(&step.command.argv()),
            header_hashes,
        })
    }

    /// Check if the fingerprint matches (nothing has changed).
    pub fn matches(&self, other: &CompileFingerprint) -> bool {
        self == other
    }
}

/// Fingerprint for a link step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFingerprint {
    /// Object file hashes
    pub object_hashes: BTreeMap<PathBuf, String>,

    /// Hash of the full argument list
    pub args_hash: String,
}

impl LinkFingerprint {
    /// Fingerprint a link step once its objects exist.
    pub fn for_step(step: &LinkStep) -> Result<Self> {
        let mut object_hashes = BTreeMap::new();
        for obj in &step.objects {
            if obj.exists() {
                object_hashes.insert(obj.clone(), sha256_file(obj)?);
            }
        }

        Ok(LinkFingerprint {
            object_hashes,
            args_hash: args_hash(&step.command.argv()),
        })
    }

    pub fn matches(&self, other: &LinkFingerprint) -> bool {
        self == other
    }
}

/// Fingerprint cache for one profile's output directory.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FingerprintCache {
    /// Compile fingerprints by object path
    pub compile: BTreeMap<PathBuf, CompileFingerprint>,

    /// Link fingerprints by target name
    pub link: BTreeMap<String, LinkFingerprint>,
}

impl FingerprintCache {
    /// Load the cache. A missing or unreadable file is an empty cache.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return FingerprintCache::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| serde_json::from_str(&content).map_err(anyhow::Error::from));

        match parsed {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!("ignoring fingerprint cache {}: {}", path.display(), e);
                FingerprintCache::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        crate::util::fs::write_string(path, &content)
            .with_context(|| format!("failed to save fingerprints to {}", path.display()))
    }

    /// Whether the object for a compile step must be rebuilt.
    pub fn needs_compile(&self, object: &Path, current: &CompileFingerprint) -> bool {
        if !object.exists() {
            return true;
        }
        match self.compile.get(object) {
            Some(cached) => !cached.matches(current),
            None => true,
        }
    }

    /// Whether a target's module must be relinked.
    pub fn needs_link(&self, target: &str, output: &Path, current: &LinkFingerprint) -> bool {
        if !output.exists() {
            return true;
        }
        match self.link.get(target) {
            Some(cached) => !cached.matches(current),
            None => true,
        }
    }

    pub fn update_compile(&mut self, object: PathBuf, fingerprint: CompileFingerprint) {
        self.compile.insert(object, fingerprint);
    }

    pub fn update_link(&mut self, target: String, fingerprint: LinkFingerprint) {
        self.link.insert(target, fingerprint);
    }
}
