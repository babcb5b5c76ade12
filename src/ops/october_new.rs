//! Implementation of `october-build init`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::manifest::generate_manifest;
use crate::core::target::ExtensionTarget;
use crate::core::MANIFEST_NAME;

/// Options for initializing a grammar project.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Package name; defaults to the directory name
    pub name: Option<String>,
}

/// What `init` wrote.
#[derive(Debug, Clone)]
pub struct InitResult {
    pub manifest_path: PathBuf,
    pub package: String,
    pub module: String,
    /// `src/scanner.c` was found and listed as a source
    pub with_scanner: bool,
}

/// Module name for a package: `tree-sitter-october` gives
/// `tree_sitter_october`, `october` gives `tree_sitter_october` too.
pub fn module_name_for(package: &str) -> String {
    let language = package.strip_prefix("tree-sitter-").unwrap_or(package);
    format!("tree_sitter_{}", language.replace('-', "_"))
}

/// Write a default `October.toml` into `path`.
///
/// The directory is created if needed. An existing manifest is never
/// overwritten.
pub fn init_project(path: &Path, opts: &InitOptions) -> Result<InitResult> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }

    let manifest_path = path.join(MANIFEST_NAME);
    if manifest_path.exists() {
        bail!("`{}` already exists in `{}`", MANIFEST_NAME, path.display());
    }

    let package = match &opts.name {
        Some(name) => name.clone(),
        None => directory_name(path)?,
    };

    let module = module_name_for(&package);
    ExtensionTarget::new(module.as_str(), ["src/parser.c"]).validate_name()?;

    let with_scanner = path.join("src").join("scanner.c").is_file();
    let contents = generate_manifest(&package, &module, with_scanner);

    fs::write(&manifest_path, contents)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    ensure_gitignore(path)?;

    tracing::debug!("wrote {}", manifest_path.display());

    Ok(InitResult {
        manifest_path,
        package,
        module,
        with_scanner,
    })
}

fn directory_name(path: &Path) -> Result<String> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", path.display()))?;

    match canonical.file_name().and_then(|n| n.to_str()) {
        Some(name) => Ok(name.to_string()),
        None => bail!(
            "cannot infer a package name from `{}`; pass --name",
            path.display()
        ),
    }
}

/// Add `.october/` to `.gitignore`, creating the file if needed.
fn ensure_gitignore(path: &Path) -> Result<()> {
    let gitignore = path.join(".gitignore");
    let existing = if gitignore.exists() {
        fs::read_to_string(&gitignore)
            .with_context(|| format!("failed to read {}", gitignore.display()))?
    } else {
        String::new()
    };

    if existing.lines().any(|l| l.trim() == ".october/" || l.trim() == ".october") {
        return Ok(());
    }

    let mut contents = existing;
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str("# october-build output\n.october/\n");

    fs::write(&gitignore, contents)
        .with_context(|| format!("failed to write {}", gitignore.display()))
}
