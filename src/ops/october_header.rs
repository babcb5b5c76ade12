//! Implementation of `october-build header`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::grammar::GrammarBinding;
use crate::core::Workspace;
use crate::ops::october_build::select_targets;
use crate::util::fs::write_string;

/// Default header directory, relative to the project root.
pub const DEFAULT_HEADER_DIR: &str = "bindings/c";

/// Options for the header command.
#[derive(Debug, Clone, Default)]
pub struct HeaderOptions {
    /// Targets to emit headers for (empty = all)
    pub targets: Vec<String>,

    /// Output directory; defaults to `bindings/c` under the project root
    pub output: Option<PathBuf>,
}

/// Write a C header declaring each selected grammar's entry point.
///
/// Returns the written paths in target order.
pub fn write_headers(manifest_path: &Path, opts: &HeaderOptions) -> Result<Vec<PathBuf>> {
    let ws = Workspace::new(manifest_path)?;
    let targets = select_targets(ws.manifest(), &opts.targets)?;

    let out_dir = match &opts.output {
        Some(dir) => dir.clone(),
        None => ws.root().join(DEFAULT_HEADER_DIR),
    };

    let mut written = Vec::with_capacity(targets.len());
    for target in targets {
        let binding = GrammarBinding::for_target(target);
        let path = out_dir.join(binding.header_filename());

        write_string(&path, &binding.render_c_header())
            .with_context(|| format!("failed to write header for `{}`", target.name))?;
        tracing::debug!("wrote {}", path.display());

        written.push(path);
    }

    Ok(written)
}
