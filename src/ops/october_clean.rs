//! Implementation of `october-build clean`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::Workspace;
use crate::util::fs::remove_dir_all_if_exists;

/// Remove build output. With `all`, the whole `.october/` directory goes,
/// including project config.
///
/// Returns the removed directory, or `None` if there was nothing to remove.
pub fn clean(manifest_path: &Path, all: bool) -> Result<Option<PathBuf>> {
    let ws = Workspace::new(manifest_path)?;

    let dir = if all {
        ws.project_dir()
    } else {
        ws.target_dir().to_path_buf()
    };

    if !dir.exists() {
        return Ok(None);
    }

    remove_dir_all_if_exists(&dir)?;
    tracing::debug!("removed {}", dir.display());
    Ok(Some(dir))
}
