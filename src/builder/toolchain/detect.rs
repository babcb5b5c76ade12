//! Toolchain detection functions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::util::config::ToolchainConfig;
use crate::util::process::{find_c_compiler, find_executable, ProcessBuilder};

use super::{GccToolchain, MsvcToolchain, Toolchain, ToolchainPlatform};

/// Detect the available toolchain.
///
/// Tries to find a C compiler with the following priority:
/// 1. `cc` from the merged toolchain config
/// 2. The `CC` environment variable
/// 3. `cc`, `gcc`, `clang`, then `cl` on PATH
pub fn detect_toolchain(config: &ToolchainConfig) -> Result<Arc<dyn Toolchain>> {
    if let Some(cc) = &config.toolchain.cc {
        match resolve_configured(cc) {
            Some(path) => {
                tracing::debug!("using C compiler from toolchain config: {}", path.display());
                return toolchain_for_compiler(path);
            }
            None => tracing::warn!("configured C compiler not found: {}", cc.display()),
        }
    }

    match find_c_compiler() {
        Some(cc) => toolchain_for_compiler(cc),
        None => bail!(
            "no C compiler found\n\
             \n\
             october-build requires a C compiler (cc, gcc, clang, or cl).\n\
             Set the CC environment variable, set `cc` in .october/toolchain.toml,\n\
             or install a compiler."
        ),
    }
}

fn resolve_configured(cc: &Path) -> Option<PathBuf> {
    if cc.is_file() {
        return Some(cc.to_path_buf());
    }
    cc.to_str().and_then(find_executable)
}

/// Build a toolchain around a known compiler binary.
pub fn toolchain_for_compiler(cc: PathBuf) -> Result<Arc<dyn Toolchain>> {
    if is_msvc_driver(&cc) {
        let link = cc
            .parent()
            .map(|dir| dir.join("link.exe"))
            .filter(|p| p.exists())
            .or_else(|| find_executable("link"));

        let Some(link) = link else {
            bail!(
                "MSVC cl.exe found at {} but link.exe is not available\n\
                 Run from a Developer Command Prompt.",
                cc.display()
            );
        };

        return Ok(Arc::new(MsvcToolchain::new(cc, link)));
    }

    let family = detect_compiler_family(&cc);
    tracing::debug!("detected {} at {}", family, cc.display());
    Ok(Arc::new(GccToolchain::new(cc, family)))
}

fn is_msvc_driver(cc: &Path) -> bool {
    cc.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("cl"))
}

/// Detect whether the compiler is GCC, Clang, or Apple Clang.
fn detect_compiler_family(cc: &Path) -> ToolchainPlatform {
    let name = cc
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if name.contains("gcc") {
        return ToolchainPlatform::Gcc;
    }

    // `cc` and `clang` may be either; ask the driver.
    match compiler_version_output(cc) {
        Some(version) => family_from_version(&version),
        None if name.contains("clang") => ToolchainPlatform::Clang,
        None => ToolchainPlatform::Gcc,
    }
}

fn compiler_version_output(cc: &Path) -> Option<String> {
    let output = ProcessBuilder::new(cc).arg("--version").exec().ok()?;
    Some(String::from_utf8_lossy(&output.stdout).to_lowercase())
}

fn family_from_version(version: &str) -> ToolchainPlatform {
    if version.contains("apple") && version.contains("clang") {
        ToolchainPlatform::AppleClang
    } else if version.contains("clang") {
        ToolchainPlatform::Clang
    } else {
        ToolchainPlatform::Gcc
    }
}
