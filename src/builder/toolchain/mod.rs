//! Toolchain abstraction for C compilers.
//!
//! This module turns compile and link inputs into concrete command lines for
//! the host toolchain (GCC, Clang, MSVC). Every list in an input reaches the
//! command line in the order given.
//!
//! Toolchain detection priority:
//! 1. Toolchain config file (`.october/toolchain.toml`, then the global one)
//! 2. The `CC` environment variable
//! 3. Searching PATH for common compilers

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::manifest::Profile;
use crate::core::target::MacroDef;
use crate::util::process::ProcessBuilder;

mod detect;
mod gcc;
mod msvc;

pub use detect::{detect_toolchain, toolchain_for_compiler};
pub use gcc::GccToolchain;
pub use msvc::MsvcToolchain;

/// A command to execute: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// The program to run (e.g., "gcc", "cl.exe")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.display().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// A process for this command, run from `cwd`.
    pub fn to_process(&self, cwd: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .args(&self.args)
            .cwd(cwd)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Input for a compile step.
#[derive(Debug, Clone)]
pub struct CompileInput {
    /// Source file, as declared
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
    /// Include directories, as declared
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines
    pub defines: Vec<MacroDef>,
    /// Profile, toolchain-config and target flags, in that order
    pub cflags: Vec<String>,
}

/// Input for linking a loadable module.
#[derive(Debug, Clone)]
pub struct LinkInput {
    /// Object files to link
    pub objects: Vec<PathBuf>,
    /// Output module
    pub output: PathBuf,
    /// Additional linker flags
    pub ldflags: Vec<String>,
}

/// The platform/family of a toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolchainPlatform {
    /// GCC (GNU Compiler Collection)
    Gcc,
    /// Clang/LLVM
    Clang,
    /// Apple Clang (macOS)
    AppleClang,
    /// Microsoft Visual C++
    Msvc,
}

impl ToolchainPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainPlatform::Gcc => "gcc",
            ToolchainPlatform::Clang => "clang",
            ToolchainPlatform::AppleClang => "apple-clang",
            ToolchainPlatform::Msvc => "msvc",
        }
    }
}

impl fmt::Display for ToolchainPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loadable-module extension on the host: `so`, `dylib` or `dll`.
pub fn host_module_extension() -> &'static str {
    if cfg!(target_os = "windows") {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}

/// Trait for toolchain implementations.
///
/// Each toolchain knows how to generate commands for its specific compiler.
pub trait Toolchain: Send + Sync {
    /// Get the toolchain platform.
    fn platform(&self) -> ToolchainPlatform;

    /// Get the C compiler path.
    fn compiler_path(&self) -> &Path;

    /// Optimisation and debug-info flags for a profile, followed by the
    /// profile's own `cflags`.
    fn profile_flags(&self, profile: &Profile) -> Vec<String>;

    /// Flags every object of a loadable module must be compiled with.
    fn position_independent_flags(&self) -> &'static [&'static str];

    /// Generate a compile command.
    fn compile_command(&self, input: &CompileInput) -> CommandSpec;

    /// Generate a command linking objects into a loadable module.
    fn link_module_command(&self, input: &LinkInput) -> CommandSpec;

    /// Get the object file extension.
    fn object_extension(&self) -> &str;

    /// Get the loadable-module extension.
    fn module_extension(&self) -> &str {
        host_module_extension()
    }

    /// Stable identity used in fingerprints; a different compiler forces a
    /// rebuild.
    fn identity(&self) -> String {
        format!("{}:{}", self.platform(), self.compiler_path().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_argv() {
        let cmd = CommandSpec::new("cc").arg("-c").args(["-Isrc", "src/parser.c"]);
        assert_eq!(cmd.argv(), vec!["cc", "-c", "-Isrc", "src/parser.c"]);
        assert_eq!(cmd.to_string(), "cc -c -Isrc src/parser.c");
    }

    #[test]
    fn test_command_spec_process_keeps_args() {
        let cmd = CommandSpec::new("cc").args(["-Isrc", "src/parser.c"]);
        let process = cmd.to_process(Path::new("/project"));
        assert_eq!(process.get_program(), Path::new("cc"));
        assert_eq!(process.get_args(), &["-Isrc".to_string(), "src/parser.c".to_string()]);
    }

    #[test]
    fn test_module_extension() {
        let ext = host_module_extension();
        if cfg!(target_os = "linux") {
            assert_eq!(ext, "so");
        }
        assert!(["so", "dylib", "dll"].contains(&ext));
    }
}
