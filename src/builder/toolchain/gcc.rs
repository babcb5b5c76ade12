//! GCC/Clang toolchain implementation.

use std::path::{Path, PathBuf};

use crate::core::manifest::Profile;

use super::{CommandSpec, CompileInput, LinkInput, Toolchain, ToolchainPlatform};

/// GCC/Clang toolchain. The compiler driver also links.
#[derive(Debug, Clone)]
pub struct GccToolchain {
    /// Path to the C compiler
    pub cc: PathBuf,
    /// Compiler family (gcc, clang, apple-clang)
    pub family: ToolchainPlatform,
}

impl GccToolchain {
    pub fn new(cc: PathBuf, family: ToolchainPlatform) -> Self {
        GccToolchain { cc, family }
    }
}

impl Toolchain for GccToolchain {
    fn platform(&self) -> ToolchainPlatform {
        self.family
    }

    fn compiler_path(&self) -> &Path {
        &self.cc
    }

    fn profile_flags(&self, profile: &Profile) -> Vec<String> {
        let mut flags = vec![format!("-O{}", profile.opt_level)];
        if profile.debug {
            flags.push("-g".to_string());
        }
        flags.extend(profile.cflags.iter().cloned());
        flags
    }

    fn position_independent_flags(&self) -> &'static [&'static str] {
        // Windows DLLs are position independent already; mingw warns on -fPIC.
        if cfg!(target_os = "windows") {
            &[]
        } else {
            &["-fPIC"]
        }
    }

    fn compile_command(&self, input: &CompileInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cc)
            .arg("-c")
            .args(self.position_independent_flags().iter().copied());

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        for def in &input.defines {
            cmd = cmd.arg(format!("-D{}", def));
        }

        cmd.args(input.cflags.iter().cloned())
            .arg(input.source.display().to_string())
            .arg("-o")
            .arg(input.output.display().to_string())
    }

    fn link_module_command(&self, input: &LinkInput) -> CommandSpec {
        CommandSpec::new(&self.cc)
            .arg("-shared")
            .arg("-o")
            .arg(input.output.display().to_string())
            .args(input.objects.iter().map(|obj| obj.display().to_string()))
            .args(input.ldflags.iter().cloned())
    }

    fn object_extension(&self) -> &str {
        if cfg!(target_os = "windows") {
            "obj"
        } else {
            "o"
        }
    }
}
