//! MSVC toolchain implementation.

use std::path::{Path, PathBuf};

use crate::core::manifest::Profile;

use super::{CommandSpec, CompileInput, LinkInput, Toolchain, ToolchainPlatform};

/// MSVC toolchain (Windows).
#[derive(Debug, Clone)]
pub struct MsvcToolchain {
    /// Path to cl.exe (compiler)
    pub cl: PathBuf,
    /// Path to link.exe (linker)
    pub link: PathBuf,
}

impl MsvcToolchain {
    pub fn new(cl: PathBuf, link: PathBuf) -> Self {
        MsvcToolchain { cl, link }
    }
}

/// `/O` flag for a GCC-style optimisation level.
fn opt_flag(level: &str) -> &'static str {
    match level {
        "0" => "/Od",
        "1" | "s" | "z" => "/O1",
        _ => "/O2",
    }
}

impl Toolchain for MsvcToolchain {
    fn platform(&self) -> ToolchainPlatform {
        ToolchainPlatform::Msvc
    }

    fn compiler_path(&self) -> &Path {
        &self.cl
    }

    fn profile_flags(&self, profile: &Profile) -> Vec<String> {
        let mut flags = vec![opt_flag(&profile.opt_level).to_string()];
        if profile.debug {
            flags.push("/Zi".to_string());
        }
        flags.extend(profile.cflags.iter().cloned());
        flags
    }

    fn position_independent_flags(&self) -> &'static [&'static str] {
        &[]
    }

    fn compile_command(&self, input: &CompileInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cl).arg("/nologo").arg("/c");

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("/I{}", dir.display()));
        }

        for def in &input.defines {
            cmd = cmd.arg(format!("/D{}", def));
        }

        cmd.args(input.cflags.iter().cloned())
            .arg(input.source.display().to_string())
            .arg(format!("/Fo{}", input.output.display()))
    }

    fn link_module_command(&self, input: &LinkInput) -> CommandSpec {
        CommandSpec::new(&self.link)
            .arg("/nologo")
            .arg("/DLL")
            .arg(format!("/OUT:{}", input.output.display()))
            .args(input.objects.iter().map(|obj| obj.display().to_string()))
            .args(input.ldflags.iter().cloned())
    }

    fn object_extension(&self) -> &str {
        "obj"
    }

    fn module_extension(&self) -> &str {
        "dll"
    }
}
