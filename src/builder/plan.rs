//! Build plan generation.
//!
//! A BuildPlan lists, per extension target, one compile step per source and
//! one link step producing the loadable module. Every step carries its fully
//! formed command, so the plan can be printed, exported as
//! `compile_commands.json`, or executed without recomputing anything.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::context::BuildContext;
use crate::builder::toolchain::{CommandSpec, CompileInput, LinkInput};
use crate::core::target::ExtensionTarget;
use crate::util::hash::short_path_hash;

/// A complete build plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPlan {
    /// Profile the plan was made for
    pub profile: String,

    /// Working directory of every command
    pub root: PathBuf,

    /// Compilation steps, in declared source order per target
    pub compile_steps: Vec<CompileStep>,

    /// One link step per target
    pub link_steps: Vec<LinkStep>,
}

/// A single compilation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileStep {
    /// Target name
    pub target: String,

    /// Source file, as declared
    pub source: PathBuf,

    /// Output object file
    pub output: PathBuf,

    /// Include directories, as declared
    pub include_dirs: Vec<PathBuf>,

    pub command: CommandSpec,
}

/// A single link step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkStep {
    /// Target name
    pub target: String,

    /// Object files to link
    pub objects: Vec<PathBuf>,

    /// Output module
    pub output: PathBuf,

    pub command: CommandSpec,
}

impl BuildPlan {
    /// Plan the given targets. Sources are not checked for existence here.
    pub fn new(ctx: &BuildContext, targets: &[&ExtensionTarget]) -> Result<Self> {
        let mut compile_steps = Vec::new();
        let mut link_steps = Vec::new();

        for target in targets {
            target.validate()?;

            let (compiles, link) = plan_target(ctx, target);
            compile_steps.extend(compiles);
            link_steps.push(link);
        }

        Ok(BuildPlan {
            profile: ctx.profile_name.clone(),
            root: ctx.workspace_root.clone(),
            compile_steps,
            link_steps,
        })
    }

    /// Compile steps belonging to one target.
    pub fn compile_steps_for<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a CompileStep> {
        self.compile_steps.iter().filter(move |s| s.target == target)
    }

    pub fn link_step_for(&self, target: &str) -> Option<&LinkStep> {
        self.link_steps.iter().find(|s| s.target == target)
    }

    /// Pretty JSON, as printed by `build --plan`.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize build plan")
    }

    /// Emit compile_commands.json for IDE integration.
    ///
    /// `arguments` is exactly the command the build runs; `directory` is the
    /// project root, so relative paths resolve the same way.
    pub fn emit_compile_commands(&self, path: &Path) -> Result<()> {
        let commands: Vec<CompileCommand> = self
            .compile_steps
            .iter()
            .map(|step| CompileCommand {
                directory: self.root.display().to_string(),
                file: step.source.display().to_string(),
                arguments: step.command.argv(),
                output: Some(step.output.display().to_string()),
            })
            .collect();

        let json = serde_json::to_string_pretty(&commands)?;
        crate::util::fs::write_string(path, &json)
            .with_context(|| format!("failed to write {}", path.display()))?;

        tracing::info!("wrote {}", path.display());
        Ok(())
    }

    pub fn compile_count(&self) -> usize {
        self.compile_steps.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_steps.len()
    }
}

fn plan_target(ctx: &BuildContext, target: &ExtensionTarget) -> (Vec<CompileStep>, LinkStep) {
    let toolchain = ctx.toolchain();
    let obj_dir = ctx.object_dir(target);
    let obj_ext = toolchain.object_extension();
    let cflags = ctx.compile_flags(target);

    let compiles: Vec<CompileStep> = target
        .sources
        .iter()
        .map(|source| {
            let output = obj_dir.join(object_file_name(source, obj_ext));
            let input = CompileInput {
                source: source.clone(),
                output: output.clone(),
                include_dirs: target.include_dirs.clone(),
                defines: target.define_macros.clone(),
                cflags: cflags.clone(),
            };

            CompileStep {
                target: target.name.clone(),
                source: source.clone(),
                output,
                include_dirs: target.include_dirs.clone(),
                command: toolchain.compile_command(&input),
            }
        })
        .collect();

    let objects: Vec<PathBuf> = compiles.iter().map(|s| s.output.clone()).collect();
    let output = ctx.module_path(target);
    let input = LinkInput {
        objects: objects.clone(),
        output: output.clone(),
        ldflags: ctx.link_flags(target),
    };

    let link = LinkStep {
        target: target.name.clone(),
        objects,
        output,
        command: toolchain.link_module_command(&input),
    };

    (compiles, link)
}

/// `<stem>-<hash8>.<ext>`; the hash keeps `a/parser.c` and `b/parser.c` apart.
fn object_file_name(source: &Path, ext: &str) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    format!("{}-{}.{}", stem, short_path_hash(source), ext)
}

/// compile_commands.json entry.
#[derive(Debug, Serialize, Deserialize)]
struct CompileCommand {
    directory: String,
    file: String,
    arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::context::tests::gcc_context;
    use crate::util::config::ToolchainConfig;
    use tempfile::TempDir;

    fn october() -> ExtensionTarget {
        ExtensionTarget::new("tree_sitter_october", ["src/parser.c"])
            .extra_compile_arg("-std=c11")
            .include_dir("src")
    }

    #[test]
    fn test_plan_single_target() {
        let ctx = gcc_context(Path::new("/p"), "debug", &ToolchainConfig::default());
        let target = october();
        let plan = BuildPlan::new(&ctx, &[&target]).unwrap();

        assert_eq!(plan.compile_count(), 1);
        assert_eq!(plan.link_count(), 1);

        let compile = &plan.compile_steps[0];
        assert_eq!(compile.source, PathBuf::from("src/parser.c"));
        assert!(compile.output.starts_with("/p/.october/target/debug/obj/tree_sitter_october"));
        assert!(compile.command.args.contains(&"-Isrc".to_string()));
        assert!(compile.command.args.contains(&"-std=c11".to_string()));
        assert!(compile.command.args.contains(&"src/parser.c".to_string()));

        let link = &plan.link_steps[0];
        assert_eq!(link.objects, vec![compile.output.clone()]);
        assert_eq!(
            link.output.file_stem().unwrap().to_str().unwrap(),
            "tree_sitter_october"
        );
    }

    #[test]
    fn test_object_names_are_unique_per_path() {
        let a = object_file_name(Path::new("a/parser.c"), "o");
        let b = object_file_name(Path::new("b/parser.c"), "o");
        assert!(a.starts_with("parser-"));
        assert!(a.ends_with(".o"));
        assert_ne!(a, b);
        assert_eq!(a, object_file_name(Path::new("a/parser.c"), "o"));
    }

    #[test]
    fn test_plan_preserves_source_order() {
        let ctx = gcc_context(Path::new("/p"), "debug", &ToolchainConfig::default());
        let target = ExtensionTarget::new("tree_sitter_october", ["src/parser.c", "src/scanner.c"]);
        let plan = BuildPlan::new(&ctx, &[&target]).unwrap();

        let sources: Vec<_> = plan
            .compile_steps_for("tree_sitter_october")
            .map(|s| s.source.clone())
            .collect();
        assert_eq!(
            sources,
            vec![PathBuf::from("src/parser.c"), PathBuf::from("src/scanner.c")]
        );
        assert_eq!(plan.link_step_for("tree_sitter_october").unwrap().objects.len(), 2);
    }

    #[test]
    fn test_plan_json() {
        let ctx = gcc_context(Path::new("/p"), "release", &ToolchainConfig::default());
        let target = october();
        let json = BuildPlan::new(&ctx, &[&target]).unwrap().to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["profile"], "release");
        let args = value["compile_steps"][0]["command"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "-Isrc"));
        assert!(args.iter().any(|a| a == "-O2"));
    }

    #[test]
    fn test_emit_compile_commands() {
        let tmp = TempDir::new().unwrap();
        let ctx = gcc_context(tmp.path(), "debug", &ToolchainConfig::default());
        let target = october();
        let plan = BuildPlan::new(&ctx, &[&target]).unwrap();

        let path = tmp.path().join(".october/compile_commands.json");
        plan.emit_compile_commands(&path).unwrap();

        let commands: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0]["file"], "src/parser.c");
        assert_eq!(commands[0]["directory"], tmp.path().display().to_string());

        let arguments = commands[0]["arguments"].as_array().unwrap();
        assert_eq!(arguments[0], "gcc");
        assert!(arguments.iter().any(|a| a == "-Isrc"));
        assert!(arguments.iter().any(|a| a == "-std=c11"));
    }

    #[test]
    fn test_plan_rejects_invalid_target() {
        let ctx = gcc_context(Path::new("/p"), "debug", &ToolchainConfig::default());
        let target = ExtensionTarget::new("tree-sitter-october", ["src/parser.c"]);
        assert!(BuildPlan::new(&ctx, &[&target]).is_err());
    }
}
