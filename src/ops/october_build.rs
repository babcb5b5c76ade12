//! Implementation of `october-build build`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::builder::{BuildContext, BuildExecutor, BuildPlan};
use crate::core::manifest::Manifest;
use crate::core::target::ExtensionTarget;
use crate::core::Workspace;
use crate::util::config::{load_config, load_toolchain_config, Config, ToolchainConfig};
use crate::util::GlobalContext;

/// A `--target` filter named no declared extension.
#[derive(Debug, Error)]
#[error("unknown target `{name}`\navailable targets: {}", .available.join(", "))]
pub struct UnknownTargetError {
    pub name: String,
    pub available: Vec<String>,
}

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Build with the release profile
    pub release: bool,

    /// Explicit profile name; overrides `release`
    pub profile: Option<String>,

    /// Specific targets to build (empty = all)
    pub targets: Vec<String>,

    /// Emit compile_commands.json
    pub emit_compile_commands: bool,

    /// Plan only; nothing is compiled
    pub plan_only: bool,

    /// Number of parallel compile jobs
    pub jobs: Option<usize>,

    pub verbose: bool,
}

impl BuildOptions {
    /// Profile to build: explicit name, `--release`, config default, debug.
    pub fn profile_name(&self, config: &Config) -> String {
        if let Some(profile) = &self.profile {
            return profile.clone();
        }
        if self.release {
            return "release".to_string();
        }
        config
            .build
            .profile
            .clone()
            .unwrap_or_else(|| "debug".to_string())
    }
}

/// Build result.
#[derive(Debug)]
pub struct BuildResult {
    /// Built modules, one per target
    pub artifacts: Vec<Artifact>,

    /// The plan, when only planning was requested
    pub plan: Option<BuildPlan>,
}

/// A built module.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Target name
    pub target: String,

    /// Module path
    pub path: PathBuf,

    /// Nothing changed since the previous build
    pub fresh: bool,
}

/// Targets to build: all declared ones, or those named by `filter`.
///
/// A name repeated in `filter` is selected once, at its first position.
pub fn select_targets<'a>(
    manifest: &'a Manifest,
    filter: &[String],
) -> Result<Vec<&'a ExtensionTarget>, UnknownTargetError> {
    if filter.is_empty() {
        return Ok(manifest.targets.iter().collect());
    }

    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for name in filter {
        if !seen.insert(name.as_str()) {
            continue;
        }
        let target = manifest.target(name).ok_or_else(|| UnknownTargetError {
            name: name.clone(),
            available: manifest.target_names().iter().map(|s| s.to_string()).collect(),
        })?;
        selected.push(target);
    }

    Ok(selected)
}

/// Names given more than once in `filter`, each reported once.
pub fn repeated_targets(filter: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut repeated = Vec::new();
    for name in filter {
        if !seen.insert(name.as_str()) && !repeated.contains(&name.as_str()) {
            repeated.push(name.as_str());
        }
    }
    repeated
}

/// Merged global and project toolchain config for a workspace, with a
/// relative `cc` resolved against the project root.
pub fn workspace_toolchain_config(gctx: &GlobalContext, ws: &Workspace) -> ToolchainConfig {
    load_toolchain_config(&gctx.toolchain_config_path(), &ws.toolchain_config_path())
        .anchored_at(ws.root())
}

/// Load the workspace for a manifest with the profile the options select.
pub fn load_workspace(
    gctx: &GlobalContext,
    manifest_path: &Path,
    opts: &BuildOptions,
) -> Result<(Workspace, Config)> {
    let ws = Workspace::new(manifest_path)?;
    let config = load_config(&gctx.config_path(), &ws.config_path());
    let ws = ws.with_profile(opts.profile_name(&config));

    // Fail on an unknown profile before doing anything else.
    ws.profile()?;

    Ok((ws, config))
}

/// Build the project whose manifest is at `manifest_path`.
///
/// Every selected target's sources are checked before a toolchain is looked
/// up, so a missing source fails without running any compiler.
pub fn build(gctx: &GlobalContext, manifest_path: &Path, opts: &BuildOptions) -> Result<BuildResult> {
    let (ws, config) = load_workspace(gctx, manifest_path, opts)?;
    let targets = select_targets(ws.manifest(), &opts.targets)?;

    for target in &targets {
        target.resolve_sources(ws.root())?;
    }

    let toolchain_config = workspace_toolchain_config(gctx, &ws);
    let ctx = BuildContext::new(&ws, &toolchain_config)?;
    tracing::debug!(
        "using {} ({}) for `{}` profile",
        ctx.toolchain().platform(),
        ctx.toolchain().compiler_path().display(),
        ctx.profile_name
    );

    let plan = BuildPlan::new(&ctx, &targets)?;

    if opts.emit_compile_commands || config.build.emit_compile_commands {
        plan.emit_compile_commands(&ws.compile_commands_path())?;
    }

    if opts.plan_only {
        return Ok(BuildResult {
            artifacts: Vec::new(),
            plan: Some(plan),
        });
    }

    let jobs = opts.jobs.or(config.build.jobs);
    let artifacts = BuildExecutor::new(&ctx)
        .verbose(opts.verbose)
        .execute(&plan, jobs)?;

    Ok(BuildResult {
        artifacts,
        plan: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::context::tests::gcc_context;
    use crate::core::manifest::generate_manifest;
    use crate::core::target::TargetError;
    use crate::core::MANIFEST_NAME;
    use tempfile::TempDir;

    fn project(with_parser: bool) -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(MANIFEST_NAME),
            generate_manifest("tree-sitter-october", "tree_sitter_october", false),
        )
        .unwrap();
        if with_parser {
            std::fs::create_dir_all(tmp.path().join("src")).unwrap();
            std::fs::write(tmp.path().join("src/parser.c"), "int x;").unwrap();
        }
        tmp
    }

    #[test]
    fn test_missing_parser_fails_before_toolchain() {
        let tmp = project(false);
        let gctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        let err = build(&gctx, &tmp.path().join(MANIFEST_NAME), &BuildOptions::default())
            .unwrap_err();

        let target_err = err.downcast_ref::<TargetError>().unwrap();
        assert!(target_err.is_not_found());
        assert!(!tmp.path().join(".october/target").exists());
    }

    #[test]
    fn test_unknown_target_filter() {
        let tmp = project(true);
        let gctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let opts = BuildOptions {
            targets: vec!["tree_sitter_nope".to_string()],
            ..Default::default()
        };

        let err = build(&gctx, &tmp.path().join(MANIFEST_NAME), &opts).unwrap_err();
        let unknown = err.downcast_ref::<UnknownTargetError>().unwrap();
        assert_eq!(unknown.name, "tree_sitter_nope");
        assert!(err.to_string().contains("available targets: tree_sitter_october"));
    }

    #[test]
    fn test_repeated_target_selected_once() {
        let tmp = project(true);
        let manifest = Manifest::load(&tmp.path().join(MANIFEST_NAME)).unwrap();
        let filter = vec![
            "tree_sitter_october".to_string(),
            "tree_sitter_october".to_string(),
        ];

        let targets = select_targets(&manifest, &filter).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "tree_sitter_october");
        assert_eq!(repeated_targets(&filter), vec!["tree_sitter_october"]);
    }

    #[test]
    fn test_repeated_target_planned_once() {
        let tmp = project(true);
        let manifest = Manifest::load(&tmp.path().join(MANIFEST_NAME)).unwrap();
        let ctx = gcc_context(tmp.path(), "debug", &ToolchainConfig::default());

        let filter = vec!["tree_sitter_october".to_string(); 3];
        let targets = select_targets(&manifest, &filter).unwrap();
        let plan = BuildPlan::new(&ctx, &targets).unwrap();

        assert_eq!(plan.compile_count(), 1);
        assert_eq!(plan.link_count(), 1);
    }

    #[test]
    fn test_repeated_targets_reported_once() {
        let filter: Vec<String> = ["a", "b", "a", "a", "b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(repeated_targets(&filter), vec!["a", "b"]);
        assert!(repeated_targets(&filter[..2]).is_empty());
    }

    #[test]
    fn test_unknown_profile() {
        let tmp = project(true);
        let gctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let opts = BuildOptions {
            profile: Some("bench".to_string()),
            ..Default::default()
        };

        let err = build(&gctx, &tmp.path().join(MANIFEST_NAME), &opts).unwrap_err();
        assert!(err.to_string().contains("unknown profile `bench`"));
    }

    #[test]
    fn test_profile_selection() {
        let config = Config::default();
        assert_eq!(BuildOptions::default().profile_name(&config), "debug");

        let release = BuildOptions {
            release: true,
            ..Default::default()
        };
        assert_eq!(release.profile_name(&config), "release");

        let mut configured = Config::default();
        configured.build.profile = Some("release".to_string());
        assert_eq!(BuildOptions::default().profile_name(&configured), "release");
    }
}
