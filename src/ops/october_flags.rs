//! Implementation of `october-build flags`.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::builder::plan::{CompileStep, LinkStep};
use crate::builder::{BuildContext, BuildPlan};
use crate::core::manifest::Manifest;
use crate::ops::october_build::{load_workspace, workspace_toolchain_config, BuildOptions, UnknownTargetError};
use crate::util::GlobalContext;

/// The exact commands a build would run for one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetCommands {
    pub target: String,
    pub compile: Vec<CompileStep>,
    pub link: LinkStep,
}

/// Compute the commands for `target` without checking that its sources
/// exist or running anything.
pub fn flags(
    gctx: &GlobalContext,
    manifest_path: &Path,
    target: &str,
    opts: &BuildOptions,
) -> Result<TargetCommands> {
    let (ws, _config) = load_workspace(gctx, manifest_path, opts)?;

    // Unknown names fail before a compiler is looked for.
    find_target(ws.manifest(), target)?;

    let ctx = BuildContext::new(&ws, &workspace_toolchain_config(gctx, &ws))?;
    target_commands(&ctx, ws.manifest(), target)
}

fn find_target<'a>(
    manifest: &'a Manifest,
    name: &str,
) -> Result<&'a crate::core::ExtensionTarget, UnknownTargetError> {
    manifest.target(name).ok_or_else(|| UnknownTargetError {
        name: name.to_string(),
        available: manifest.target_names().iter().map(|s| s.to_string()).collect(),
    })
}

pub(crate) fn target_commands(
    ctx: &BuildContext,
    manifest: &Manifest,
    name: &str,
) -> Result<TargetCommands> {
    let target = find_target(manifest, name)?;
    let plan = BuildPlan::new(ctx, &[target])?;

    let compile = plan.compile_steps_for(name).cloned().collect();
    let link = plan
        .link_step_for(name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no link step planned for `{}`", name))?;

    Ok(TargetCommands {
        target: name.to_string(),
        compile,
        link,
    })
}
