//! `october-build build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use october_build::ops::{build, repeated_targets, BuildOptions};
use october_build::util::diagnostic::{emit, Diagnostic};
use october_build::util::fs::relative_path;
use october_build::util::GlobalContext;

pub fn execute(gctx: &GlobalContext, args: BuildArgs) -> Result<()> {
    let manifest_path = gctx.find_manifest()?;

    for name in repeated_targets(&args.target) {
        emit(
            &Diagnostic::warning(format!("target `{}` given more than once", name)),
            gctx.color(),
        );
    }

    let opts = BuildOptions {
        release: args.release,
        profile: args.profile,
        targets: args.target,
        emit_compile_commands: args.emit_compile_commands,
        plan_only: args.plan,
        jobs: args.jobs,
        verbose: gctx.is_verbose(),
    };

    let result = build(gctx, &manifest_path, &opts)?;

    if let Some(plan) = result.plan {
        println!("{}", plan.to_json()?);
        return Ok(());
    }

    for artifact in &result.artifacts {
        let status = if artifact.fresh { "Fresh" } else { "Built" };
        eprintln!(
            "{:>12} `{}` -> {}",
            status,
            artifact.target,
            relative_path(gctx.cwd(), &artifact.path).display()
        );
    }

    Ok(())
}
