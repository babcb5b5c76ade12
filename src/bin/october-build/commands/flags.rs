//! `october-build flags` command

use anyhow::Result;

use crate::cli::FlagsArgs;
use october_build::ops::{flags, BuildOptions};
use october_build::util::GlobalContext;

pub fn execute(gctx: &GlobalContext, args: FlagsArgs) -> Result<()> {
    let manifest_path = gctx.find_manifest()?;

    let opts = BuildOptions {
        release: args.release,
        profile: args.profile,
        ..Default::default()
    };
    let commands = flags(gctx, &manifest_path, &args.target, &opts)?;

    if !args.link {
        println!("# Compile commands for `{}`:", commands.target);
        for step in &commands.compile {
            println!("{}", step.command);
        }
    }

    if !args.compile && !args.link {
        println!();
    }

    if !args.compile {
        println!("# Link command for `{}`:", commands.target);
        println!("{}", commands.link.command);
    }

    Ok(())
}
