//! `october-build clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use october_build::ops::clean;
use october_build::util::GlobalContext;

pub fn execute(gctx: &GlobalContext, args: CleanArgs) -> Result<()> {
    let manifest_path = gctx.find_manifest()?;

    match clean(&manifest_path, args.all)? {
        Some(dir) => eprintln!("     Removed {}", dir.display()),
        None => eprintln!("     Nothing to clean"),
    }

    Ok(())
}
