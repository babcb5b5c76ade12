//! `october-build init` command

use anyhow::Result;

use crate::cli::InitArgs;
use october_build::ops::{init_project, InitOptions};
use october_build::util::GlobalContext;

pub fn execute(gctx: &GlobalContext, args: InitArgs) -> Result<()> {
    let path = match args.path {
        Some(path) if path.is_absolute() => path,
        Some(path) => gctx.cwd().join(path),
        None => gctx.cwd().to_path_buf(),
    };

    let result = init_project(&path, &InitOptions { name: args.name })?;

    eprintln!(
        "     Created `{}` with extension `{}`",
        result.package, result.module
    );
    if result.with_scanner {
        eprintln!("        Note: src/scanner.c listed as a source");
    }

    Ok(())
}
