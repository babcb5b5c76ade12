//! `october-build header` command

use anyhow::Result;

use crate::cli::HeaderArgs;
use october_build::ops::{write_headers, HeaderOptions};
use october_build::util::fs::relative_path;
use october_build::util::GlobalContext;

pub fn execute(gctx: &GlobalContext, args: HeaderArgs) -> Result<()> {
    let manifest_path = gctx.find_manifest()?;

    let output = args.output.map(|dir| {
        if dir.is_absolute() {
            dir
        } else {
            gctx.cwd().join(dir)
        }
    });

    let opts = HeaderOptions {
        targets: args.target,
        output,
    };

    for path in write_headers(&manifest_path, &opts)? {
        eprintln!("       Wrote {}", relative_path(gctx.cwd(), &path).display());
    }

    Ok(())
}
