//! `october-build toolchain` command

use std::path::Path;

use anyhow::Result;

use crate::cli::{ToolchainArgs, ToolchainCommands, ToolchainOverrideArgs};
use october_build::builder::detect_toolchain;
use october_build::core::Workspace;
use october_build::ops::workspace_toolchain_config;
use october_build::util::config::{is_relative_path, ToolchainConfig, ToolchainSettings};
use october_build::util::fs::relative_path;
use october_build::util::process::ProcessBuilder;
use october_build::util::GlobalContext;

pub fn execute(gctx: &GlobalContext, args: ToolchainArgs) -> Result<()> {
    match args.command.unwrap_or(ToolchainCommands::Show) {
        ToolchainCommands::Show => show_toolchain(gctx),
        ToolchainCommands::Override(override_args) => override_toolchain(gctx, override_args),
    }
}

fn show_toolchain(gctx: &GlobalContext) -> Result<()> {
    let config = match gctx.find_manifest() {
        Ok(manifest_path) => workspace_toolchain_config(gctx, &Workspace::new(&manifest_path)?),
        Err(_) => ToolchainConfig::load(&gctx.toolchain_config_path()).unwrap_or_default(),
    };

    println!("Toolchain:");
    println!();

    match detect_toolchain(&config) {
        Ok(toolchain) => {
            println!("  Platform: {}", toolchain.platform());
            println!("  CC:       {}", toolchain.compiler_path().display());

            let version = ProcessBuilder::new(toolchain.compiler_path())
                .arg("--version")
                .exec();
            if let Ok(output) = version {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if let Some(first_line) = stdout.lines().next() {
                    println!("            {}", first_line.trim());
                }
            }

            println!("  Objects:  .{}", toolchain.object_extension());
            println!("  Modules:  .{}", toolchain.module_extension());
        }
        Err(e) => println!("  CC:       not found ({})", e),
    }

    if config.has_overrides() {
        println!();
        println!("Overrides:");
        if let Some(cc) = &config.toolchain.cc {
            println!("  cc      = {}", cc.display());
        }
        if !config.toolchain.cflags.is_empty() {
            println!("  cflags  = {}", config.toolchain.cflags.join(" "));
        }
        if !config.toolchain.ldflags.is_empty() {
            println!("  ldflags = {}", config.toolchain.ldflags.join(" "));
        }
    }

    if let Ok(cc) = std::env::var("CC") {
        println!();
        println!("Environment:");
        println!("  CC={}", cc);
    }

    Ok(())
}

fn override_toolchain(gctx: &GlobalContext, args: ToolchainOverrideArgs) -> Result<()> {
    let manifest_path = gctx.find_manifest()?;
    let ws = Workspace::new(&manifest_path)?;
    let path = ws.toolchain_config_path();

    if args.clear {
        if path.exists() {
            std::fs::remove_file(&path)?;
            eprintln!("     Removed {}", path.display());
        }
        return Ok(());
    }

    let mut config = if path.exists() {
        ToolchainConfig::load(&path)?
    } else {
        ToolchainConfig::default()
    };
    // Stored relative to the project root, whatever directory it was given from.
    let cc = args.cc.map(|cc| {
        if is_relative_path(&cc) {
            let absolute = gctx.cwd().join(&cc);
            let absolute = absolute.canonicalize().unwrap_or(absolute);
            let relative = relative_path(ws.root(), &absolute);
            // `./cc`, so it is not mistaken for a program name on PATH
            if is_relative_path(&relative) {
                relative
            } else {
                Path::new(".").join(relative)
            }
        } else {
            cc
        }
    });

    config.merge(ToolchainConfig {
        toolchain: ToolchainSettings {
            cc,
            cflags: args.cflags,
            ldflags: args.ldflags,
        },
    });

    if !config.has_overrides() {
        anyhow::bail!("nothing to override; pass --cc, --cflag or --ldflag");
    }

    config.save(&path)?;
    eprintln!("       Wrote {}", path.display());

    Ok(())
}
