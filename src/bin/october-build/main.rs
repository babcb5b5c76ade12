//! october-build CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use october_build::builder::native::StepError;
use october_build::core::{ManifestError, TargetError};
use october_build::ops::UnknownTargetError;
use october_build::util::diagnostic::{emit, suggestions, Diagnostic};
use october_build::util::GlobalContext;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("october_build=debug")
    } else {
        EnvFilter::new("october_build=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut gctx = GlobalContext::new()?;
    gctx.set_verbose(cli.verbose);
    gctx.set_color(!cli.no_color);

    match cli.command {
        Commands::Init(args) => commands::init::execute(&gctx, args),
        Commands::Build(args) => commands::build::execute(&gctx, args),
        Commands::Flags(args) => commands::flags::execute(&gctx, args),
        Commands::Header(args) => commands::header::execute(&gctx, args),
        Commands::Clean(args) => commands::clean::execute(&gctx, args),
        Commands::Toolchain(args) => commands::toolchain::execute(&gctx, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, with suggestions for the failures users can act on.
fn report(err: &anyhow::Error, color: bool) {
    if let Some(e) = err.downcast_ref::<ManifestError>() {
        emit(
            &Diagnostic::error(e.to_string()).with_suggestion(suggestions::NO_MANIFEST),
            color,
        );
    } else if let Some(e) = err.downcast_ref::<TargetError>() {
        emit(&e.to_diagnostic(), color);
    } else if let Some(e) = err.downcast_ref::<UnknownTargetError>() {
        emit(
            &Diagnostic::error(e.to_string()).with_suggestion(suggestions::TARGET_NOT_FOUND),
            color,
        );
    } else if err.downcast_ref::<StepError>().is_some() {
        let mut diag = Diagnostic::error(err.to_string());
        for cause in err.chain().skip(1) {
            diag = diag.with_context(cause.to_string());
        }
        emit(&diag.with_suggestion(suggestions::BUILD_FAILED), color);
    } else {
        eprintln!("error: {:#}", err);
    }
}
