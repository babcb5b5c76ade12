//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// october-build - builds a tree-sitter grammar into a loadable module
#[derive(Parser)]
#[command(name = "october-build")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default October.toml for a grammar
    Init(InitArgs),

    /// Build the extension modules
    Build(BuildArgs),

    /// Show the compile/link commands for a target
    Flags(FlagsArgs),

    /// Write the C binding header for each target
    Header(HeaderArgs),

    /// Remove build artifacts
    Clean(CleanArgs),

    /// Toolchain management
    Toolchain(ToolchainArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Package name (defaults to directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Directory to initialize (defaults to current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Build in release mode
    #[arg(short, long)]
    pub release: bool,

    /// Build with a named profile
    #[arg(long, conflicts_with = "release")]
    pub profile: Option<String>,

    /// Specific targets to build
    #[arg(long)]
    pub target: Vec<String>,

    /// Emit compile_commands.json
    #[arg(long)]
    pub emit_compile_commands: bool,

    /// Emit build plan as JSON (no build)
    #[arg(long)]
    pub plan: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Target to show flags for
    pub target: String,

    /// Show compile commands only
    #[arg(long, conflicts_with = "link")]
    pub compile: bool,

    /// Show the link command only
    #[arg(long)]
    pub link: bool,

    /// Use the release profile
    #[arg(short, long)]
    pub release: bool,

    /// Use a named profile
    #[arg(long, conflicts_with = "release")]
    pub profile: Option<String>,
}

#[derive(Args)]
pub struct HeaderArgs {
    /// Specific targets (defaults to all)
    #[arg(long)]
    pub target: Vec<String>,

    /// Output directory (defaults to bindings/c)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Remove the whole .october directory, including project config
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct ToolchainArgs {
    #[command(subcommand)]
    pub command: Option<ToolchainCommands>,
}

#[derive(Subcommand)]
pub enum ToolchainCommands {
    /// Show the detected toolchain (default)
    Show,

    /// Override the toolchain for this project
    Override(ToolchainOverrideArgs),
}

#[derive(Args)]
pub struct ToolchainOverrideArgs {
    /// C compiler path
    #[arg(long)]
    pub cc: Option<PathBuf>,

    /// Flag added to every compile command (repeatable)
    #[arg(long = "cflag", allow_hyphen_values = true)]
    pub cflags: Vec<String>,

    /// Flag added to every link command (repeatable)
    #[arg(long = "ldflag", allow_hyphen_values = true)]
    pub ldflags: Vec<String>,

    /// Remove the project override
    #[arg(long, conflicts_with_all = ["cc", "cflags", "ldflags"])]
    pub clear: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
