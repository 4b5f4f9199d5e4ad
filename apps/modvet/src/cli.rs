//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "modvet",
    version,
    about = "Validate module metadata, tasks and plans",
    long_about = "modvet — runs the metadata, task and plan validators over a module tree and reports one event per checked file.\n\nConfiguration precedence: CLI > modvet.toml > defaults.",
    after_help = "Examples:\n  modvet validate\n  modvet validate metadata plan-metadata-lint --parallel\n  modvet plans --output json\n  modvet validate --list",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Debug, Clone, Default)]
/// Flags shared by every validating subcommand.
pub struct RunArgs {
    #[arg(long, help = "Module root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Run validators concurrently, one thread each")]
    pub parallel: bool,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Disable the interactive progress display")]
    pub no_progress: bool,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current modvet version.")]
    Version,
    /// Run validators
    #[command(
        about = "Run validators",
        long_about = "Run every validator category, or only the named categories and phases. Any failure exits 1; a fatal error exits 2.",
        after_help = "Examples:\n  modvet validate\n  modvet validate tasks --parallel\n  modvet validate --list"
    )]
    Validate {
        #[arg(help = "Categories or phases to run (default: all)")]
        validators: Vec<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "List available validators and exit")]
        list: bool,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Validate metadata.json
    #[command(about = "Check metadata.json syntax and style")]
    Metadata {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Validate tasks/*.json
    #[command(about = "Check task metadata syntax, naming and style")]
    Tasks {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Validate plans/*.json
    #[command(about = "Check plan metadata style")]
    Plans {
        #[command(flatten)]
        run: RunArgs,
    },
}
