//! modvet CLI binary entry point.
//! Resolves configuration, runs the selected validators and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use modvet::cli::{Cli, Commands, RunArgs};
use modvet::orchestrator::{Orchestrator, RunOptions};
use modvet::progress::ProgressHub;
use modvet::report::Report;
use modvet::schema::VendoredSchemas;
use modvet::targets::IgnoreSet;
use modvet::validators::{self, SchemaSources};
use modvet::{config, output, utils};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", utils::error_prefix(), e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match cli.verbose {
        0 if cli.quiet => EnvFilter::new("error"),
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(cli.verbose >= 2),
        )
        .init();
}

fn run(cli: Cli) -> Result<u8> {
    let (names, args) = match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return Ok(0);
        }
        Commands::Validate {
            validators,
            list,
            run,
        } => {
            if list {
                let eff = config::resolve_effective(run.repo_root.as_deref(), run.output.as_deref(), None)?;
                output::print_validators(&eff.output);
                return Ok(0);
            }
            (validators, run)
        }
        Commands::Metadata { run } => (vec![validators::metadata::GROUP.to_string()], run),
        Commands::Tasks { run } => (vec![validators::tasks::GROUP.to_string()], run),
        Commands::Plans { run } => (vec![validators::plans::GROUP.to_string()], run),
    };
    validate(&names, &args)
}

fn validate(names: &[String], args: &RunArgs) -> Result<u8> {
    let eff = config::resolve_effective(
        args.repo_root.as_deref(),
        args.output.as_deref(),
        args.parallel.then_some(true),
    )?;
    if !eff.config_found && eff.output != "json" {
        eprintln!(
            "{} No modvet.toml found; using defaults.",
            utils::note_prefix()
        );
    }

    let ignore = IgnoreSet::load(&eff.repo_root, &eff.ignore).context("invalid ignore pattern")?;
    let sources = SchemaSources {
        fetcher: Arc::new(VendoredSchemas::new(&eff.cache_dir)),
        task_url: eff.task_schema_url.clone(),
        plan_url: eff.plan_schema_url.clone(),
    };
    let selected = validators::select(names, &sources)?;

    let interactive = !args.no_progress && eff.output != "json" && std::io::stderr().is_terminal();
    debug!(interactive, parallel = eff.parallel, root = %eff.repo_root.display(), "starting run");
    let orchestrator = Orchestrator::new(selected, Arc::new(ProgressHub::new(interactive)));

    let report = Report::new();
    let opts = RunOptions {
        root: eff.repo_root.clone(),
        parallel: eff.parallel,
        ignore: Arc::new(ignore),
        pattern_overrides: eff.pattern_overrides.clone(),
    };
    let code = orchestrator.run(&report, &opts)?;
    output::print_report(&report, &eff.output);
    Ok(u8::try_from(code).unwrap_or(1))
}
