//! CLI argument definitions using clap.

use crate::exit_codes::ExitCode;
use clap::{ArgAction, Parser, Subcommand};
use eyre::Result;

#[derive(Debug, Parser)]
#[command(name = "alignops")]
#[command(about = "Prepare, run and analyze Montreal Forced Aligner batches")]
#[command(version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter used when RUST_LOG is unset.
    pub fn default_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Pair audio with transcripts and report problems
    Validate(crate::validate::Args),

    /// Write the aligner dataset (<stem>.wav + <stem>.lab)
    Prepare(crate::prepare::Args),

    /// Run the aligner over a prepared dataset
    Align(crate::align::Args),

    /// Parse TextGrids and write duration statistics
    Analyze(crate::analyze::Args),

    /// Validate, prepare, align and analyze in one run
    Run(crate::run::Args),

    /// Check the aligner, its models and the dataset directories
    Preflight(crate::preflight::Args),
}

/// Execute CLI command - separated for testing.
pub fn run_cli(cli: Cli) -> Result<ExitCode> {
    tracing::debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Validate(args) => dispatch(args, crate::validate::execute),
        Commands::Prepare(args) => dispatch(args, crate::prepare::execute),
        Commands::Align(args) => dispatch(args, crate::align::execute),
        Commands::Analyze(args) => dispatch(args, crate::analyze::execute),
        Commands::Run(args) => dispatch(args, crate::run::execute),
        Commands::Preflight(args) => dispatch(args, crate::preflight::execute),
    }
}

/// Resolve `args` and run the subcommand; rejected values exit like usage errors.
fn dispatch<A, C>(args: A, execute: fn(C) -> Result<ExitCode>) -> Result<ExitCode>
where
    C: TryFrom<A, Error = eyre::Error>,
{
    match C::try_from(args) {
        Ok(config) => execute(config),
        Err(e) => {
            eprintln!("error: {e:#}");
            Ok(ExitCode::InvalidArguments)
        }
    }
}
