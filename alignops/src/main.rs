//! alignops - forced-alignment workflow tool

use alignops::cli::{Cli, run_cli};
use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<std::process::ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.default_filter())),
        )
        .init();

    run_cli(cli).map(Into::into)
}
