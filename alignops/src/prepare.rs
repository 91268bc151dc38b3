//! Prepare subcommand - write the aligner dataset directory.

use crate::config::{DEFAULT_DATASET_DIR, DatasetArgs, JobsArgs};
use crate::exit_codes::ExitCode;
use crate::output;
use crate::validate;
use alignops_core::dataset::PreparedDataset;
use alignops_core::error::PairingError;
use alignops_core::pipeline::Tally;
use alignops_core::types::PairedSample;
use color_eyre::Section;
use eyre::{Result, eyre};
use std::path::{Path, PathBuf};

/// CLI arguments for dataset preparation.
#[derive(clap::Args, Debug)]
pub struct Args {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Prepared dataset directory (<stem>.wav + <stem>.lab)
    #[arg(short, long, default_value = DEFAULT_DATASET_DIR)]
    pub output: PathBuf,

    /// Replace the output directory if it is not empty
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub jobs: JobsArgs,
}

/// Resolved configuration for dataset preparation.
#[derive(Debug)]
pub struct Config {
    pub validate: validate::Config,
    pub output: PathBuf,
    pub force: bool,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let validate = validate::Args {
            dataset: args.dataset,
            jobs: args.jobs,
        }
        .try_into()?;

        Ok(Self {
            validate,
            output: args.output,
            force: args.force,
        })
    }
}

pub fn execute(config: Config) -> Result<ExitCode> {
    let report = validate::pair_dataset(&config.validate)?;
    let dataset = write_dataset(&config.output, &report.samples, config.force)?;

    output::print_diagnostics(&report.diagnostics);
    println!("prepared {} stems in {:?}", dataset.len(), dataset.dir.display());

    let tally = Tally {
        found: report.found(),
        submitted: dataset.len(),
        ..Default::default()
    }
    .with_diagnostics(&report.diagnostics);
    output::print_tally(&tally);

    Ok(ExitCode::Success)
}

pub(crate) fn write_dataset(dir: &Path, samples: &[PairedSample], force: bool) -> Result<PreparedDataset> {
    match PreparedDataset::write(dir, samples, force) {
        Ok(dataset) => Ok(dataset),
        Err(PairingError::DatasetExists(dir)) => Err(eyre!(
            "dataset directory is not empty: {:?}",
            dir.display()
        ))
        .suggestion("pass --force to replace it"),
        Err(e) => Err(e.into()),
    }
}
