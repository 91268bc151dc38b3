//! Run subcommand - validate, prepare, align and analyze in one go.

use crate::align;
use crate::analyze::print_report_paths;
use crate::config::{
    AlignerArgs, AlignerConfig, AnalysisArgs, DEFAULT_DATASET_DIR, DEFAULT_OUTPUT_DIR, DatasetArgs,
    JobsArgs, ModelArgs,
};
use crate::exit_codes::ExitCode;
use crate::output;
use alignops_core::error::{Error, PairingError};
use alignops_core::pairing::PairingConfig;
use alignops_core::pipeline::{Pipeline, PipelineConfig};
use alignops_core::report::render_table;
use alignops_mfa::align::MfaAligner;
use color_eyre::Section;
use eyre::{Result, eyre};
use std::path::PathBuf;

/// CLI arguments for the full pipeline.
#[derive(clap::Args, Debug)]
pub struct Args {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Prepared dataset directory
    #[arg(long, default_value = DEFAULT_DATASET_DIR)]
    pub dataset_dir: PathBuf,

    /// Aligner output and report directory
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Replace the dataset directory if it is not empty
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub models: ModelArgs,

    #[command(flatten)]
    pub aligner: AlignerArgs,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[command(flatten)]
    pub jobs: JobsArgs,
}

/// Resolved configuration for the full pipeline.
#[derive(Debug)]
pub struct Config {
    pub audio_dir: PathBuf,
    pub transcript_dir: PathBuf,
    pub aligner: MfaAligner,
    pub pipeline: PipelineConfig,
    pub top: usize,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let jobs = args.jobs.resolve()?;
        let AlignerConfig { aligner, timeout } = args.aligner.try_into()?;
        let top = args.analysis.top;

        Ok(Self {
            audio_dir: args.dataset.audio_dir,
            transcript_dir: args.dataset.transcript_dir,
            aligner,
            pipeline: PipelineConfig {
                pairing: PairingConfig { jobs },
                dataset_dir: args.dataset_dir,
                force: args.force,
                dictionary: args.models.dictionary,
                acoustic_model: args.models.acoustic_model,
                output_dir: args.output_dir,
                timeout,
                analyze: args.analysis.resolve(jobs)?,
            },
            top,
        })
    }
}

pub fn execute(config: Config) -> Result<ExitCode> {
    tracing::info!(
        audio = ?config.audio_dir.display(),
        transcripts = ?config.transcript_dir.display(),
        output = ?config.pipeline.output_dir.display(),
        "running pipeline"
    );

    let pipeline = Pipeline::new(config.aligner, config.pipeline);
    let report = pipeline
        .run(&config.audio_dir, &config.transcript_dir)
        .map_err(explain)?;

    print!("{}", render_table(&report.stats, config.top));
    output::print_diagnostics(&report.diagnostics);
    if let Some(log) = &report.log_path {
        println!("aligner {}; log: {:?}", report.status, log.display());
    }
    print_report_paths(&report.reports);
    output::print_tally(&report.tally);

    if report.aligner_failed() {
        Ok(ExitCode::AlignerFailed)
    } else {
        Ok(ExitCode::Success)
    }
}

fn explain(e: Error) -> eyre::Report {
    match e {
        Error::Pairing(PairingError::NoValidPairs) => eyre!("no valid audio/transcript pairs found")
            .suggestion("run `alignops validate` to see why each file was excluded"),
        Error::Pairing(PairingError::DatasetExists(dir)) => {
            eyre!("dataset directory is not empty: {:?}", dir.display())
                .suggestion("pass --force to replace it")
        }
        Error::Aligner(e) => align::explain(e),
        e => eyre::Report::new(e),
    }
}
