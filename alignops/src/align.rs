//! Align subcommand - run the external aligner over a prepared dataset.

use crate::config::{AlignerArgs, AlignerConfig, DEFAULT_DATASET_DIR, DEFAULT_OUTPUT_DIR, ModelArgs};
use crate::exit_codes::ExitCode;
use crate::output;
use alignops_core::aligner::{
    AlignRequest, Aligner, AlignmentOutcome, clear_annotations, collect_outputs,
};
use alignops_core::dataset::PreparedDataset;
use alignops_core::diagnostic::DiagnosticKind;
use alignops_core::error::AlignerError;
use alignops_mfa::align::MfaAligner;
use color_eyre::Section;
use eyre::{Context, Result, eyre};
use std::path::PathBuf;

/// CLI arguments for alignment.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Prepared dataset directory
    #[arg(long, default_value = DEFAULT_DATASET_DIR)]
    pub dataset_dir: PathBuf,

    /// Directory the aligner writes TextGrids into
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub models: ModelArgs,

    #[command(flatten)]
    pub aligner: AlignerArgs,
}

/// Resolved configuration for alignment.
#[derive(Debug)]
pub struct Config {
    pub aligner: MfaAligner,
    pub request: AlignRequest,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let AlignerConfig { aligner, timeout } = args.aligner.try_into()?;

        Ok(Self {
            aligner,
            request: AlignRequest {
                dataset_dir: args.dataset_dir,
                dictionary: args.models.dictionary,
                acoustic_model: args.models.acoustic_model,
                output_dir: args.output_dir,
                timeout,
            },
        })
    }
}

pub fn execute(config: Config) -> Result<ExitCode> {
    let dataset = PreparedDataset::open(&config.request.dataset_dir)
        .wrap_err("failed to read prepared dataset")
        .suggestion("run `alignops prepare` first")?;

    if dataset.is_empty() {
        return Err(eyre!(
            "no <stem>.wav + <stem>.lab pairs in {:?}",
            dataset.dir.display()
        ))
        .suggestion("run `alignops prepare` first");
    }

    let outcome = run_aligner(&config.aligner, &config.request, &dataset)?;

    output::print_diagnostics(&outcome.diagnostics);
    println!(
        "expected={} produced={} missing={}",
        outcome.expected,
        outcome.produced.len(),
        outcome.missing.len()
    );

    Ok(exit_code(&outcome))
}

/// Invoke the aligner on `dataset` and check its outputs.
pub(crate) fn run_aligner(
    aligner: &MfaAligner,
    request: &AlignRequest,
    dataset: &PreparedDataset,
) -> Result<AlignmentOutcome> {
    clear_annotations(&request.output_dir).map_err(explain)?;
    let run = aligner.align(request).map_err(explain)?;
    let log_path = run.log_path.clone();

    let outcome = collect_outputs(run, &dataset.stems).map_err(explain);
    if let Some(log) = &log_path {
        println!("aligner log: {:?}", log.display());
    }

    match outcome {
        Ok(outcome) => Ok(outcome),
        Err(e) => match log_path {
            Some(log) => Err(e).note(format!("see the aligner log at {:?}", log.display())),
            None => Err(e),
        },
    }
}

pub(crate) fn exit_code(outcome: &AlignmentOutcome) -> ExitCode {
    if outcome.diagnostics.count(DiagnosticKind::AlignerInvocation) > 0 {
        ExitCode::AlignerFailed
    } else {
        ExitCode::Success
    }
}

/// Attach remediation hints to aligner errors.
pub(crate) fn explain(e: AlignerError) -> eyre::Report {
    match e {
        AlignerError::NotFound { program } => eyre!("aligner not found: {program}")
            .suggestion("conda install -c conda-forge montreal-forced-aligner")
            .note("or point ALIGNOPS_MFA_BIN / --mfa-bin at the mfa executable"),
        e @ AlignerError::NoOutputs { .. } => eyre::Report::new(e)
            .suggestion("check that the dictionary and acoustic model are installed (`alignops preflight`)"),
        e => eyre::Report::new(e),
    }
}
