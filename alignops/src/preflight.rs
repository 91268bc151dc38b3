//! Preflight subcommand - check the environment before a run.

use crate::config::{DEFAULT_DATASET_DIR, DEFAULT_OUTPUT_DIR, DatasetArgs, ModelArgs, ProgramArgs};
use crate::exit_codes::ExitCode;
use alignops_mfa::align::MfaAligner;
use alignops_mfa::preflight::{self, MFA_ROOT_ENV, PreflightConfig, default_mfa_root};
use eyre::Result;
use std::path::PathBuf;

/// CLI arguments for the environment check.
#[derive(clap::Args, Debug)]
pub struct Args {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Prepared dataset directory
    #[arg(long, default_value = DEFAULT_DATASET_DIR)]
    pub dataset_dir: PathBuf,

    /// Aligner output directory
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub models: ModelArgs,

    #[command(flatten)]
    pub program: ProgramArgs,

    /// MFA data root (default: <Documents>/MFA)
    #[arg(long, env = MFA_ROOT_ENV)]
    pub mfa_root: Option<PathBuf>,

    /// Skip the Praat check
    #[arg(long)]
    pub no_praat: bool,

    /// Download the dictionary and acoustic model when missing
    #[arg(long)]
    pub download: bool,
}

/// Resolved configuration for the environment check.
#[derive(Debug)]
pub struct Config {
    pub aligner: MfaAligner,
    pub preflight: PreflightConfig,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        Ok(Self {
            aligner: MfaAligner::new(args.program.mfa_bin),
            preflight: PreflightConfig {
                audio_dir: args.dataset.audio_dir,
                transcript_dir: args.dataset.transcript_dir,
                dataset_dir: args.dataset_dir,
                output_dir: args.output_dir,
                dictionary: args.models.dictionary,
                acoustic_model: args.models.acoustic_model,
                mfa_root: args.mfa_root.or_else(default_mfa_root),
                check_praat: !args.no_praat,
                download_missing: args.download,
            },
        })
    }
}

pub fn execute(config: Config) -> Result<ExitCode> {
    let report = preflight::run(&config.aligner, &config.preflight);

    for check in &report.checks {
        println!("{check}");
        if let Some(hint) = &check.hint {
            println!("       -> {hint}");
        }
    }

    if report.passed() {
        println!("ready to run the alignment pipeline");
        Ok(ExitCode::Success)
    } else {
        let failed: Vec<_> = report.failures().map(|c| c.name.as_str()).collect();
        println!("critical checks failed: {}", failed.join(", "));
        Ok(ExitCode::GeneralError)
    }
}
