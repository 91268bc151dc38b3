//! Argument groups shared by several subcommands and their resolved forms.

use alignops_core::aligner::DEFAULT_MODEL;
use alignops_core::analysis::AnalysisConfig;
use alignops_core::pipeline::AnalyzeOptions;
use alignops_core::pool;
use alignops_core::textgrid::DEFAULT_EPSILON;
use alignops_mfa::align::{DEFAULT_PROGRAM, MfaAligner};
use eyre::{Result, ensure};
use std::path::PathBuf;
use std::time::Duration;

/// Default prepared dataset directory.
pub const DEFAULT_DATASET_DIR: &str = "mfa_data";

/// Default aligner output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output_textgrids";

/// Input directories.
#[derive(clap::Args, Clone, Debug)]
pub struct DatasetArgs {
    /// Directory of WAV files
    #[arg(long, default_value = "wav")]
    pub audio_dir: PathBuf,

    /// Directory of transcripts (.txt or .lab, any case)
    #[arg(long, default_value = "transcripts")]
    pub transcript_dir: PathBuf,
}

/// Pronunciation dictionary and acoustic model names.
#[derive(clap::Args, Clone, Debug)]
pub struct ModelArgs {
    /// Pronunciation dictionary name or path
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub dictionary: String,

    /// Acoustic model name or path
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub acoustic_model: String,
}

/// Aligner executable.
#[derive(clap::Args, Clone, Debug)]
pub struct ProgramArgs {
    /// Aligner executable
    #[arg(long, env = "ALIGNOPS_MFA_BIN", default_value = DEFAULT_PROGRAM)]
    pub mfa_bin: PathBuf,
}

/// Aligner invocation options.
#[derive(clap::Args, Clone, Debug)]
pub struct AlignerArgs {
    #[command(flatten)]
    pub program: ProgramArgs,

    /// Kill the aligner after this many seconds
    #[arg(long, env = "ALIGNOPS_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Pass --clean to the aligner (drop cached state from earlier runs)
    #[arg(long)]
    pub clean: bool,

    /// Number of jobs the aligner itself uses
    #[arg(short = 'j', long)]
    pub num_jobs: Option<usize>,

    /// Extra argument forwarded to the aligner (repeatable)
    #[arg(long = "aligner-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub aligner_args: Vec<String>,

    /// Aligner log file (default: <output dir>/alignops-mfa.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Resolved aligner configuration.
#[derive(Debug)]
pub struct AlignerConfig {
    pub aligner: MfaAligner,
    pub timeout: Option<Duration>,
}

impl TryFrom<AlignerArgs> for AlignerConfig {
    type Error = eyre::Error;

    fn try_from(args: AlignerArgs) -> Result<Self> {
        ensure!(args.timeout != Some(0), "--timeout must be at least 1 second");
        ensure!(args.num_jobs != Some(0), "--num-jobs must be at least 1");

        let aligner = MfaAligner::new(args.program.mfa_bin)
            .with_clean(args.clean)
            .with_num_jobs(args.num_jobs)
            .with_extra_args(args.aligner_args)
            .with_log_path(args.log_file);

        Ok(Self {
            aligner,
            timeout: args.timeout.map(Duration::from_secs),
        })
    }
}

/// Annotation parsing and statistics options.
#[derive(clap::Args, Clone, Debug)]
pub struct AnalysisArgs {
    /// Boundary tolerance in seconds for contiguity and ordering checks
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    pub epsilon: f64,

    /// Skip per-label statistics
    #[arg(long)]
    pub no_labels: bool,

    /// Only analyze this tier (repeatable)
    #[arg(long = "tier", value_name = "NAME")]
    pub tiers: Vec<String>,

    /// Also treat this label as silence (repeatable), e.g. sil or sp
    #[arg(long = "silence-label", value_name = "LABEL")]
    pub silence_labels: Vec<String>,

    /// Labels shown per tier in the summary table
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

impl AnalysisArgs {
    pub fn resolve(self, jobs: usize) -> Result<AnalyzeOptions> {
        ensure!(
            self.epsilon.is_finite() && self.epsilon > 0.0,
            "--epsilon must be a positive number of seconds, got {}",
            self.epsilon
        );

        Ok(AnalyzeOptions {
            analysis: AnalysisConfig {
                by_label: !self.no_labels,
                tiers: self.tiers,
                silence_labels: self.silence_labels,
            },
            epsilon: self.epsilon,
            jobs,
        })
    }
}

/// Worker threads for per-stem work.
#[derive(clap::Args, Clone, Debug)]
pub struct JobsArgs {
    /// Worker threads (default: available parallelism)
    #[arg(long)]
    pub jobs: Option<usize>,
}

impl JobsArgs {
    pub fn resolve(&self) -> Result<usize> {
        match self.jobs {
            Some(0) => eyre::bail!("--jobs must be at least 1"),
            Some(n) => Ok(n),
            None => Ok(pool::default_jobs()),
        }
    }
}
