//! Validate subcommand - pair audio and transcripts and report problems.

use crate::config::{DatasetArgs, JobsArgs};
use crate::exit_codes::ExitCode;
use crate::output;
use alignops_core::pairing::{PairingConfig, PairingReport, pair};
use alignops_core::types::PairedSample;
use color_eyre::Section;
use eyre::{Context, Result, eyre};
use std::path::PathBuf;

const PREVIEW_CHARS: usize = 50;

/// CLI arguments for dataset validation.
#[derive(clap::Args, Debug)]
pub struct Args {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    #[command(flatten)]
    pub jobs: JobsArgs,
}

/// Resolved configuration for dataset validation.
#[derive(Debug)]
pub struct Config {
    pub audio_dir: PathBuf,
    pub transcript_dir: PathBuf,
    pub pairing: PairingConfig,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        Ok(Self {
            audio_dir: args.dataset.audio_dir,
            transcript_dir: args.dataset.transcript_dir,
            pairing: PairingConfig {
                jobs: args.jobs.resolve()?,
            },
        })
    }
}

pub fn execute(config: Config) -> Result<ExitCode> {
    let report = pair_dataset(&config)?;

    println!(
        "audio files: {}  transcript files: {}  paired: {}",
        report.audio_files,
        report.transcript_files,
        report.found()
    );
    for sample in &report.samples {
        println!("  {}", describe(sample));
    }
    output::print_diagnostics(&report.diagnostics);
    println!(
        "warnings={} errors={}",
        report.diagnostics.warnings(),
        report.diagnostics.errors()
    );

    Ok(ExitCode::Success)
}

/// Pair the configured directories, failing when nothing pairs.
pub(crate) fn pair_dataset(config: &Config) -> Result<PairingReport> {
    tracing::info!(
        audio = ?config.audio_dir.display(),
        transcripts = ?config.transcript_dir.display(),
        "validating dataset"
    );

    let report = pair(&config.audio_dir, &config.transcript_dir, config.pairing)
        .wrap_err("failed to scan dataset")?;

    if report.samples.is_empty() {
        output::print_diagnostics(&report.diagnostics);
        return Err(eyre!("no valid audio/transcript pairs found"))
            .note(format!(
                "{} audio and {} transcript files scanned",
                report.audio_files, report.transcript_files
            ))
            .suggestion("stems must match ignoring case, e.g. wav/Utt1.wav and transcripts/utt1.TXT");
    }

    Ok(report)
}

fn describe(sample: &PairedSample) -> String {
    let shape = if sample.is_multiline() {
        format!("multi-line ({} lines)", sample.transcript_lines)
    } else {
        "single-line".to_string()
    };

    format!(
        "{:<32} {:>7.2}s {:>6} Hz {}ch  {:<22} {}",
        sample.stem.as_str(),
        sample.audio.duration,
        sample.audio.sample_rate,
        sample.audio.channels,
        shape,
        output::preview(&sample.label_text, PREVIEW_CHARS)
    )
}
