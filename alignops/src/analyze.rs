//! Analyze subcommand - parse TextGrids and write duration reports.

use crate::config::{AnalysisArgs, DEFAULT_OUTPUT_DIR, JobsArgs};
use crate::exit_codes::ExitCode;
use crate::output;
use alignops_core::aligner::find_annotations;
use alignops_core::diagnostic::Diagnostics;
use alignops_core::pipeline::{AnalysisOutcome, AnalyzeOptions, ReportPaths, Tally, analyze_annotations};
use alignops_core::report::{RowWriter, Summary, render_table};
use alignops_core::types::MediaStem;
use color_eyre::Section;
use eyre::{Context, Result, eyre};
use std::path::{Path, PathBuf};

/// CLI arguments for analysis.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Directory searched recursively for .TextGrid files
    #[arg(default_value = DEFAULT_OUTPUT_DIR)]
    pub input: PathBuf,

    /// Where report.csv and summary.json are written (default: input directory)
    #[arg(short, long)]
    pub report_dir: Option<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[command(flatten)]
    pub jobs: JobsArgs,
}

/// Resolved configuration for analysis.
#[derive(Debug)]
pub struct Config {
    pub input: PathBuf,
    pub report_dir: PathBuf,
    pub options: AnalyzeOptions,
    pub top: usize,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let jobs = args.jobs.resolve()?;
        let top = args.analysis.top;
        let report_dir = args.report_dir.unwrap_or_else(|| args.input.clone());

        Ok(Self {
            input: args.input,
            report_dir,
            options: args.analysis.resolve(jobs)?,
            top,
        })
    }
}

pub fn execute(config: Config) -> Result<ExitCode> {
    let annotations: Vec<_> = find_annotations(&config.input)
        .wrap_err("failed to scan annotation directory")?
        .into_values()
        .filter_map(|path| MediaStem::from_path(&path).map(|stem| (stem, path)))
        .collect();

    if annotations.is_empty() {
        return Err(eyre!("no TextGrid files in {:?}", config.input.display()))
            .suggestion("run `alignops align` first, or pass the aligner output directory");
    }

    let files = annotations.len();
    let (outcome, reports) = write_reports(annotations, &config.options, &config.report_dir)?;

    let tally = Tally {
        aligned: files,
        parsed: outcome.parsed,
        analyzed: outcome.analyzed,
        ..Default::default()
    }
    .with_diagnostics(&outcome.diagnostics);
    write_summary(&reports, tally, &outcome, &outcome.diagnostics)?;

    print!("{}", render_table(&outcome.stats, config.top));
    output::print_diagnostics(&outcome.diagnostics);
    print_report_paths(&reports);
    output::print_tally(&tally);

    Ok(ExitCode::Success)
}

/// Parse, analyze and write `report.csv` into `dir`.
pub(crate) fn write_reports(
    annotations: Vec<(MediaStem, PathBuf)>,
    options: &AnalyzeOptions,
    dir: &Path,
) -> Result<(AnalysisOutcome, ReportPaths)> {
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("failed to create report directory: {:?}", dir.display()))?;

    let reports = ReportPaths::in_dir(dir);
    let mut rows = RowWriter::create(&reports.csv)?;
    let outcome = analyze_annotations(annotations, options, &mut rows)?;
    rows.finish()?;

    Ok((outcome, reports))
}

pub(crate) fn write_summary(
    reports: &ReportPaths,
    tally: Tally,
    outcome: &AnalysisOutcome,
    diagnostics: &Diagnostics,
) -> Result<()> {
    Summary::new(tally, &outcome.stats, diagnostics)
        .write(&reports.summary)
        .wrap_err("failed to write summary")
}

pub(crate) fn print_report_paths(reports: &ReportPaths) {
    println!("report: {:?}", reports.csv.display());
    println!("summary: {:?}", reports.summary.display());
}
