//! End-to-end driver: pair → prepare → align → parse → analyze → report.

use crate::aligner::{AlignRequest, Aligner, AlignerStatus, clear_annotations, collect_outputs};
use crate::analysis::{AlignmentStats, AnalysisConfig, DatasetStats, analyze};
use crate::dataset::PreparedDataset;
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{PairingError, ReportError, Result};
use crate::pairing::{PairingConfig, pair};
use crate::pool;
use crate::report::{REPORT_CSV, RowWriter, SUMMARY_JSON, Summary};
use crate::textgrid::{self, DEFAULT_EPSILON};
use crate::types::MediaStem;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-stage stem counts plus diagnostic totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub found: usize,
    pub submitted: usize,
    pub aligned: usize,
    pub parsed: usize,
    pub analyzed: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl Tally {
    /// Take warning and error totals from `diagnostics`.
    pub fn with_diagnostics(self, diagnostics: &Diagnostics) -> Self {
        Self {
            warnings: diagnostics.warnings(),
            errors: diagnostics.errors(),
            ..self
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found={} submitted={} aligned={} parsed={} analyzed={} warnings={} errors={}",
            self.found,
            self.submitted,
            self.aligned,
            self.parsed,
            self.analyzed,
            self.warnings,
            self.errors
        )
    }
}

/// Parse and analysis options.
#[derive(Clone, Debug)]
pub struct AnalyzeOptions {
    pub analysis: AnalysisConfig,
    /// Boundary tolerance in seconds
    pub epsilon: f64,
    pub jobs: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            epsilon: DEFAULT_EPSILON,
            jobs: pool::default_jobs(),
        }
    }
}

/// Aggregated result of parsing and analyzing a set of annotation files.
#[derive(Debug, Default)]
pub struct AnalysisOutcome {
    pub stats: DatasetStats,
    pub diagnostics: Diagnostics,
    pub parsed: usize,
    pub analyzed: usize,
    pub rows: usize,
}

/// Report file locations inside an output directory.
#[derive(Clone, Debug)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub summary: PathBuf,
}

impl ReportPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            csv: dir.join(REPORT_CSV),
            summary: dir.join(SUMMARY_JSON),
        }
    }
}

/// Parse and analyze `annotations`, streaming rows into `rows`.
///
/// Files are handled in batches of `jobs × 4`: each batch is parsed in
/// parallel, then folded in stem order, so the output does not depend on the
/// worker count.
pub fn analyze_annotations<W: Write>(
    mut annotations: Vec<(MediaStem, PathBuf)>,
    options: &AnalyzeOptions,
    rows: &mut RowWriter<W>,
) -> std::result::Result<AnalysisOutcome, ReportError> {
    annotations.sort_by_key(|(stem, _)| stem.key());

    let jobs = options.jobs.max(1);
    let batch_size = jobs * 4;
    let mut outcome = AnalysisOutcome::default();

    let mut pending = annotations.into_iter().peekable();
    while pending.peek().is_some() {
        let batch: Vec<_> = pending.by_ref().take(batch_size).collect();
        tracing::debug!(files = batch.len(), "analyzing batch");

        let results = pool::map(jobs, batch, |(stem, path)| analyze_one(&stem, &path, options));

        for result in results {
            match result {
                Ok((stats, warnings)) => {
                    outcome.parsed += 1;
                    outcome.diagnostics.extend(warnings);
                    if stats.tiers.is_empty() {
                        outcome.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::EmptyAnnotation,
                            stats.stem.as_str(),
                            "no interval tier left to analyze after tier filtering",
                        ));
                        continue;
                    }
                    rows.write_stats(&stats)?;
                    outcome.stats.add(&stats);
                    outcome.analyzed += 1;
                }
                Err(diagnostic) => outcome.diagnostics.push(diagnostic),
            }
        }
    }

    outcome.rows = rows.rows();
    tracing::info!(
        parsed = outcome.parsed,
        analyzed = outcome.analyzed,
        rows = outcome.rows,
        "analysis complete"
    );

    Ok(outcome)
}

fn analyze_one(
    stem: &MediaStem,
    path: &Path,
    options: &AnalyzeOptions,
) -> std::result::Result<(AlignmentStats, Vec<Diagnostic>), Diagnostic> {
    let parsed = textgrid::read_file(path, options.epsilon).map_err(|e| {
        Diagnostic::new(
            DiagnosticKind::MalformedAnnotation,
            stem.as_str(),
            format!("{:?}: {e}", path.display()),
        )
    })?;

    let stats = analyze(&parsed.file, &options.analysis);
    Ok((stats, parsed.warnings))
}

/// Full pipeline configuration.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub pairing: PairingConfig,
    /// Where the prepared dataset is written
    pub dataset_dir: PathBuf,
    /// Replace a non-empty dataset directory
    pub force: bool,
    pub dictionary: String,
    pub acoustic_model: String,
    /// Aligner output; reports are written here too
    pub output_dir: PathBuf,
    pub timeout: Option<std::time::Duration>,
    pub analyze: AnalyzeOptions,
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct RunReport {
    pub tally: Tally,
    pub stats: DatasetStats,
    pub diagnostics: Diagnostics,
    pub status: AlignerStatus,
    pub log_path: Option<PathBuf>,
    pub reports: ReportPaths,
}

impl RunReport {
    /// At least one stem was lost to an aligner failure.
    pub fn aligner_failed(&self) -> bool {
        self.diagnostics.count(DiagnosticKind::AlignerInvocation) > 0
    }
}

/// Pipeline over a concrete aligner.
pub struct Pipeline<A: Aligner> {
    aligner: A,
    config: PipelineConfig,
}

impl<A: Aligner> Pipeline<A> {
    pub fn new(aligner: A, config: PipelineConfig) -> Self {
        Self { aligner, config }
    }

    pub fn aligner(&self) -> &A {
        &self.aligner
    }

    /// Run every stage on `audio_dir` and `transcript_dir`.
    ///
    /// # Errors
    ///
    /// Fails only when nothing can proceed: no valid pairs, the aligner could
    /// not run or produced nothing, or an output location is not writable.
    pub fn run(&self, audio_dir: &Path, transcript_dir: &Path) -> Result<RunReport> {
        let config = &self.config;
        let mut diagnostics = Diagnostics::new();
        let mut tally = Tally::default();

        let pairing = pair(audio_dir, transcript_dir, config.pairing)?;
        diagnostics.merge(pairing.diagnostics);
        tally.found = pairing.samples.len();
        if pairing.samples.is_empty() {
            return Err(PairingError::NoValidPairs.into());
        }

        let dataset = PreparedDataset::write(&config.dataset_dir, &pairing.samples, config.force)?;
        tally.submitted = dataset.len();

        let request = AlignRequest {
            dataset_dir: dataset.dir.clone(),
            dictionary: config.dictionary.clone(),
            acoustic_model: config.acoustic_model.clone(),
            output_dir: config.output_dir.clone(),
            timeout: config.timeout,
        };
        tracing::info!(
            aligner = self.aligner.name(),
            stems = dataset.len(),
            "submitting batch"
        );
        clear_annotations(&config.output_dir)?;
        let run = self.aligner.align(&request)?;
        let outcome = collect_outputs(run, &dataset.stems)?;
        diagnostics.merge(outcome.diagnostics);
        tally.aligned = outcome.produced.len();

        let reports = ReportPaths::in_dir(&config.output_dir);
        let mut rows = RowWriter::create(&reports.csv)?;
        let analysis = analyze_annotations(outcome.produced, &config.analyze, &mut rows)?;
        rows.finish()?;
        diagnostics.merge(analysis.diagnostics);
        tally.parsed = analysis.parsed;
        tally.analyzed = analysis.analyzed;

        let tally = tally.with_diagnostics(&diagnostics);
        Summary::new(tally, &analysis.stats, &diagnostics).write(&reports.summary)?;

        tracing::info!(%tally, "pipeline complete");

        Ok(RunReport {
            tally,
            stats: analysis.stats,
            diagnostics,
            status: outcome.status,
            log_path: outcome.log_path,
            reports,
        })
    }
}
