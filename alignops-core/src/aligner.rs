//! Aligner capability and output completeness check.
//!
//! The pipeline only knows an [`Aligner`] as "submit a prepared dataset, get a
//! status and an output directory back". [`collect_outputs`] then matches the
//! produced annotation files against the submitted stems.

use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::AlignerError;
use crate::textgrid::TEXTGRID_EXTENSION;
use crate::types::MediaStem;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pronunciation dictionary and acoustic model name.
pub const DEFAULT_MODEL: &str = "english_us_arpa";

/// One batch submission.
#[derive(Clone, Debug)]
pub struct AlignRequest {
    pub dataset_dir: PathBuf,
    pub dictionary: String,
    pub acoustic_model: String,
    pub output_dir: PathBuf,
    /// Kill the aligner after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl AlignRequest {
    pub fn new(dataset_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            dictionary: DEFAULT_MODEL.to_string(),
            acoustic_model: DEFAULT_MODEL.to_string(),
            output_dir: output_dir.into(),
            timeout: None,
        }
    }
}

/// How the aligner process ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlignerStatus {
    Completed,
    Failed { code: Option<i32> },
    TimedOut,
}

impl AlignerStatus {
    pub fn is_success(self) -> bool {
        self == Self::Completed
    }
}

impl fmt::Display for AlignerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Failed { code: Some(code) } => write!(f, "exited with status {code}"),
            Self::Failed { code: None } => f.write_str("was terminated by a signal"),
            Self::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Result of one aligner invocation.
#[derive(Clone, Debug)]
pub struct AlignerRun {
    pub status: AlignerStatus,
    /// Where annotation files were written
    pub output_dir: PathBuf,
    /// Captured aligner output, when the backend keeps one
    pub log_path: Option<PathBuf>,
}

/// External forced aligner.
pub trait Aligner: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &str;

    /// Run one blocking batch. Per-stem outcomes are derived afterwards from
    /// the output directory; `Err` means the batch could not run at all.
    fn align(&self, request: &AlignRequest) -> Result<AlignerRun, AlignerError>;
}

/// Submitted stems matched against produced annotation files.
#[derive(Debug)]
pub struct AlignmentOutcome {
    pub status: AlignerStatus,
    pub log_path: Option<PathBuf>,
    pub expected: usize,
    /// Annotation file per submitted stem that has one, sorted by stem key
    pub produced: Vec<(MediaStem, PathBuf)>,
    pub missing: Vec<MediaStem>,
    pub diagnostics: Diagnostics,
}

/// Recursively find annotation files under `dir`, keyed by case-folded stem.
pub fn find_annotations(dir: &Path) -> Result<BTreeMap<String, PathBuf>, AlignerError> {
    let mut found = BTreeMap::new();
    for path in annotation_paths(dir)? {
        if let Some(stem) = MediaStem::from_path(&path) {
            found.entry(stem.key()).or_insert(path);
        }
    }
    Ok(found)
}

/// Remove annotation files left under `dir` by an earlier run.
///
/// Call before invoking the aligner, or stale files are collected as output.
pub fn clear_annotations(dir: &Path) -> Result<usize, AlignerError> {
    let stale = annotation_paths(dir)?;
    for path in &stale {
        std::fs::remove_file(path).map_err(|e| AlignerError::io(path, e))?;
    }
    if !stale.is_empty() {
        tracing::info!(dir = ?dir.display(), removed = stale.len(), "cleared previous annotation files");
    }
    Ok(stale.len())
}

fn annotation_paths(dir: &Path) -> Result<Vec<PathBuf>, AlignerError> {
    let mut found = Vec::new();
    if dir.is_dir() {
        walk(dir, &mut found)?;
    }
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), AlignerError> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| AlignerError::io(dir, e))? {
        entries.push(entry.map_err(|e| AlignerError::io(dir, e))?.path());
    }
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk(&path, found)?;
        } else if crate::audio::has_extension(&path, &[TEXTGRID_EXTENSION]) {
            found.push(path);
        }
    }
    Ok(())
}

/// Check that every submitted stem has an annotation file.
///
/// A missing file is an aligner failure for that stem when the run did not
/// complete, and a missing-output warning when it did. A run that produced
/// nothing for any stem fails the batch.
pub fn collect_outputs(run: AlignerRun, submitted: &[MediaStem]) -> Result<AlignmentOutcome, AlignerError> {
    let mut annotations = find_annotations(&run.output_dir)?;

    let mut outcome = AlignmentOutcome {
        status: run.status,
        log_path: run.log_path,
        expected: submitted.len(),
        produced: Vec::new(),
        missing: Vec::new(),
        diagnostics: Diagnostics::new(),
    };

    for stem in submitted {
        match annotations.remove(&stem.key()) {
            Some(path) => outcome.produced.push((stem.clone(), path)),
            None => outcome.missing.push(stem.clone()),
        }
    }

    if outcome.produced.is_empty() && !submitted.is_empty() {
        return Err(AlignerError::NoOutputs {
            status: outcome.status,
            expected: outcome.expected,
        });
    }

    for stem in &outcome.missing {
        let diagnostic = if outcome.status.is_success() {
            Diagnostic::new(
                DiagnosticKind::MissingOutput,
                stem.as_str(),
                "aligner completed without writing an annotation file",
            )
        } else {
            Diagnostic::new(
                DiagnosticKind::AlignerInvocation,
                stem.as_str(),
                format!("aligner {} before writing an annotation file", outcome.status),
            )
        };
        outcome.diagnostics.push(diagnostic);
    }

    for path in annotations.values() {
        tracing::debug!(path = ?path.display(), "ignoring annotation for unsubmitted stem");
    }

    tracing::info!(
        status = %outcome.status,
        expected = outcome.expected,
        produced = outcome.produced.len(),
        missing = outcome.missing.len(),
        "aligner outputs collected"
    );

    Ok(outcome)
}
