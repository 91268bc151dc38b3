//! Error types for alignops-core organized by pipeline stage.
//!
//! Only failures that stop a whole stage are errors. Problems confined to a
//! single stem are reported as [`crate::diagnostic::Diagnostic`] values instead.

use crate::aligner::AlignerStatus;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pipeline error variants organized by processing stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Dataset scanning and preparation stage error
    #[error(transparent)]
    Pairing(#[from] PairingError),

    /// External aligner stage error
    #[error(transparent)]
    Aligner(#[from] AlignerError),

    /// Report writing stage error
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Dataset scanning, transcript reading and dataset preparation errors.
#[derive(Debug, Error)]
pub enum PairingError {
    /// Input directory does not exist or is not a directory
    #[error("directory not found: {0:?}")]
    MissingDirectory(PathBuf),

    /// Transcript has no alphabetic content after normalization
    #[error("transcript for {stem:?} is empty")]
    EmptyTranscript { stem: String },

    /// No stem survived pairing and normalization
    #[error("no valid audio/transcript pairs found")]
    NoValidPairs,

    /// Prepared dataset directory already holds files
    #[error("dataset directory is not empty: {0:?}")]
    DatasetExists(PathBuf),

    /// IO error with the path that caused it
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// WAV header could not be read
    #[error(transparent)]
    Hound(#[from] hound::Error),
}

impl PairingError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// TextGrid parsing and validation errors.
///
/// Always confined to one file: the pipeline turns these into
/// `MalformedAnnotation` diagnostics rather than failing the batch.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// File header does not name a TextGrid text file
    #[error("not a TextGrid text file: {0}")]
    NotTextGrid(String),

    /// Token of the wrong kind at a given line
    #[error("line {line}: expected {expected}, found {found}")]
    Syntax {
        line: usize,
        expected: &'static str,
        found: String,
    },

    /// Input ended in the middle of a structure
    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof { expected: &'static str },

    /// Quoted string never closed
    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    /// Declared count is not a non-negative integer
    #[error("line {line}: invalid count {value}")]
    InvalidCount { line: usize, value: f64 },

    /// Tier interval count differs from the triples present
    #[error("tier {tier:?} declares {declared} intervals but contains {found}")]
    IntervalCountMismatch {
        tier: String,
        declared: usize,
        found: usize,
    },

    /// File tier count differs from the tiers present
    #[error("file declares {declared} tiers but contains {found}")]
    TierCountMismatch { declared: usize, found: usize },

    /// Interval ends before it starts
    #[error("tier {tier:?} interval {index}: end {end:.4} precedes start {start:.4}")]
    InvertedInterval {
        tier: String,
        index: usize,
        start: f64,
        end: f64,
    },

    /// Interval starts before its predecessor
    #[error("tier {tier:?} interval {index}: start {start:.4} precedes previous start {previous:.4}")]
    NonMonotonic {
        tier: String,
        index: usize,
        start: f64,
        previous: f64,
    },

    /// IO error while reading the file
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// External aligner errors that fail the whole batch.
#[derive(Debug, Error)]
pub enum AlignerError {
    /// Aligner executable could not be located
    #[error("aligner program not found: {program}")]
    NotFound { program: String },

    /// Aligner process could not be started
    #[error("failed to start aligner {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Aligner ran but produced nothing for any submitted stem
    #[error("aligner {status} and produced no annotation files ({expected} expected)")]
    NoOutputs {
        status: AlignerStatus,
        expected: usize,
    },

    /// IO error around the invocation (log file, output directory)
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AlignerError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Report writing errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// IO error while writing a report file
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Row stream write failure
    #[error("failed to write report row: {0}")]
    Write(#[from] std::io::Error),

    /// Summary serialization failure
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type alias for alignops-core operations.
pub type Result<T> = std::result::Result<T, Error>;

// Nested From implementations for automatic error conversion chains

// hound::Error → PairingError → Error
impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::Pairing(PairingError::Hound(e))
    }
}

// serde_json::Error → ReportError → Error
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Report(ReportError::Json(e))
    }
}
