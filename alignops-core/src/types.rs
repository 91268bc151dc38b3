//! Core types for alignops-core

use crate::audio::AudioInfo;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Base filename identifying one recording.
///
/// Keeps the spelling of the file it came from; joins between directories use
/// [`MediaStem::key`], which is case-folded.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MediaStem(String);

impl MediaStem {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Stem of a file path, if it has a UTF-8 one.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded join key.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for MediaStem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Audio file and normalized label that share a stem.
///
/// Only created when both files exist and the transcript normalizes to a
/// non-empty label.
#[derive(Clone, Debug)]
pub struct PairedSample {
    pub stem: MediaStem,
    pub audio_path: PathBuf,
    pub label_text: String,
    /// WAV header properties
    pub audio: AudioInfo,
    /// Number of non-empty lines in the source transcript
    pub transcript_lines: usize,
}

impl PairedSample {
    /// Multi-line narrative transcripts were joined during normalization.
    pub fn is_multiline(&self) -> bool {
        self.transcript_lines > 1
    }
}

/// Time span within a tier, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
    /// Empty for silence
    pub label: String,
}

impl Interval {
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_silence(&self) -> bool {
        self.label.trim().is_empty()
    }
}

/// Named, ordered track of intervals.
///
/// Contiguity and ordering are checked once by the parser; consumers can rely
/// on `start <= end` for every interval and non-decreasing start times.
#[derive(Clone, Debug, PartialEq)]
pub struct Tier {
    pub name: String,
    pub start: f64,
    pub end: f64,
    pub intervals: Vec<Interval>,
}

impl Tier {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Sum of empty-label interval durations.
    pub fn silence_duration(&self) -> f64 {
        self.intervals
            .iter()
            .filter(|i| i.is_silence())
            .map(Interval::duration)
            .sum()
    }
}

/// Parsed aligner output for one stem.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationFile {
    pub stem: MediaStem,
    pub start: f64,
    pub end: f64,
    pub tiers: Vec<Tier>,
}

impl AnnotationFile {
    pub fn total_duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }
}
