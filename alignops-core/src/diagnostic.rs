//! Per-stem diagnostics collected across pipeline stages.
//!
//! A diagnostic never aborts a batch. Collections keep their entries sorted so
//! that merging results from parallel workers yields the same output in any
//! order.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Severity of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Recorded, the stem continues (or was never a candidate)
    Warning,
    /// The stem is excluded from later stages
    Error,
}

/// Kind of problem a diagnostic reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Audio file without a transcript
    MissingTranscript,
    /// Transcript file without audio
    MissingAudio,
    /// Two files in one directory share a case-folded stem
    DuplicateStem,
    /// Audio file has zero bytes
    ZeroByteAudio,
    /// Audio file is not a readable WAV file
    UnreadableAudio,
    /// Transcript file could not be read as UTF-8 text
    UnreadableTranscript,
    /// Transcript has no alphabetic content
    EmptyTranscript,
    /// Aligner failed or timed out before producing this stem
    AlignerInvocation,
    /// Aligner completed but produced nothing for this stem
    MissingOutput,
    /// Annotation file violates the format or its own declarations
    MalformedAnnotation,
    /// Gap or overlap between adjacent intervals
    Contiguity,
    /// Tier bounds differ from the file bounds
    TierExtent,
    /// Tier kind that carries no intervals (point tier)
    UnsupportedTier,
    /// Parsed annotation with no tier left to analyze
    EmptyAnnotation,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::ZeroByteAudio
            | Self::UnreadableAudio
            | Self::UnreadableTranscript
            | Self::EmptyTranscript
            | Self::AlignerInvocation
            | Self::MalformedAnnotation => Severity::Error,
            _ => Severity::Warning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingTranscript => "missing-transcript",
            Self::MissingAudio => "missing-audio",
            Self::DuplicateStem => "duplicate-stem",
            Self::ZeroByteAudio => "zero-byte-audio",
            Self::UnreadableAudio => "unreadable-audio",
            Self::UnreadableTranscript => "unreadable-transcript",
            Self::EmptyTranscript => "empty-transcript",
            Self::AlignerInvocation => "aligner-invocation",
            Self::MissingOutput => "missing-output",
            Self::MalformedAnnotation => "malformed-annotation",
            Self::Contiguity => "contiguity",
            Self::TierExtent => "tier-extent",
            Self::UnsupportedTier => "unsupported-tier",
            Self::EmptyAnnotation => "empty-annotation",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem attached to one stem.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub stem: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, stem: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            stem: stem.into(),
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Emit the diagnostic as a tracing event.
    pub fn trace(&self) {
        match self.severity() {
            Severity::Warning => {
                tracing::warn!(kind = %self.kind, stem = %self.stem, "{}", self.message)
            }
            Severity::Error => {
                tracing::error!(kind = %self.kind, stem = %self.stem, "{}", self.message)
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity() {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{tag}[{}] {}: {}", self.kind, self.stem, self.message)
    }
}

/// Sorted diagnostic collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping (kind, stem, message) order.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.trace();
        let at = self.entries.partition_point(|d| d <= &diagnostic);
        self.entries.insert(at, diagnostic);
    }

    pub fn merge(&mut self, other: Diagnostics) {
        for diagnostic in other.entries {
            let at = self.entries.partition_point(|d| d <= &diagnostic);
            self.entries.insert(at, diagnostic);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn warnings(&self) -> usize {
        self.count_severity(Severity::Warning)
    }

    pub fn errors(&self) -> usize {
        self.count_severity(Severity::Error)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Per-kind counts, omitting kinds with no entries.
    pub fn counts(&self) -> BTreeMap<DiagnosticKind, usize> {
        let mut counts = BTreeMap::new();
        for d in &self.entries {
            *counts.entry(d.kind).or_insert(0) += 1;
        }
        counts
    }

    fn count_severity(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        let mut diagnostics = Self::new();
        diagnostics.extend(iter);
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Diagnostic> {
        vec![
            Diagnostic::new(DiagnosticKind::Contiguity, "b", "gap"),
            Diagnostic::new(DiagnosticKind::MissingTranscript, "c", "no transcript"),
            Diagnostic::new(DiagnosticKind::EmptyTranscript, "a", "empty"),
        ]
    }

    #[test]
    fn merge_is_order_independent() {
        let items = sample();

        let mut forward = Diagnostics::new();
        forward.merge(items.iter().cloned().take(1).collect());
        forward.merge(items.iter().cloned().skip(1).collect());

        let mut backward = Diagnostics::new();
        backward.merge(items.iter().cloned().rev().take(2).collect());
        backward.merge(items.iter().cloned().take(1).collect());

        assert_eq!(forward, backward);
    }

    #[test]
    fn counts_by_severity() {
        let diagnostics: Diagnostics = sample().into_iter().collect();

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.warnings(), 2);
        assert_eq!(diagnostics.errors(), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::Contiguity), 1);
    }

    #[test]
    fn display_includes_kind_and_stem() {
        let d = Diagnostic::new(DiagnosticKind::MissingOutput, "A", "no TextGrid");
        assert_eq!(d.to_string(), "warning[missing-output] A: no TextGrid");
    }
}
