//! Transcript normalization to single-line aligner labels.
//!
//! Multi-line narrative transcripts are joined into one whitespace-collapsed
//! line. A transcript that is already a single line is only trimmed, so short
//! pre-uppercased utterances reach the aligner exactly as written. Casing and
//! punctuation are never touched here: matching them is the pronunciation
//! dictionary's job.

use crate::error::PairingError;
use crate::types::MediaStem;
use std::path::Path;

/// Transcript file extensions accepted as input (compared case-insensitively).
pub const TRANSCRIPT_EXTENSIONS: &[&str] = &["txt", "lab"];

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Normalize transcript lines into a single label line.
///
/// Returns `None` when no line has content, or when the content has no
/// alphabetic character (whitespace and punctuation only).
pub fn normalize<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    let non_empty: Vec<&str> = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .collect();

    let text = match non_empty.as_slice() {
        [] => return None,
        [single] => (*single).to_string(),
        many => many
            .iter()
            .flat_map(|line| line.split_whitespace())
            .collect::<Vec<_>>()
            .join(" "),
    };

    text.chars().any(char::is_alphabetic).then_some(text)
}

/// A transcript file's lines and its derived label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptRecord {
    stem: MediaStem,
    raw_text: Vec<String>,
    normalized_text: String,
}

impl TranscriptRecord {
    /// Build a record, normalizing `raw_text` once.
    ///
    /// # Errors
    ///
    /// Returns [`PairingError::EmptyTranscript`] when normalization yields
    /// nothing.
    pub fn new(stem: MediaStem, raw_text: Vec<String>) -> Result<Self, PairingError> {
        let normalized_text = normalize(&raw_text).ok_or_else(|| PairingError::EmptyTranscript {
            stem: stem.to_string(),
        })?;

        Ok(Self {
            stem,
            raw_text,
            normalized_text,
        })
    }

    /// Read a UTF-8 transcript file, dropping a leading byte order mark.
    pub fn read(stem: MediaStem, path: &Path) -> Result<Self, PairingError> {
        let content = std::fs::read_to_string(path).map_err(|e| PairingError::io(path, e))?;
        let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&content);
        let lines = content.lines().map(str::to_string).collect();

        Self::new(stem, lines)
    }

    pub fn stem(&self) -> &MediaStem {
        &self.stem
    }

    pub fn raw_text(&self) -> &[String] {
        &self.raw_text
    }

    pub fn normalized_text(&self) -> &str {
        &self.normalized_text
    }

    /// Number of lines with content.
    pub fn content_lines(&self) -> usize {
        self.raw_text.iter().filter(|l| !l.trim().is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_multiline_paragraphs() {
        let lines = [
            "  WANTED: CHIEF JUSTICE OF THE  ",
            "",
            "MASSACHUSETTS\tSUPREME COURT.",
            "In the absence of a  bill,",
        ];

        let result = normalize(&lines).unwrap();

        assert_eq!(
            result,
            "WANTED: CHIEF JUSTICE OF THE MASSACHUSETTS SUPREME COURT. In the absence of a bill,"
        );
    }

    #[test]
    fn single_line_is_only_trimmed() {
        let lines = ["", "  I SAID  WHITE NOT BAIT ", ""];

        let result = normalize(&lines).unwrap();

        // internal spacing of a single utterance line is preserved
        assert_eq!(result, "I SAID  WHITE NOT BAIT");
    }

    #[test]
    fn single_line_is_idempotent() {
        let once = normalize(&["  Hello, World.  "]).unwrap();
        let twice = normalize(&[once.as_str()]).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn multiline_result_is_fixed_point() {
        let once = normalize(&["one  two", "three"]).unwrap();
        let twice = normalize(&[once.as_str()]).unwrap();

        assert_eq!(once, "one two three");
        assert_eq!(once, twice);
    }

    #[test]
    fn keeps_casing_and_punctuation() {
        let result = normalize(&["Mixed Case,", "and UPPER!"]).unwrap();
        assert_eq!(result, "Mixed Case, and UPPER!");
    }

    #[test]
    fn rejects_blank_lines() {
        assert_eq!(normalize(&["", "   ", "\t"]), None);
        assert_eq!(normalize::<&str>(&[]), None);
    }

    #[test]
    fn rejects_punctuation_only() {
        assert_eq!(normalize(&["...", " - ,"]), None);
    }

    #[test]
    fn record_reports_empty_transcript() {
        let result = TranscriptRecord::new(MediaStem::new("B"), vec![" ".to_string()]);

        assert!(matches!(
            result,
            Err(PairingError::EmptyTranscript { stem }) if stem == "B"
        ));
    }

    #[test]
    fn reads_file_with_bom_and_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.TXT");
        std::fs::write(&path, "\u{feff}FIRST LINE\r\nsecond line\r\n").unwrap();

        let record = TranscriptRecord::read(MediaStem::new("A"), &path).unwrap();

        assert_eq!(record.normalized_text(), "FIRST LINE second line");
        assert_eq!(record.content_lines(), 2);
        assert_eq!(record.raw_text().len(), 2);
    }
}
