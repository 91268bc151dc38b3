//! Audio/transcript pairing by case-folded stem.

use crate::audio::{self, AUDIO_EXTENSIONS};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::PairingError;
use crate::normalize::{TRANSCRIPT_EXTENSIONS, TranscriptRecord};
use crate::pool;
use crate::types::{MediaStem, PairedSample};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Pairing configuration.
#[derive(Clone, Copy, Debug)]
pub struct PairingConfig {
    /// Worker threads for per-stem checks
    pub jobs: usize,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            jobs: pool::default_jobs(),
        }
    }
}

/// Files of one kind found in a directory, keyed by case-folded stem.
#[derive(Debug, Default)]
pub struct DirectoryScan {
    pub files: BTreeMap<String, (MediaStem, PathBuf)>,
    pub diagnostics: Diagnostics,
}

/// Outcome of pairing two directories.
#[derive(Debug, Default)]
pub struct PairingReport {
    /// Paired samples sorted by stem key
    pub samples: Vec<PairedSample>,
    pub diagnostics: Diagnostics,
    pub audio_files: usize,
    pub transcript_files: usize,
}

impl PairingReport {
    /// Stems that survived pairing and normalization.
    pub fn found(&self) -> usize {
        self.samples.len()
    }
}

/// Scan `dir` (non-recursive) for files with one of `extensions`.
///
/// The first file in path order wins when two files fold to the same stem;
/// the others are reported as [`DiagnosticKind::DuplicateStem`].
pub fn scan_dir(dir: &Path, extensions: &[&str]) -> Result<DirectoryScan, PairingError> {
    if !dir.is_dir() {
        return Err(PairingError::MissingDirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| PairingError::io(dir, e))? {
        let path = entry.map_err(|e| PairingError::io(dir, e))?.path();
        if path.is_file() && audio::has_extension(&path, extensions) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut scan = DirectoryScan::default();
    for path in paths {
        let Some(stem) = MediaStem::from_path(&path) else {
            tracing::warn!(path = ?path.display(), "skipping file with non UTF-8 name");
            continue;
        };

        let key = stem.key();
        if let Some((_, kept)) = scan.files.get(&key) {
            scan.diagnostics.push(Diagnostic::new(
                DiagnosticKind::DuplicateStem,
                stem.as_str(),
                format!(
                    "{:?} ignored, stem already taken by {:?}",
                    path.display(),
                    kept.display()
                ),
            ));
            continue;
        }
        scan.files.insert(key, (stem, path));
    }

    Ok(scan)
}

/// Pair audio files with transcripts and normalize each transcript.
///
/// Unpaired files and per-stem problems are reported as diagnostics; only a
/// missing or unreadable directory fails.
pub fn pair(
    audio_dir: &Path,
    transcript_dir: &Path,
    config: PairingConfig,
) -> Result<PairingReport, PairingError> {
    let audio = scan_dir(audio_dir, AUDIO_EXTENSIONS)?;
    let transcripts = scan_dir(transcript_dir, TRANSCRIPT_EXTENSIONS)?;

    tracing::info!(
        audio = audio.files.len(),
        transcripts = transcripts.files.len(),
        "scanned dataset"
    );

    let mut report = PairingReport {
        audio_files: audio.files.len(),
        transcript_files: transcripts.files.len(),
        ..Default::default()
    };
    report.diagnostics.merge(audio.diagnostics);
    report.diagnostics.merge(transcripts.diagnostics);

    let mut candidates = Vec::new();
    for (key, (stem, audio_path)) in &audio.files {
        match transcripts.files.get(key) {
            Some((_, transcript_path)) => {
                candidates.push((stem.clone(), audio_path.clone(), transcript_path.clone()))
            }
            None => report.diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingTranscript,
                stem.as_str(),
                format!("no transcript for {:?}", audio_path.display()),
            )),
        }
    }

    for (key, (stem, transcript_path)) in &transcripts.files {
        if !audio.files.contains_key(key) {
            report.diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingAudio,
                stem.as_str(),
                format!("no audio for {:?}", transcript_path.display()),
            ));
        }
    }

    let checked = pool::map(config.jobs, candidates, |(stem, audio_path, transcript_path)| {
        check_candidate(stem, audio_path, &transcript_path)
    });

    for result in checked {
        match result {
            Ok(sample) => report.samples.push(sample),
            Err(diagnostic) => report.diagnostics.push(diagnostic),
        }
    }

    tracing::info!(
        paired = report.samples.len(),
        diagnostics = report.diagnostics.len(),
        "pairing complete"
    );

    Ok(report)
}

/// Validate one audio/transcript pair.
fn check_candidate(
    stem: MediaStem,
    audio_path: PathBuf,
    transcript_path: &Path,
) -> Result<PairedSample, Diagnostic> {
    let diagnostic = |kind, message: String| Diagnostic::new(kind, stem.as_str(), message);

    let size = std::fs::metadata(&audio_path)
        .map_err(|e| diagnostic(DiagnosticKind::UnreadableAudio, e.to_string()))?
        .len();
    if size == 0 {
        return Err(diagnostic(
            DiagnosticKind::ZeroByteAudio,
            format!("{:?} is empty", audio_path.display()),
        ));
    }

    let info = audio::probe(&audio_path).map_err(|e| {
        diagnostic(
            DiagnosticKind::UnreadableAudio,
            format!("{:?}: {e}", audio_path.display()),
        )
    })?;

    let record = TranscriptRecord::read(stem.clone(), transcript_path).map_err(|e| match e {
        PairingError::EmptyTranscript { .. } => diagnostic(
            DiagnosticKind::EmptyTranscript,
            format!("{:?} has no alphabetic content", transcript_path.display()),
        ),
        other => diagnostic(DiagnosticKind::UnreadableTranscript, other.to_string()),
    })?;

    Ok(PairedSample {
        transcript_lines: record.content_lines(),
        label_text: record.normalized_text().to_string(),
        stem,
        audio_path,
        audio: info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::create_test_wav;

    fn write_wav(dir: &Path, name: &str) {
        create_test_wav(&dir.join(name), 16000, 1, &[0.0; 1600]).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let wav = root.path().join("wav");
        let txt = root.path().join("transcripts");
        std::fs::create_dir_all(&wav).unwrap();
        std::fs::create_dir_all(&txt).unwrap();
        (root, wav, txt)
    }

    #[test]
    fn reports_audio_without_transcript() {
        let (_root, wav, txt) = fixture();
        write_wav(&wav, "A.wav");
        write_wav(&wav, "B.wav");
        std::fs::write(txt.join("A.txt"), "HELLO WORLD").unwrap();

        let report = pair(&wav, &txt, PairingConfig { jobs: 2 }).unwrap();

        match &report.samples[..] {
            [sample] => {
                assert_eq!(sample.stem.as_str(), "A");
                assert_eq!(sample.label_text, "HELLO WORLD");
            }
            _ => panic!("expected 1 sample, got {}", report.samples.len()),
        }

        let diagnostics: Vec<_> = report.diagnostics.iter().collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingTranscript);
        assert_eq!(diagnostics[0].stem, "B");
    }

    #[test]
    fn matches_stems_and_extensions_case_insensitively() {
        let (_root, wav, txt) = fixture();
        write_wav(&wav, "ISLE_Sess0131_BLOCKD02_01_sprt1.wav");
        std::fs::write(txt.join("isle_sess0131_blockd02_01_sprt1.TXT"), "I SAID WHITE").unwrap();

        let report = pair(&wav, &txt, PairingConfig::default()).unwrap();

        assert_eq!(report.found(), 1);
        assert_eq!(
            report.samples[0].stem.as_str(),
            "ISLE_Sess0131_BLOCKD02_01_sprt1"
        );
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn reports_transcript_without_audio() {
        let (_root, wav, txt) = fixture();
        std::fs::write(txt.join("C.txt"), "orphan").unwrap();

        let report = pair(&wav, &txt, PairingConfig::default()).unwrap();

        assert_eq!(report.found(), 0);
        assert_eq!(report.diagnostics.count(DiagnosticKind::MissingAudio), 1);
    }

    #[test]
    fn excludes_empty_transcript_and_zero_byte_audio() {
        let (_root, wav, txt) = fixture();
        write_wav(&wav, "A.wav");
        std::fs::write(wav.join("Z.wav"), b"").unwrap();
        std::fs::write(txt.join("A.txt"), "  \n\n ").unwrap();
        std::fs::write(txt.join("Z.txt"), "words").unwrap();

        let report = pair(&wav, &txt, PairingConfig { jobs: 1 }).unwrap();

        assert_eq!(report.found(), 0);
        assert_eq!(report.diagnostics.count(DiagnosticKind::EmptyTranscript), 1);
        assert_eq!(report.diagnostics.count(DiagnosticKind::ZeroByteAudio), 1);
        assert_eq!(report.diagnostics.errors(), 2);
    }

    #[test]
    fn flags_duplicate_stems() {
        let (_root, _wav, txt) = fixture();
        std::fs::write(txt.join("A.txt"), "one").unwrap();
        std::fs::write(txt.join("a.lab"), "two").unwrap();

        let scan = scan_dir(&txt, TRANSCRIPT_EXTENSIONS).unwrap();

        assert_eq!(scan.files.len(), 1);
        assert_eq!(scan.diagnostics.count(DiagnosticKind::DuplicateStem), 1);
    }

    #[test]
    fn ignores_other_extensions() {
        let (_root, wav, _txt) = fixture();
        write_wav(&wav, "A.wav");
        std::fs::write(wav.join("notes.md"), "x").unwrap();

        let scan = scan_dir(&wav, AUDIO_EXTENSIONS).unwrap();

        assert_eq!(scan.files.len(), 1);
        assert!(scan.files.contains_key("a"));
    }

    #[test]
    fn fails_on_missing_directory() {
        let (root, wav, _txt) = fixture();
        let missing = root.path().join("nope");

        let result = pair(&wav, &missing, PairingConfig::default());

        assert!(matches!(result, Err(PairingError::MissingDirectory(_))));
    }

    #[test]
    fn records_multiline_shape() {
        let (_root, wav, txt) = fixture();
        write_wav(&wav, "F2BJRLP1.wav");
        std::fs::write(txt.join("F2BJRLP1.txt"), "line one\nline two\n").unwrap();

        let report = pair(&wav, &txt, PairingConfig::default()).unwrap();

        assert!(report.samples[0].is_multiline());
        assert_eq!(report.samples[0].label_text, "line one line two");
    }
}
