//! WAV header probing.

use crate::error::PairingError;
use hound::{SampleFormat, WavReader};
use serde::Serialize;
use std::path::Path;

/// Audio file extensions accepted as input (compared case-insensitively).
pub const AUDIO_EXTENSIONS: &[&str] = &["wav"];

/// Header properties of a PCM waveform file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub float: bool,
    /// Duration in seconds
    pub duration: f64,
}

/// Read the WAV header of `path` without decoding samples.
///
/// # Errors
///
/// Returns error if the file cannot be opened or is not a RIFF/WAVE file.
pub fn probe(path: impl AsRef<Path>) -> Result<AudioInfo, PairingError> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    let duration = if spec.sample_rate == 0 {
        0.0
    } else {
        reader.duration() as f64 / spec.sample_rate as f64
    };

    let info = AudioInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        float: spec.sample_format == SampleFormat::Float,
        duration,
    };

    tracing::debug!(
        path = ?path.display(),
        duration = format!("{:.2}s", info.duration),
        channels = info.channels,
        sample_rate = info.sample_rate,
        bits_per_sample = info.bits_per_sample,
        "wav spec"
    );

    Ok(info)
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hound::WavWriter;

    pub(crate) fn create_test_wav(
        path: &Path,
        sample_rate: u32,
        channels: u16,
        samples: &[f32],
    ) -> hound::Result<()> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;
        for &sample in samples {
            writer.write_sample((sample * 32767.0) as i16)?;
        }
        writer.finalize()?;
        Ok(())
    }

    #[test]
    fn probes_mono_16khz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");

        create_test_wav(&path, 16000, 1, &[0.0; 8000]).unwrap();

        let info = probe(&path).unwrap();

        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.channels, 1);
        assert_eq!(info.bits_per_sample, 16);
        assert!(!info.float);
        assert!((info.duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn stereo_duration_counts_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");

        create_test_wav(&path, 8000, 2, &[0.1; 16000]).unwrap();

        let info = probe(&path).unwrap();

        assert_eq!(info.channels, 2);
        assert!((info.duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_wav_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.wav");
        std::fs::write(&path, b"definitely not RIFF").unwrap();

        let result = probe(&path);

        assert!(matches!(result, Err(PairingError::Hound(_))));
    }

    #[test]
    fn audio_extension_is_case_insensitive() {
        assert!(has_extension(Path::new("a/ISLE.WAV"), AUDIO_EXTENSIONS));
        assert!(has_extension(Path::new("a/isle.wav"), AUDIO_EXTENSIONS));
        assert!(!has_extension(Path::new("a/isle.txt"), AUDIO_EXTENSIONS));
        assert!(!has_extension(Path::new("a/isle"), AUDIO_EXTENSIONS));
    }
}
