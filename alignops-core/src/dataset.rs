//! Prepared dataset directory: one audio file and one `.lab` label per stem.

use crate::audio::AUDIO_EXTENSIONS;
use crate::error::PairingError;
use crate::pairing::scan_dir;
use crate::types::{MediaStem, PairedSample};
use std::path::{Path, PathBuf};

/// Label file extension written next to each audio file.
pub const LABEL_EXTENSION: &str = "lab";

/// Dataset directory ready for the aligner.
#[derive(Clone, Debug)]
pub struct PreparedDataset {
    pub dir: PathBuf,
    /// Stems with both audio and label, sorted by key
    pub stems: Vec<MediaStem>,
}

impl PreparedDataset {
    /// Write `samples` into `dir` as `<stem>.<audio ext>` + `<stem>.lab`.
    ///
    /// An existing non-empty `dir` is only replaced when `force` is set.
    pub fn write(dir: &Path, samples: &[PairedSample], force: bool) -> Result<Self, PairingError> {
        if dir.exists() && !is_empty_dir(dir)? {
            if !force {
                return Err(PairingError::DatasetExists(dir.to_path_buf()));
            }
            tracing::warn!(dir = ?dir.display(), "removing existing dataset directory");
            std::fs::remove_dir_all(dir).map_err(|e| PairingError::io(dir, e))?;
        }
        std::fs::create_dir_all(dir).map_err(|e| PairingError::io(dir, e))?;

        let mut stems = Vec::with_capacity(samples.len());
        for sample in samples {
            let extension = sample
                .audio_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("wav");

            let audio_dst = dir.join(format!("{}.{extension}", sample.stem));
            std::fs::copy(&sample.audio_path, &audio_dst)
                .map_err(|e| PairingError::io(&sample.audio_path, e))?;

            let label_dst = dir.join(format!("{}.{LABEL_EXTENSION}", sample.stem));
            std::fs::write(&label_dst, &sample.label_text)
                .map_err(|e| PairingError::io(&label_dst, e))?;

            tracing::debug!(stem = %sample.stem, "prepared");
            stems.push(sample.stem.clone());
        }

        stems.sort_by_key(MediaStem::key);

        tracing::info!(dir = ?dir.display(), count = stems.len(), "dataset prepared");

        Ok(Self {
            dir: dir.to_path_buf(),
            stems,
        })
    }

    /// Open a previously prepared directory.
    ///
    /// Stems missing either half of the pair are left out with a warning.
    pub fn open(dir: &Path) -> Result<Self, PairingError> {
        let audio = scan_dir(dir, AUDIO_EXTENSIONS)?;
        let labels = scan_dir(dir, &[LABEL_EXTENSION])?;

        let mut stems = Vec::new();
        for (key, (stem, _)) in &audio.files {
            if labels.files.contains_key(key) {
                stems.push(stem.clone());
            } else {
                tracing::warn!(%stem, "prepared audio without label, not submitted");
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            stems,
        })
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }
}

fn is_empty_dir(dir: &Path) -> Result<bool, PairingError> {
    let mut entries = std::fs::read_dir(dir).map_err(|e| PairingError::io(dir, e))?;
    Ok(entries.next().is_none())
}
