//! Duration statistics over parsed annotation files.
//!
//! [`analyze`] makes one pass over a file. [`DatasetStats`] folds per-file
//! results together without keeping the files around, so a dataset of any
//! size is analyzed with memory bounded by whatever the caller holds at once.

use crate::types::{AnnotationFile, Interval, MediaStem, Tier};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeMap;

/// Running min/max/total over a set of durations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DurationStats {
    count: usize,
    min: f64,
    max: f64,
    total: f64,
}

impl Default for DurationStats {
    fn default() -> Self {
        Self {
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            total: 0.0,
        }
    }
}

impl DurationStats {
    pub fn push(&mut self, duration: f64) {
        self.count += 1;
        self.min = self.min.min(duration);
        self.max = self.max.max(duration);
        self.total += duration;
    }

    pub fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.total += other.total;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

impl FromIterator<f64> for DurationStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::default();
        for duration in iter {
            stats.push(duration);
        }
        stats
    }
}

impl Serialize for DurationStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("DurationStats", 5)?;
        s.serialize_field("count", &self.count)?;
        s.serialize_field("min", &self.min())?;
        s.serialize_field("max", &self.max())?;
        s.serialize_field("mean", &self.mean())?;
        s.serialize_field("total", &self.total)?;
        s.end()
    }
}

/// Analysis options.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Group statistics by label within each tier
    pub by_label: bool,
    /// Only analyze these tiers; empty means all
    pub tiers: Vec<String>,
    /// Labels counted as silence in addition to the empty label
    pub silence_labels: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            by_label: true,
            tiers: Vec::new(),
            silence_labels: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    fn includes(&self, tier: &str) -> bool {
        self.tiers.is_empty() || self.tiers.iter().any(|t| t == tier)
    }

    fn is_silence(&self, interval: &Interval) -> bool {
        interval.is_silence() || self.silence_labels.iter().any(|s| s == interval.label.trim())
    }
}

/// One interval's timing, keyed by tier and position.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitDuration {
    pub tier: String,
    /// Zero-based position within the tier
    pub index: usize,
    pub label: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// Statistics for one tier of one file.
#[derive(Clone, Debug, Default)]
pub struct TierStats {
    pub name: String,
    /// Labeled (non-silence) intervals
    pub overall: DurationStats,
    /// Per-label breakdown; empty unless grouping by label
    pub labels: BTreeMap<String, DurationStats>,
    pub silence: f64,
    /// Silence over the file's total duration
    pub silence_ratio: f64,
}

/// Statistics for one annotation file.
#[derive(Clone, Debug)]
pub struct AlignmentStats {
    pub stem: MediaStem,
    pub total_duration: f64,
    /// Every interval of every analyzed tier, silence included
    pub units: Vec<UnitDuration>,
    pub tiers: Vec<TierStats>,
}

/// Compute statistics for one file in a single pass over its intervals.
pub fn analyze(file: &AnnotationFile, config: &AnalysisConfig) -> AlignmentStats {
    let total_duration = file.total_duration();
    let mut units = Vec::new();
    let mut tiers = Vec::new();

    for tier in file.tiers.iter().filter(|t| config.includes(&t.name)) {
        tiers.push(analyze_tier(tier, total_duration, config, &mut units));
    }

    AlignmentStats {
        stem: file.stem.clone(),
        total_duration,
        units,
        tiers,
    }
}

fn analyze_tier(
    tier: &Tier,
    total_duration: f64,
    config: &AnalysisConfig,
    units: &mut Vec<UnitDuration>,
) -> TierStats {
    let mut stats = TierStats {
        name: tier.name.clone(),
        ..Default::default()
    };

    for (index, interval) in tier.intervals.iter().enumerate() {
        let duration = interval.duration();
        units.push(UnitDuration {
            tier: tier.name.clone(),
            index,
            label: interval.label.clone(),
            start: interval.start,
            end: interval.end,
            duration,
        });

        if config.is_silence(interval) {
            stats.silence += duration;
            continue;
        }

        stats.overall.push(duration);
        if config.by_label {
            stats
                .labels
                .entry(interval.label.clone())
                .or_default()
                .push(duration);
        }
    }

    stats.silence_ratio = ratio(stats.silence, total_duration);
    stats
}

fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole } else { 0.0 }
}

/// Dataset-level statistics for one tier name.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct TierAccumulator {
    pub overall: DurationStats,
    pub labels: BTreeMap<String, DurationStats>,
    /// Sum of silence over the sum of file durations
    pub silence_ratio: f64,
    #[serde(skip)]
    silence: f64,
    #[serde(skip)]
    duration: f64,
}

impl TierAccumulator {
    fn add(&mut self, tier: &TierStats, total_duration: f64) {
        self.overall.merge(&tier.overall);
        for (label, stats) in &tier.labels {
            self.labels.entry(label.clone()).or_default().merge(stats);
        }
        self.silence += tier.silence;
        self.duration += total_duration;
        self.silence_ratio = ratio(self.silence, self.duration);
    }

    fn merge(&mut self, other: &Self) {
        self.overall.merge(&other.overall);
        for (label, stats) in &other.labels {
            self.labels.entry(label.clone()).or_default().merge(stats);
        }
        self.silence += other.silence;
        self.duration += other.duration;
        self.silence_ratio = ratio(self.silence, self.duration);
    }
}

/// Per-stem line of the dataset summary.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StemSummary {
    pub stem: MediaStem,
    pub total_duration: f64,
    /// Silence ratio per tier
    pub tiers: BTreeMap<String, f64>,
}

/// Streaming accumulator over [`AlignmentStats`].
#[derive(Clone, Debug, Default)]
pub struct DatasetStats {
    pub tiers: BTreeMap<String, TierAccumulator>,
    /// Sorted by stem key
    pub stems: Vec<StemSummary>,
}

impl DatasetStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one file's statistics in; its units are not retained.
    pub fn add(&mut self, stats: &AlignmentStats) {
        for tier in &stats.tiers {
            self.tiers
                .entry(tier.name.clone())
                .or_default()
                .add(tier, stats.total_duration);
        }

        self.insert_stem(StemSummary {
            stem: stats.stem.clone(),
            total_duration: stats.total_duration,
            tiers: stats
                .tiers
                .iter()
                .map(|t| (t.name.clone(), t.silence_ratio))
                .collect(),
        });
    }

    pub fn merge(&mut self, other: Self) {
        for (name, tier) in &other.tiers {
            self.tiers.entry(name.clone()).or_default().merge(tier);
        }
        for stem in other.stems {
            self.insert_stem(stem);
        }
    }

    /// Number of files folded in.
    pub fn files(&self) -> usize {
        self.stems.len()
    }

    fn insert_stem(&mut self, summary: StemSummary) {
        let key = summary.stem.key();
        let at = self.stems.partition_point(|s| s.stem.key() <= key);
        self.stems.insert(at, summary);
    }
}
