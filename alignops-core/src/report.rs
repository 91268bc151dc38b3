//! Report writers: interval rows as CSV, dataset summary as JSON, text table.

use crate::analysis::{AlignmentStats, DatasetStats, DurationStats, StemSummary, TierAccumulator};
use crate::diagnostic::Diagnostics;
use crate::error::ReportError;
use crate::pipeline::Tally;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Default file name for interval rows.
pub const REPORT_CSV: &str = "report.csv";

/// Default file name for the dataset summary.
pub const SUMMARY_JSON: &str = "summary.json";

const HEADER: [&str; 6] = ["stem", "tier", "start", "end", "label", "duration"];

/// Streaming CSV writer, one row per stem × tier × interval.
pub struct RowWriter<W: Write> {
    inner: W,
    rows: usize,
}

impl RowWriter<BufWriter<File>> {
    /// Create `path` and write the header.
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> RowWriter<W> {
    pub fn new(mut inner: W) -> Result<Self, ReportError> {
        writeln!(inner, "{}", HEADER.join(","))?;
        Ok(Self { inner, rows: 0 })
    }

    /// Write every unit of one file.
    pub fn write_stats(&mut self, stats: &AlignmentStats) -> Result<(), ReportError> {
        for unit in &stats.units {
            writeln!(
                self.inner,
                "{},{},{:.4},{:.4},{},{:.4}",
                quote(stats.stem.as_str()),
                quote(&unit.tier),
                unit.start,
                unit.end,
                quote(&unit.label),
                unit.duration
            )?;
            self.rows += 1;
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W, ReportError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
fn quote(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

/// Serialized dataset summary.
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub tally: Tally,
    pub tiers: &'a BTreeMap<String, TierAccumulator>,
    pub stems: &'a [StemSummary],
    pub diagnostics: &'a Diagnostics,
}

impl<'a> Summary<'a> {
    pub fn new(tally: Tally, stats: &'a DatasetStats, diagnostics: &'a Diagnostics) -> Self {
        Self {
            tally,
            tiers: &stats.tiers,
            stems: &stats.stems,
            diagnostics,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Plain-text table: one block per tier with its `top` most frequent labels.
pub fn render_table(stats: &DatasetStats, top: usize) -> String {
    let mut out = String::new();

    for (name, tier) in &stats.tiers {
        let _ = writeln!(
            out,
            "{name}  (silence {:.1}%)",
            tier.silence_ratio * 100.0
        );
        let _ = writeln!(
            out,
            "  {:<16} {:>7} {:>8} {:>8} {:>8}",
            "label", "count", "min", "mean", "max"
        );
        let _ = writeln!(out, "  {}", stats_row("(all)", &tier.overall));

        let mut labels: Vec<_> = tier.labels.iter().collect();
        labels.sort_by(|a, b| b.1.count().cmp(&a.1.count()).then_with(|| a.0.cmp(b.0)));

        for (label, s) in labels.iter().take(top) {
            let _ = writeln!(out, "  {}", stats_row(label, s));
        }
        if labels.len() > top {
            let _ = writeln!(out, "  ... {} more labels", labels.len() - top);
        }
    }

    out
}

fn stats_row(label: &str, stats: &DurationStats) -> String {
    let secs = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
    format!(
        "{:<16} {:>7} {:>8} {:>8} {:>8}",
        label,
        stats.count(),
        secs(stats.min()),
        secs(stats.mean()),
        secs(stats.max())
    )
}
