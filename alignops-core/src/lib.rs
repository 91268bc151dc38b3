//! alignops-core: forced-alignment dataset and output tooling.
//!
//! The crate covers everything around an external forced aligner except the
//! aligner itself:
//!
//! - [`pairing`]: match audio and transcript files by stem, with diagnostics
//! - [`normalize`]: turn transcripts into single-line aligner labels
//! - [`dataset`]: write the prepared `<stem>.wav` + `<stem>.lab` directory
//! - [`aligner`]: the [`aligner::Aligner`] capability and output completeness check
//! - [`textgrid`]: parse Praat TextGrid output into [`types::AnnotationFile`]
//! - [`analysis`]: per-file and dataset-wide duration statistics
//! - [`report`]: CSV rows, JSON summary and text table
//! - [`pipeline`]: all of the above in one run, with a final [`pipeline::Tally`]
//!
//! # Quick Start
//!
//! ```no_run
//! use alignops_core::analysis::{AnalysisConfig, DatasetStats, analyze};
//! use alignops_core::textgrid::{DEFAULT_EPSILON, read_file};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parsed = read_file(Path::new("aligned/utt1.TextGrid"), DEFAULT_EPSILON)?;
//! for warning in &parsed.warnings {
//!     eprintln!("{warning}");
//! }
//!
//! let mut dataset = DatasetStats::new();
//! dataset.add(&analyze(&parsed.file, &AnalysisConfig::default()));
//! # Ok(())
//! # }
//! ```

pub mod aligner;
pub mod analysis;
pub mod audio;
pub mod dataset;
pub mod diagnostic;
pub mod error;
pub mod normalize;
pub mod pairing;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod textgrid;
pub mod types;
