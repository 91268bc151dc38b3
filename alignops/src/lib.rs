//! alignops - forced-alignment workflow CLI.
//!
//! Subcommands map onto the stages of a batch:
//!
//! - `validate`: pair audio with transcripts and report what was excluded
//! - `prepare`: write the `<stem>.wav` + `<stem>.lab` dataset directory
//! - `align`: run the Montreal Forced Aligner over a prepared dataset
//! - `analyze`: parse TextGrids into `report.csv` and `summary.json`
//! - `run`: all of the above in one go
//! - `preflight`: check the aligner, its models and the directories

pub mod align;
pub mod analyze;
pub mod cli;
pub mod config;
pub mod exit_codes;
pub mod output;
pub mod preflight;
pub mod prepare;
pub mod run;
pub mod validate;
