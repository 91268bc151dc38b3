//! Tests against a real Montreal Forced Aligner installation.
//!
//! Run with `cargo test -p alignops-mfa -- --ignored` inside an environment
//! where `mfa` and the `english_us_arpa` models are installed.

use alignops_core::aligner::DEFAULT_MODEL;
use alignops_mfa::align::{MfaAligner, ModelKind};

#[test]
#[ignore = "requires mfa on PATH"]
fn reports_installed_version() {
    let version = MfaAligner::default().version().unwrap();

    assert!(version.chars().next().is_some_and(|c| c.is_ascii_digit()));
}

#[test]
#[ignore = "requires mfa with english_us_arpa models"]
fn default_models_are_installed() {
    let aligner = MfaAligner::default();

    assert!(aligner.has_model(ModelKind::Dictionary, DEFAULT_MODEL).unwrap());
    assert!(aligner.has_model(ModelKind::Acoustic, DEFAULT_MODEL).unwrap());
}
