//! Environment checks before a run: aligner, models, directories, Praat.

use crate::align::{MfaAligner, ModelKind};
use crate::process;
use alignops_core::audio::AUDIO_EXTENSIONS;
use alignops_core::error::AlignerError;
use alignops_core::normalize::TRANSCRIPT_EXTENSIONS;
use alignops_core::pairing::scan_dir;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Environment variable MFA reads its data root from.
pub const MFA_ROOT_ENV: &str = "MFA_ROOT_DIR";

const PRAAT_PROGRAM: &str = "praat";
const PRAAT_TIMEOUT: Duration = Duration::from_secs(3);

/// MFA's default data root, `<Documents>/MFA`.
pub fn default_mfa_root() -> Option<PathBuf> {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("MFA"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "ok",
            Self::Warn => "warn",
            Self::Fail => "FAIL",
        })
    }
}

/// Outcome of one check.
#[derive(Clone, Debug)]
pub struct Check {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
    /// A failed critical check blocks the run
    pub critical: bool,
    /// How to fix a failure
    pub hint: Option<String>,
}

impl Check {
    fn new(name: impl Into<String>, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
            critical: true,
            hint: None,
        }
    }

    fn optional(mut self) -> Self {
        self.critical = false;
        if self.status == CheckStatus::Fail {
            self.status = CheckStatus::Warn;
        }
        self
    }

    fn hint(mut self, hint: impl Into<String>) -> Self {
        if self.status != CheckStatus::Pass {
            self.hint = Some(hint.into());
        }
        self
    }

    pub fn blocks(&self) -> bool {
        self.critical && self.status == CheckStatus::Fail
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>4}] {}: {}", self.status, self.name, self.detail)
    }
}

/// What to check.
#[derive(Clone, Debug)]
pub struct PreflightConfig {
    pub audio_dir: PathBuf,
    pub transcript_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dictionary: String,
    pub acoustic_model: String,
    pub mfa_root: Option<PathBuf>,
    pub check_praat: bool,
    /// Download a missing dictionary or acoustic model instead of failing
    pub download_missing: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PreflightReport {
    pub checks: Vec<Check>,
}

impl PreflightReport {
    /// No critical check failed.
    pub fn passed(&self) -> bool {
        !self.checks.iter().any(Check::blocks)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.blocks())
    }
}

/// Run every check.
pub fn run(aligner: &MfaAligner, config: &PreflightConfig) -> PreflightReport {
    let mut checks = Vec::new();

    let installed = check_aligner(aligner);
    let aligner_ok = installed.status == CheckStatus::Pass;
    checks.push(installed);

    if aligner_ok {
        for (kind, model) in [
            (ModelKind::Dictionary, &config.dictionary),
            (ModelKind::Acoustic, &config.acoustic_model),
        ] {
            checks.push(check_model(aligner, kind, model, config.download_missing));
        }
    }

    if let Some(root) = &config.mfa_root {
        checks.push(
            check_existing_dir("MFA root", root)
                .optional()
                .hint("models are downloaded here on first use"),
        );
    }

    checks.push(check_input_dir("audio files", &config.audio_dir, AUDIO_EXTENSIONS));
    checks.push(check_input_dir(
        "transcript files",
        &config.transcript_dir,
        TRANSCRIPT_EXTENSIONS,
    ));
    checks.push(check_output_dir("dataset directory", &config.dataset_dir));
    checks.push(check_output_dir("output directory", &config.output_dir));

    if config.check_praat {
        checks.push(check_praat());
    }

    for check in &checks {
        match check.status {
            CheckStatus::Pass => tracing::debug!(check = %check.name, "{}", check.detail),
            CheckStatus::Warn => tracing::warn!(check = %check.name, "{}", check.detail),
            CheckStatus::Fail => tracing::error!(check = %check.name, "{}", check.detail),
        }
    }

    PreflightReport { checks }
}

fn check_aligner(aligner: &MfaAligner) -> Check {
    let name = "aligner";
    match aligner.version() {
        Ok(version) => Check::new(name, CheckStatus::Pass, format!("mfa {version}")),
        Err(AlignerError::NotFound { program }) => {
            Check::new(name, CheckStatus::Fail, format!("{program} not found"))
                .hint("conda install -c conda-forge montreal-forced-aligner")
        }
        Err(e) => Check::new(name, CheckStatus::Fail, e.to_string()),
    }
}

fn check_model(aligner: &MfaAligner, kind: ModelKind, model: &str, download: bool) -> Check {
    let name = format!("{kind} model");
    match aligner.has_model(kind, model) {
        Ok(true) => Check::new(name, CheckStatus::Pass, model),
        Ok(false) if download => match aligner.download_model(kind, model) {
            Ok(()) => Check::new(name, CheckStatus::Pass, format!("{model} (downloaded)")),
            Err(e) => Check::new(name, CheckStatus::Fail, format!("download of {model} failed: {e}")),
        },
        Ok(false) => Check::new(name, CheckStatus::Fail, format!("{model} not installed"))
            .hint(format!("mfa model download {kind} {model}, or rerun with --download")),
        Err(e) => Check::new(name, CheckStatus::Fail, e.to_string()),
    }
}

fn check_existing_dir(name: &str, dir: &Path) -> Check {
    if dir.is_dir() {
        Check::new(name, CheckStatus::Pass, dir.display().to_string())
    } else {
        Check::new(name, CheckStatus::Fail, format!("{} not found", dir.display()))
    }
}

/// Directory must exist and hold at least one file with `extensions`.
pub fn check_input_dir(name: &str, dir: &Path, extensions: &[&str]) -> Check {
    match scan_dir(dir, extensions) {
        Ok(scan) if scan.files.is_empty() => Check::new(
            name,
            CheckStatus::Fail,
            format!("no .{} files in {}", extensions.join("/."), dir.display()),
        ),
        Ok(scan) => Check::new(
            name,
            CheckStatus::Pass,
            format!("{} in {}", scan.files.len(), dir.display()),
        ),
        Err(e) => Check::new(name, CheckStatus::Fail, e.to_string()),
    }
}

/// Directory to be written: warn when it already has content.
pub fn check_output_dir(name: &str, dir: &Path) -> Check {
    let occupied = std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);

    let check = if occupied {
        Check::new(
            name,
            CheckStatus::Warn,
            format!("{} already exists and is not empty", dir.display()),
        )
        .hint("pass --force to replace it")
    } else {
        Check::new(name, CheckStatus::Pass, format!("{} ready", dir.display()))
    };
    check.optional()
}

fn check_praat() -> Check {
    let name = "praat";
    let check = match process::capture(Command::new(PRAAT_PROGRAM).arg("--version"), Some(PRAAT_TIMEOUT)) {
        Ok(captured) if captured.success() => {
            Check::new(name, CheckStatus::Pass, captured.stdout.trim().to_string())
        }
        Ok(captured) => Check::new(name, CheckStatus::Fail, captured.status.to_string()),
        Err(e) => Check::new(name, CheckStatus::Fail, e.to_string()),
    };
    check
        .optional()
        .hint("optional, for inspecting TextGrids: https://www.fon.hum.uva.nl/praat/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_dir_fails() {
        let dir = tempfile::tempdir().unwrap();

        let check = check_input_dir("audio files", dir.path(), AUDIO_EXTENSIONS);

        assert_eq!(check.status, CheckStatus::Fail);
        assert!(check.blocks());
    }

    #[test]
    fn input_dir_counts_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.TXT"), "x").unwrap();
        std::fs::write(dir.path().join("b.lab"), "y").unwrap();
        std::fs::write(dir.path().join("c.md"), "z").unwrap();

        let check = check_input_dir("transcripts", dir.path(), TRANSCRIPT_EXTENSIONS);

        assert_eq!(check.status, CheckStatus::Pass);
        assert!(check.detail.starts_with("2 in"));
    }

    #[test]
    fn occupied_output_dir_warns_without_blocking() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.lab"), "x").unwrap();

        let check = check_output_dir("dataset directory", dir.path());

        assert_eq!(check.status, CheckStatus::Warn);
        assert!(!check.blocks());
        assert!(check.hint.is_some());
    }

    #[test]
    fn missing_output_dir_is_ready() {
        let dir = tempfile::tempdir().unwrap();

        let check = check_output_dir("output directory", &dir.path().join("new"));

        assert_eq!(check.status, CheckStatus::Pass);
        assert!(check.hint.is_none());
    }

    #[test]
    fn missing_aligner_blocks_and_skips_models() {
        let dir = tempfile::tempdir().unwrap();
        let config = PreflightConfig {
            audio_dir: dir.path().to_path_buf(),
            transcript_dir: dir.path().to_path_buf(),
            dataset_dir: dir.path().join("mfa_data"),
            output_dir: dir.path().join("out"),
            dictionary: "english_us_arpa".to_string(),
            acoustic_model: "english_us_arpa".to_string(),
            mfa_root: None,
            check_praat: false,
            download_missing: false,
        };

        let report = run(&MfaAligner::new("alignops-no-such-mfa"), &config);

        assert!(!report.passed());
        assert_eq!(report.checks[0].name, "aligner");
        assert!(report.checks[0].hint.is_some());
        assert!(report.checks.iter().all(|c| !c.name.ends_with("model")));
    }

    #[cfg(unix)]
    #[test]
    fn missing_models_are_downloaded_on_request() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-mfa");
        std::fs::write(
            &script,
            r#"#!/bin/sh
state="$(dirname "$0")/models"
case "$1 $2" in
  "version "*) echo 3.1.0 ;;
  "model list") [ -f "$state" ] && cat "$state" ;;
  "model download") echo "$4" >> "$state" ;;
  *) exit 2 ;;
esac
exit 0
"#,
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = PreflightConfig {
            audio_dir: dir.path().to_path_buf(),
            transcript_dir: dir.path().to_path_buf(),
            dataset_dir: dir.path().join("mfa_data"),
            output_dir: dir.path().join("out"),
            dictionary: "english_us_arpa".to_string(),
            acoustic_model: "english_us_arpa".to_string(),
            mfa_root: None,
            check_praat: false,
            download_missing: false,
        };
        let aligner = MfaAligner::new(&script);
        let model_check = |report: &PreflightReport, name: &str| {
            report.checks.iter().find(|c| c.name == name).cloned().unwrap()
        };

        let report = run(&aligner, &config);
        assert_eq!(model_check(&report, "dictionary model").status, CheckStatus::Fail);

        config.download_missing = true;
        let report = run(&aligner, &config);

        let dictionary = model_check(&report, "dictionary model");
        assert_eq!(dictionary.status, CheckStatus::Pass);
        assert!(dictionary.detail.contains("downloaded"));
        assert_eq!(model_check(&report, "acoustic model").status, CheckStatus::Pass);
        let downloaded = std::fs::read_to_string(dir.path().join("models")).unwrap();
        assert_eq!(downloaded.lines().count(), 1);
    }
}
