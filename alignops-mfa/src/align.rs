//! `mfa align` as an [`Aligner`].

use crate::process::{self, Captured};
use alignops_core::aligner::{AlignRequest, Aligner, AlignerRun};
use alignops_core::error::AlignerError;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

/// Aligner executable looked up on `PATH` when none is configured.
pub const DEFAULT_PROGRAM: &str = "mfa";

/// Log file written into the output directory when no log path is set.
pub const LOG_FILE: &str = "alignops-mfa.log";

/// Timeout for informational commands such as `mfa version`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for `mfa model download`.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Model categories understood by `mfa model list`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    Dictionary,
    Acoustic,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dictionary => "dictionary",
            Self::Acoustic => "acoustic",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Montreal Forced Aligner command line.
#[derive(Clone, Debug)]
pub struct MfaAligner {
    program: PathBuf,
    num_jobs: Option<usize>,
    clean: bool,
    extra_args: Vec<String>,
    log_path: Option<PathBuf>,
}

impl Default for MfaAligner {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl MfaAligner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            num_jobs: None,
            clean: false,
            extra_args: Vec::new(),
            log_path: None,
        }
    }

    /// Forward `-j <n>` to the aligner.
    pub fn with_num_jobs(mut self, num_jobs: Option<usize>) -> Self {
        self.num_jobs = num_jobs;
        self
    }

    /// Forward `--clean` to the aligner.
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Extra arguments appended verbatim.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn with_log_path(mut self, path: Option<PathBuf>) -> Self {
        self.log_path = path;
        self
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Arguments of the `align` invocation for `request`.
    pub fn align_args(&self, request: &AlignRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "align".into(),
            request.dataset_dir.clone().into(),
            request.dictionary.clone().into(),
            request.acoustic_model.clone().into(),
            request.output_dir.clone().into(),
        ];
        if self.clean {
            args.push("--clean".into());
        }
        if let Some(n) = self.num_jobs {
            args.push("-j".into());
            args.push(n.to_string().into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }

    /// `mfa version`, trimmed.
    pub fn version(&self) -> Result<String, AlignerError> {
        let captured = self.probe(&["version"])?;
        if !captured.success() {
            return Err(self.failed(&captured));
        }
        Ok(captured.stdout.trim().to_string())
    }

    /// Raw output of `mfa model list <kind>`.
    pub fn list_models(&self, kind: ModelKind) -> Result<String, AlignerError> {
        let captured = self.probe(&["model", "list", kind.as_str()])?;
        if !captured.success() {
            return Err(self.failed(&captured));
        }
        Ok(captured.stdout)
    }

    /// Whether `mfa model list <kind>` mentions `name`.
    pub fn has_model(&self, kind: ModelKind, name: &str) -> Result<bool, AlignerError> {
        Ok(mentions(&self.list_models(kind)?, name))
    }

    /// `mfa model download <kind> <name>`.
    pub fn download_model(&self, kind: ModelKind, name: &str) -> Result<(), AlignerError> {
        tracing::info!(%kind, model = name, "downloading model");
        let captured = process::capture(
            Command::new(&self.program).args(["model", "download", kind.as_str(), name]),
            Some(DOWNLOAD_TIMEOUT),
        )?;
        if !captured.success() {
            return Err(self.failed(&captured));
        }
        Ok(())
    }

    fn probe(&self, args: &[&str]) -> Result<Captured, AlignerError> {
        process::capture(Command::new(&self.program).args(args), Some(PROBE_TIMEOUT))
    }

    fn failed(&self, captured: &Captured) -> AlignerError {
        AlignerError::Spawn {
            program: self.program.display().to_string(),
            source: std::io::Error::other(format!(
                "{}: {}",
                captured.status,
                captured.stderr.trim()
            )),
        }
    }
}

impl Aligner for MfaAligner {
    fn name(&self) -> &str {
        "mfa"
    }

    fn align(&self, request: &AlignRequest) -> Result<AlignerRun, AlignerError> {
        std::fs::create_dir_all(&request.output_dir)
            .map_err(|e| AlignerError::io(&request.output_dir, e))?;

        let log_path = self
            .log_path
            .clone()
            .unwrap_or_else(|| request.output_dir.join(LOG_FILE));

        tracing::info!(
            program = ?self.program.display(),
            dataset = ?request.dataset_dir.display(),
            dictionary = %request.dictionary,
            acoustic_model = %request.acoustic_model,
            output = ?request.output_dir.display(),
            log = ?log_path.display(),
            "running aligner"
        );

        let started = Instant::now();
        let mut command = Command::new(&self.program);
        command.args(self.align_args(request));
        let mut child = process::spawn_logged(&mut command, &log_path)?;

        let status = process::wait_with_timeout(&mut child, request.timeout)
            .map_err(|e| AlignerError::io(&log_path, e))?;

        tracing::info!(
            %status,
            duration = format!("{:.1}s", started.elapsed().as_secs_f32()),
            "aligner finished"
        );

        Ok(AlignerRun {
            status,
            output_dir: request.output_dir.clone(),
            log_path: Some(log_path),
        })
    }
}

/// Whether `output` lists `name` as a whole word.
fn mentions(output: &str, name: &str) -> bool {
    output
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-' || c == '.'))
        .any(|word| word == name)
}
