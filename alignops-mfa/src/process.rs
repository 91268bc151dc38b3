//! Child process helpers: spawn with a log file, bounded waits, captured output.

use alignops_core::aligner::AlignerStatus;
use alignops_core::error::AlignerError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// How often a running child is polled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Output of a short-lived command.
#[derive(Clone, Debug)]
pub struct Captured {
    pub status: AlignerStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status.is_success()
    }
}

pub fn status_of(status: ExitStatus) -> AlignerStatus {
    if status.success() {
        AlignerStatus::Completed
    } else {
        AlignerStatus::Failed {
            code: status.code(),
        }
    }
}

/// Spawn `command` with stdout and stderr written to `log_path`.
pub fn spawn_logged(command: &mut Command, log_path: &Path) -> Result<Child, AlignerError> {
    let log = File::create(log_path).map_err(|e| AlignerError::io(log_path, e))?;
    let err_log = log.try_clone().map_err(|e| AlignerError::io(log_path, e))?;

    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(err_log));

    spawn(command)
}

/// Wait for `child`, killing it once `timeout` has elapsed.
pub fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<AlignerStatus> {
    let Some(timeout) = timeout else {
        return child.wait().map(status_of);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status_of(status));
        }
        if Instant::now() >= deadline {
            tracing::warn!(pid = child.id(), ?timeout, "killing process after timeout");
            child.kill()?;
            child.wait()?;
            return Ok(AlignerStatus::TimedOut);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Run `command` to completion, collecting its output.
pub fn capture(command: &mut Command, timeout: Option<Duration>) -> Result<Captured, AlignerError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = spawn(command)?;
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = wait_with_timeout(&mut child, timeout).map_err(|source| AlignerError::Spawn {
        program: program_name(command),
        source,
    })?;

    let collect = |handle: Option<std::thread::JoinHandle<String>>| {
        handle.and_then(|h| h.join().ok()).unwrap_or_default()
    };

    Ok(Captured {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn spawn(command: &mut Command) -> Result<Child, AlignerError> {
    tracing::debug!(?command, "spawning");

    command.spawn().map_err(|source| {
        let program = program_name(command);
        if source.kind() == std::io::ErrorKind::NotFound {
            AlignerError::NotFound { program }
        } else {
            AlignerError::Spawn { program, source }
        }
    })
}

fn program_name(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_status() {
        let captured = capture(Command::new("sh").args(["-c", "echo hello; exit 3"]), None).unwrap();

        assert_eq!(captured.stdout.trim(), "hello");
        assert_eq!(captured.status, AlignerStatus::Failed { code: Some(3) });
        assert!(!captured.success());
    }

    #[test]
    fn kills_on_timeout() {
        let started = Instant::now();

        let captured = capture(
            Command::new("sh").args(["-c", "exec sleep 5"]),
            Some(Duration::from_millis(200)),
        )
        .unwrap();

        assert_eq!(captured.status, AlignerStatus::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn reports_missing_program() {
        let result = capture(&mut Command::new("alignops-definitely-not-installed"), None);

        assert!(matches!(
            result,
            Err(AlignerError::NotFound { program }) if program == "alignops-definitely-not-installed"
        ));
    }

    #[test]
    fn logs_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.log");

        let mut child =
            spawn_logged(Command::new("sh").args(["-c", "echo out; echo err >&2"]), &log).unwrap();
        let status = wait_with_timeout(&mut child, Some(Duration::from_secs(10))).unwrap();

        assert_eq!(status, AlignerStatus::Completed);
        let text = std::fs::read_to_string(&log).unwrap();
        assert!(text.contains("out"));
        assert!(text.contains("err"));
    }
}
