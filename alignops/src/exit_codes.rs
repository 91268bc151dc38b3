//! Exit codes for the CLI.
//!
//! Scripts can tell a clean run from a partial aligner failure without
//! parsing the output.

/// Exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Completed; excluded stems and warnings are reported, not fatal
    Success = 0,
    /// Unrecoverable failure (no valid pairs, aligner produced nothing, I/O)
    GeneralError = 1,
    /// Invalid command-line arguments (clap usage errors, rejected option values)
    InvalidArguments = 2,
    /// Completed, but the aligner failed or timed out for some stems
    AlignerFailed = 3,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::GeneralError => write!(f, "general error"),
            ExitCode::InvalidArguments => write!(f, "invalid arguments"),
            ExitCode::AlignerFailed => write!(f, "aligner failed for some stems"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::InvalidArguments.as_i32(), 2);
        assert_eq!(ExitCode::AlignerFailed.as_i32(), 3);
    }
}
