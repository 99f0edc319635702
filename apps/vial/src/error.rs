//! CLI-level error wrapper

use std::fmt;
use vial_errors::Error;

/// Error surfaced to the operator with the failing pipeline step attached
#[derive(Debug)]
pub struct CliError {
    error: Error,
}

impl CliError {
    /// Exit code for the process
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match &self.error {
            // Smoke-test failure is a distinct class: the install stayed
            Error::Install(err) if err.install_committed() => 2,
            _ => 1,
        }
    }

    /// Whether the failure left a committed install behind
    #[must_use]
    pub fn install_committed(&self) -> bool {
        matches!(&self.error, Error::Install(err) if err.install_committed())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.error.failing_step(), self.error)
    }
}

impl std::error::Error for CliError {}

impl From<Error> for CliError {
    fn from(error: Error) -> Self {
        Self { error }
    }
}
