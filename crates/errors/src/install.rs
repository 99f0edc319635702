//! Installation pipeline error types
//!
//! The variants map onto the linear fetch -> verify -> provision -> install
//! -> test sequence. `IntegrityMismatch` and `RuntimeUnavailable` abort
//! before any environment exists; `SmokeTestFailed` is a distinct class
//! raised after the install has already been committed.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },

    #[error("required runtime unavailable: {runtime}{constraint}")]
    RuntimeUnavailable { runtime: String, constraint: String },

    #[error("failed to create virtual environment for {package}: {message}")]
    VenvFailed { package: String, message: String },

    #[error("pip install failed for {package}: {message}")]
    PipFailed { package: String, message: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("atomic operation failed: {message}")]
    AtomicOperationFailed { message: String },

    #[error("installed environment exposes no executable named {executable}")]
    ExecutableMissing { executable: String },

    #[error("package not installed: {package}")]
    NotInstalled { package: String },

    #[error("smoke test failed: `{executable} {flag}` exited with {status}")]
    SmokeTestFailed {
        executable: String,
        flag: String,
        status: String,
    },
}

impl InstallError {
    /// Name the pipeline step this error belongs to.
    #[must_use]
    pub fn failing_step(&self) -> &'static str {
        match self {
            Self::IntegrityMismatch { .. } => "verify",
            Self::RuntimeUnavailable { .. } | Self::VenvFailed { .. } => "provision",
            Self::PipFailed { .. } => "install",
            Self::FilesystemError { .. }
            | Self::AtomicOperationFailed { .. }
            | Self::ExecutableMissing { .. }
            | Self::NotInstalled { .. } => "install",
            Self::SmokeTestFailed { .. } => "test",
        }
    }

    /// Whether the failure left a committed installation behind.
    ///
    /// Only a smoke-test failure does; every other variant guarantees the
    /// staging guard removed any partially created environment.
    #[must_use]
    pub fn install_committed(&self) -> bool {
        matches!(self, Self::SmokeTestFailed { .. })
    }
}
