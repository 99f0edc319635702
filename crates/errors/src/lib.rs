#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the vial formula installer
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone for easier handling.

use thiserror::Error;

pub mod config;
pub mod formula;
pub mod install;
pub mod network;
pub mod version;

// Re-export all error types at the root
pub use config::ConfigError;
pub use formula::FormulaError;
pub use install::InstallError;
pub use network::NetworkError;
pub use version::VersionError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("formula error: {0}")]
    Formula(#[from] FormulaError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("install error: {0}")]
    Install(#[from] InstallError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("version error: {0}")]
    Version(#[from] VersionError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    /// Name the pipeline step this error aborted, for operator-facing messages.
    ///
    /// The unit of success is the whole record; when installation fails the
    /// CLI reports which of resolve, fetch, verify, provision, install, or
    /// test went wrong.
    #[must_use]
    pub fn failing_step(&self) -> &'static str {
        match self {
            Error::Formula(_) | Error::Config(_) | Error::Version(_) => "resolve",
            Error::Network(_) => "fetch",
            Error::Install(err) => err.failing_step(),
            Error::Internal(_) | Error::Io { .. } => "internal",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<semver::Error> for Error {
    fn from(err: semver::Error) -> Self {
        Self::Version(VersionError::ParseError {
            message: err.to_string(),
        })
    }
}

/// Result type alias for vial operations
pub type Result<T> = std::result::Result<T, Error>;
