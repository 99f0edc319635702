//! Formula record error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum FormulaError {
    #[error("failed to parse formula {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("invalid checksum in {field}: expected 64 hex characters, got {length}")]
    InvalidChecksumLength { field: String, length: usize },

    #[error("invalid checksum in {field}: {message}")]
    InvalidChecksum { field: String, message: String },

    #[error("formula has an empty package name: {path}")]
    EmptyName { path: String },

    #[error("invalid URL in {field}: {url}")]
    InvalidUrl { field: String, url: String },

    #[error("unknown install procedure: {procedure}")]
    UnknownProcedure { procedure: String },

    #[error("formula declares no test executable: {name}")]
    MissingExecutable { name: String },

    #[error("no formula found for package: {name}")]
    NotFound { name: String },

    #[error("no formula for {name} satisfies {spec}")]
    NoMatchingVersion { name: String, spec: String },

    #[error("no formula for {name} has source checksum {digest}")]
    NoMatchingPin { name: String, digest: String },

    #[error("tap directory not found: {path}")]
    TapNotFound { path: String },
}
