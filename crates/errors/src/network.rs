//! Network error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("request timeout: {url}")]
    Timeout { url: String },

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },
}
