//! Verified artifact downloads
//!
//! Every fetched archive must match its pinned digest before the installer
//! may touch it. Verification happens independently per artifact; no entry
//! relies on another's result.

use crate::NetClient;
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use vial_errors::{Error, InstallError, NetworkError};
use vial_events::{AppEvent, EventEmitter, EventSender};
use vial_hash::Checksum;

/// Download a URL to a local path and verify it against a pinned digest
///
/// The file is written before verification; on a digest mismatch it is
/// removed again so no unverified archive stays in the cache.
///
/// # Errors
///
/// Returns a network error if the download fails, or
/// `InstallError::IntegrityMismatch` if the fetched bytes do not hash to
/// `expected`.
pub async fn fetch_and_verify(
    client: &NetClient,
    url: &str,
    expected: &Checksum,
    dest: &Path,
    artifact: &str,
    events: Option<&EventSender>,
) -> Result<(), Error> {
    let response = client.get(url).await?;
    let total_size = response.content_length();

    events.emit(AppEvent::DownloadStarted {
        url: url.to_string(),
        artifact: artifact.to_string(),
        total_size,
    });

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(&e, parent))?;
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;
    let mut stream = response.bytes_stream();
    let mut downloaded = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
        file.write_all(&chunk).await?;

        downloaded += chunk.len() as u64;
        events.emit(AppEvent::DownloadProgress {
            artifact: artifact.to_string(),
            downloaded,
            total: total_size,
        });
    }
    file.flush().await?;
    drop(file);

    events.emit(AppEvent::DownloadCompleted {
        artifact: artifact.to_string(),
        size: downloaded,
    });

    let actual = Checksum::hash_file(dest).await?;
    if actual != *expected {
        let _ = tokio::fs::remove_file(dest).await;
        return Err(InstallError::IntegrityMismatch {
            artifact: artifact.to_string(),
            expected: expected.to_hex(),
            actual: actual.to_hex(),
        }
        .into());
    }

    events.emit(AppEvent::Verified {
        artifact: artifact.to_string(),
        sha256: actual.to_hex(),
    });

    Ok(())
}
