#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! SHA-256 checksums for formula integrity verification
//!
//! Formula records pin every downloadable artifact to a SHA-256 digest.
//! Parsing is strict: a digest that is not exactly 64 hex characters is a
//! schema error naming the offending length, never silently truncated or
//! padded. Several historical records in the upstream tap carried oversized
//! digest strings, which this rule surfaces at load time.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use vial_errors::{Error, FormulaError};

/// Size of chunks for streaming digest computation
const CHUNK_SIZE: usize = 64 * 1024;

/// Exact hex length of a SHA-256 digest
pub const HEX_LEN: usize = 64;

/// A SHA-256 checksum value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    bytes: [u8; 32],
}

impl Checksum {
    /// Create a checksum from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Convert to lowercase hex
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a pinned digest string
    ///
    /// # Errors
    ///
    /// Returns a schema error if the string is not exactly 64 hex characters.
    /// The `field` names where the digest came from so `vial check` can point
    /// at the offending record entry.
    pub fn parse(field: &str, s: &str) -> Result<Self, Error> {
        let s = s.trim();
        if s.len() != HEX_LEN {
            return Err(FormulaError::InvalidChecksumLength {
                field: field.to_string(),
                length: s.len(),
            }
            .into());
        }

        let decoded = hex::decode(s).map_err(|e| FormulaError::InvalidChecksum {
            field: field.to_string(),
            message: e.to_string(),
        })?;

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Self { bytes })
    }

    /// Compute the digest of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self { bytes }
    }

    /// Compute the digest of a file by streaming
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(path: &Path) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Ok(Self { bytes })
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse("sha256", &s).map_err(serde::de::Error::custom)
    }
}

/// Verify a file on disk against an expected digest
///
/// # Errors
///
/// Returns an error if the file cannot be read or hashed.
pub async fn verify_file(path: &Path, expected: &Checksum) -> Result<bool, Error> {
    let actual = Checksum::hash_file(path).await?;
    Ok(actual == *expected)
}
