//! Tap loading and record resolution
//!
//! A tap directory holds one TOML record per file. `(name, version)` is not
//! guaranteed unique across upstream history, so resolution never merges
//! records: the highest `(version, revision)` wins, last-declared on full
//! ties, and callers can pin an exact record by its source digest.

use crate::Formula;
use std::path::{Path, PathBuf};
use tokio::fs;
use vial_errors::{Error, FormulaError};
use vial_hash::Checksum;
use vial_types::VersionSpec;

/// A loaded distribution channel
#[derive(Debug, Clone)]
pub struct Tap {
    /// Records in deterministic declaration order (sorted file names)
    records: Vec<Formula>,
}

/// One schema problem found while auditing a tap
#[derive(Debug)]
pub struct AuditFinding {
    pub path: PathBuf,
    pub error: Error,
}

/// List record files in deterministic order
async fn record_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut entries = fs::read_dir(dir).await.map_err(|_| FormulaError::TapNotFound {
        path: dir.display().to_string(),
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

impl Tap {
    /// Load all records from a tap directory, failing on the first invalid one
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or any record fails
    /// schema validation.
    pub async fn load(dir: &Path) -> Result<Self, Error> {
        let mut records = Vec::new();
        for path in record_files(dir).await? {
            records.push(Formula::from_file(&path).await?);
        }
        Ok(Self { records })
    }

    /// Load every record, collecting schema errors instead of stopping
    ///
    /// Used by `vial check` to report all problems in one pass. Invalid
    /// records are excluded from the returned tap.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory itself cannot be read.
    pub async fn audit(dir: &Path) -> Result<(Self, Vec<AuditFinding>), Error> {
        let mut records = Vec::new();
        let mut findings = Vec::new();
        for path in record_files(dir).await? {
            match Formula::from_file(&path).await {
                Ok(formula) => records.push(formula),
                Err(error) => findings.push(AuditFinding { path, error }),
            }
        }
        Ok((Self { records }, findings))
    }

    /// All records in declaration order
    #[must_use]
    pub fn records(&self) -> &[Formula] {
        &self.records
    }

    /// Resolve the current record for a package name
    ///
    /// # Errors
    ///
    /// Returns `FormulaError::NotFound` if no record carries the name.
    pub fn resolve(&self, name: &str) -> Result<&Formula, Error> {
        self.resolve_spec(name, &VersionSpec::any())
    }

    /// Resolve the newest record matching a version constraint
    ///
    /// # Errors
    ///
    /// Returns an error if no record carries the name or none satisfies
    /// the constraint.
    pub fn resolve_spec(&self, name: &str, spec: &VersionSpec) -> Result<&Formula, Error> {
        let mut candidates: Vec<&Formula> = self
            .records
            .iter()
            .filter(|f| f.name == name)
            .collect();

        if candidates.is_empty() {
            return Err(FormulaError::NotFound {
                name: name.to_string(),
            }
            .into());
        }

        candidates.retain(|f| spec.matches(&f.version));
        // Stable sort keeps declaration order for full ties, so the
        // most-recently-declared duplicate wins.
        candidates.sort_by(|a, b| (&a.version, a.revision).cmp(&(&b.version, b.revision)));
        candidates.last().copied().ok_or_else(|| {
            FormulaError::NoMatchingVersion {
                name: name.to_string(),
                spec: spec.to_string(),
            }
            .into()
        })
    }

    /// Resolve the record whose source digest matches a pin exactly
    ///
    /// # Errors
    ///
    /// Returns an error if no record for the name carries the digest.
    pub fn resolve_pinned(&self, name: &str, pin: &Checksum) -> Result<&Formula, Error> {
        self.records
            .iter()
            .filter(|f| f.name == name)
            .rev()
            .find(|f| f.source.sha256 == *pin)
            .ok_or_else(|| {
                FormulaError::NoMatchingPin {
                    name: name.to_string(),
                    digest: pin.to_hex(),
                }
                .into()
            })
    }
}
