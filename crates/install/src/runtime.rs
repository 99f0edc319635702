//! Runtime interpreter probing
//!
//! The runtime check runs before any fetch so an unsatisfiable dependency
//! aborts with zero side effects.

use std::path::{Path, PathBuf};
use tokio::process::Command;
use vial_errors::{Error, InstallError};
use vial_formula::RuntimeDependency;
use vial_types::{parse_loose, Version};

/// A located interpreter satisfying a runtime dependency
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    pub interpreter: PathBuf,
    pub version: Version,
}

/// Locate an interpreter satisfying the dependency
///
/// Candidates are derived from the dependency name: a versioned name first
/// when the constraint is an exact pin (`python` `==3.12` -> `python3.12`),
/// then `python3`, then the bare name. The first candidate whose reported
/// version satisfies the constraint wins.
///
/// # Errors
///
/// Returns `InstallError::RuntimeUnavailable` if no candidate satisfies
/// the constraint.
pub async fn probe_runtime(dep: &RuntimeDependency) -> Result<RuntimeHandle, Error> {
    for candidate in candidates(dep) {
        if let Some(version) = report_version(&candidate).await {
            if dep.version.matches(&version) {
                return Ok(RuntimeHandle {
                    interpreter: candidate,
                    version,
                });
            }
        }
    }

    Err(InstallError::RuntimeUnavailable {
        runtime: dep.name.clone(),
        constraint: dep.version.to_string(),
    }
    .into())
}

fn candidates(dep: &RuntimeDependency) -> Vec<PathBuf> {
    let mut names = Vec::new();
    if let Some(pin) = dep.version.exact_pin() {
        names.push(format!("{}{pin}", dep.name));
    }
    names.push(format!("{}3", dep.name));
    names.push(dep.name.clone());
    names.into_iter().map(PathBuf::from).collect()
}

/// Ask a candidate interpreter for its version (`Python 3.12.5` -> `3.12.5`)
async fn report_version(interpreter: &Path) -> Option<Version> {
    let output = Command::new(interpreter)
        .arg("--version")
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }

    // Older interpreters print the banner to stderr
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    let token = text.split_whitespace().last()?;
    parse_loose(token).ok()
}
