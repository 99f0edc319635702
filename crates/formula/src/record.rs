//! The formula record schema

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs;
use vial_errors::{Error, FormulaError};
use vial_hash::Checksum;
use vial_types::{PackageId, Version, VersionSpec};

/// An immutable install manifest for one package version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Formula {
    pub name: String,
    pub version: Version,
    /// Orders records that share `(name, version)`; higher wins
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub license: String,
    pub source: Artifact,
    pub runtime: RuntimeDependency,
    #[serde(default, rename = "resource")]
    pub resources: Vec<Artifact>,
    #[serde(default)]
    pub install: InstallSection,
    pub test: SmokeTest,
}

/// A downloadable archive pinned by URL and SHA-256 digest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Artifact {
    /// Resource name; empty for the primary source archive
    #[serde(default)]
    pub name: String,
    pub url: String,
    pub sha256: Checksum,
}

/// Required interpreter and version constraint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeDependency {
    pub name: String,
    pub version: VersionSpec,
}

impl fmt::Display for RuntimeDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.version)
    }
}

/// Installation procedure section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallSection {
    #[serde(default)]
    pub procedure: Procedure,
}

/// How the package is materialized into an environment
///
/// Only one procedure exists in this corpus; the enum keeps unknown values a
/// schema error instead of a silent fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Procedure {
    #[default]
    Virtualenv,
}

/// Post-install check: run the named executable with a help flag
///
/// The executable name is per-record data; upstream renamed its binary
/// between revisions, so nothing here hard-codes a name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmokeTest {
    pub executable: String,
    #[serde(default = "default_flag")]
    pub flag: String,
}

fn default_flag() -> String {
    "--help".to_string()
}

impl Formula {
    /// Parse a record from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or fails schema validation.
    /// `origin` names the record for error messages, usually the file path.
    pub fn from_toml(origin: &str, content: &str) -> Result<Self, Error> {
        let formula: Self = toml::from_str(content).map_err(|e| FormulaError::ParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        formula.validate(origin)?;
        Ok(formula)
    }

    /// Load and validate a record file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub async fn from_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        Self::from_toml(&path.display().to_string(), &content)
    }

    /// Schema validation beyond what serde enforces
    ///
    /// Checksums are already validated strictly during deserialization.
    ///
    /// # Errors
    ///
    /// Returns an error on empty names, non-http(s) URLs, or a missing
    /// test executable.
    pub fn validate(&self, origin: &str) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(FormulaError::EmptyName {
                path: origin.to_string(),
            }
            .into());
        }

        validate_url("source.url", &self.source.url)?;
        for resource in &self.resources {
            validate_url(&format!("resource.{}.url", resource.name), &resource.url)?;
        }

        if self.test.executable.trim().is_empty() {
            return Err(FormulaError::MissingExecutable {
                name: self.name.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Identity of the package this record installs
    #[must_use]
    pub fn package_id(&self) -> PackageId {
        PackageId::new(self.name.clone(), self.version.clone())
    }

    /// Display label for the source artifact in events and errors
    #[must_use]
    pub fn source_label(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

fn validate_url(field: &str, url: &str) -> Result<(), Error> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(FormulaError::InvalidUrl {
            field: field.to_string(),
            url: url.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> String {
        let digest = Checksum::from_data(b"termo archive").to_hex();
        format!(
            r#"
name = "termo"
version = "1.1.1"
description = "A CLI tool for recording and running macros in the terminal"
homepage = "https://github.com/example/termo"
license = "MIT"

[source]
url = "https://example.com/termo-1.1.1.tar.gz"
sha256 = "{digest}"

[runtime]
name = "python"
version = "==3.12"

[[resource]]
name = "click"
url = "https://example.com/click-8.1.7.tar.gz"
sha256 = "{digest}"

[test]
executable = "tm"
"#
        )
    }

    #[test]
    fn test_parse_complete_record() {
        let formula = Formula::from_toml("termo.toml", &sample_toml()).unwrap();
        assert_eq!(formula.name, "termo");
        assert_eq!(formula.version, Version::parse("1.1.1").unwrap());
        assert_eq!(formula.revision, 0);
        assert_eq!(formula.license, "MIT");
        assert_eq!(formula.runtime.name, "python");
        assert_eq!(formula.resources.len(), 1);
        assert_eq!(formula.resources[0].name, "click");
        assert_eq!(formula.install.procedure, Procedure::Virtualenv);
        assert_eq!(formula.test.executable, "tm");
        assert_eq!(formula.test.flag, "--help");
    }

    #[test]
    fn test_runtime_constraint_matches_patch_releases() {
        let formula = Formula::from_toml("termo.toml", &sample_toml()).unwrap();
        assert!(formula
            .runtime
            .version
            .matches(&Version::parse("3.12.5").unwrap()));
        assert!(!formula
            .runtime
            .version
            .matches(&Version::parse("3.11.9").unwrap()));
    }

    #[test]
    fn test_oversized_checksum_is_schema_error() {
        let toml = sample_toml().replace(
            &Checksum::from_data(b"termo archive").to_hex(),
            // 68 hex characters, as found in broken upstream records
            "c99986991a7a775c573e67268046c6d89c8f69381549aecb0257897051e2f858c522",
        );
        let err = Formula::from_toml("termo.toml", &toml).unwrap_err();
        assert!(err.to_string().contains("termo.toml"), "{err}");
    }

    #[test]
    fn test_unknown_procedure_rejected() {
        let toml = format!("{}\n[install]\nprocedure = \"bottle\"\n", sample_toml());
        assert!(Formula::from_toml("termo.toml", &toml).is_err());
    }

    #[test]
    fn test_non_http_source_rejected() {
        let toml = sample_toml().replace(
            "https://example.com/termo-1.1.1.tar.gz",
            "ftp://example.com/termo-1.1.1.tar.gz",
        );
        let err = Formula::from_toml("termo.toml", &toml).unwrap_err();
        assert!(err.to_string().contains("source.url"), "{err}");
    }

    #[test]
    fn test_missing_executable_rejected() {
        let toml = sample_toml().replace("executable = \"tm\"", "executable = \"\"");
        assert!(Formula::from_toml("termo.toml", &toml).is_err());
    }

    #[test]
    fn test_smoke_flag_override() {
        let toml = sample_toml().replace(
            "executable = \"tm\"",
            "executable = \"tm\"\nflag = \"-h\"",
        );
        let formula = Formula::from_toml("termo.toml", &toml).unwrap();
        assert_eq!(formula.test.flag, "-h");
    }
}
