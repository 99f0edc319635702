//! Version constraint parsing and matching
//!
//! Runtime dependencies use Python-style constraints (`==3.12`, `>=3.10,<4`).
//! Versions in constraints may omit trailing components; `==3.12` matches any
//! 3.12.x interpreter, the way a `python@3.12` dependency behaves.

use crate::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vial_errors::VersionError;

/// Operators recognized in constraint strings, two-character ones first.
const OPERATORS: &[&str] = &["==", ">=", "<=", "!=", "~=", ">", "<"];

/// A version with the number of components that were actually written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LooseVersion {
    version: Version,
    precision: u8,
}

impl LooseVersion {
    fn parse(s: &str) -> Result<Self, VersionError> {
        let s = s.trim();
        let precision = u8::try_from(s.split('.').count()).unwrap_or(3).min(3);
        let padded = match precision {
            1 => format!("{s}.0.0"),
            2 => format!("{s}.0"),
            _ => s.to_string(),
        };
        let version = Version::parse(&padded).map_err(|e| VersionError::ParseError {
            message: format!("{s}: {e}"),
        })?;
        Ok(Self { version, precision })
    }

    /// Compare only the components that were written in the constraint.
    fn matches_exact(&self, candidate: &Version) -> bool {
        self.version.major == candidate.major
            && (self.precision < 2 || self.version.minor == candidate.minor)
            && (self.precision < 3 || self.version.patch == candidate.patch)
    }

    fn display_short(&self) -> String {
        match self.precision {
            1 => format!("{}", self.version.major),
            2 => format!("{}.{}", self.version.major, self.version.minor),
            _ => self.version.to_string(),
        }
    }
}

/// A single version constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    op: Op,
    bound: LooseVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Op {
    Exact,
    GreaterEqual,
    LessEqual,
    NotEqual,
    Compatible,
    Greater,
    Less,
}

impl VersionConstraint {
    /// Check if a version satisfies this constraint
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        let bound = &self.bound.version;
        match self.op {
            Op::Exact => self.bound.matches_exact(version),
            Op::NotEqual => !self.bound.matches_exact(version),
            Op::GreaterEqual => version >= bound,
            Op::LessEqual => version <= bound,
            Op::Greater => version > bound,
            Op::Less => version < bound,
            // ~=X.Y.Z allows patch updates only
            Op::Compatible => {
                version >= bound
                    && version.major == bound.major
                    && version.minor == bound.minor
            }
        }
    }

    fn parse(s: &str) -> Result<Self, VersionError> {
        let s = s.trim();
        for (op_str, op) in OPERATORS.iter().zip([
            Op::Exact,
            Op::GreaterEqual,
            Op::LessEqual,
            Op::NotEqual,
            Op::Compatible,
            Op::Greater,
            Op::Less,
        ]) {
            if let Some(rest) = s.strip_prefix(op_str) {
                return Ok(Self {
                    op,
                    bound: LooseVersion::parse(rest)?,
                });
            }
        }
        Err(VersionError::InvalidConstraint {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Op::Exact => "==",
            Op::GreaterEqual => ">=",
            Op::LessEqual => "<=",
            Op::NotEqual => "!=",
            Op::Compatible => "~=",
            Op::Greater => ">",
            Op::Less => "<",
        };
        write!(f, "{op}{}", self.bound.display_short())
    }
}

/// A version specification holding zero or more constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionSpec {
    constraints: Vec<VersionConstraint>,
}

/// Parse a version that may omit trailing components (`3.12` -> `3.12.0`)
///
/// # Errors
///
/// Returns an error if the string is not a version at all.
pub fn parse_loose(s: &str) -> Result<Version, VersionError> {
    LooseVersion::parse(s).map(|lv| lv.version)
}

impl VersionSpec {
    /// Spec that matches any version
    #[must_use]
    pub fn any() -> Self {
        Self {
            constraints: vec![],
        }
    }

    /// The short version string of a lone `==` constraint, if that is what
    /// this spec is (`==3.12` -> `"3.12"`)
    ///
    /// Used to derive versioned interpreter names like `python3.12`.
    #[must_use]
    pub fn exact_pin(&self) -> Option<String> {
        match self.constraints.as_slice() {
            [VersionConstraint {
                op: Op::Exact,
                bound,
            }] => Some(bound.display_short()),
            _ => None,
        }
    }

    /// Check if a version satisfies all constraints
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }

    /// Whether this spec places no constraints at all
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl FromStr for VersionSpec {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Ok(Self::any());
        }
        // A bare version means an exact pin
        let constraints = s
            .split(',')
            .map(|part| {
                let part = part.trim();
                if part.starts_with(|c: char| c.is_ascii_digit()) {
                    Ok(VersionConstraint {
                        op: Op::Exact,
                        bound: LooseVersion::parse(part)?,
                    })
                } else {
                    VersionConstraint::parse(part)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { constraints })
    }
}

impl TryFrom<String> for VersionSpec {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VersionSpec> for String {
    fn from(spec: VersionSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraints.is_empty() {
            write!(f, "*")
        } else {
            let parts: Vec<_> = self.constraints.iter().map(ToString::to_string).collect();
            write!(f, "{}", parts.join(","))
        }
    }
}
