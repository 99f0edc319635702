#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions shared across vial crates

mod package;
mod version;

pub use package::PackageId;
pub use semver::Version;
pub use version::{parse_loose, VersionConstraint, VersionSpec};
