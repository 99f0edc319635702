#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Formula records and tap resolution
//!
//! A *formula record* is an immutable manifest describing how to fetch,
//! verify, install, and smoke-test one named CLI package. Records are
//! append-only: a new release is a new record file, never an edit of an old
//! one. A *tap* is a directory of record files forming one distribution
//! channel.

mod record;
mod tap;

pub use record::{Artifact, Formula, InstallSection, Procedure, RuntimeDependency, SmokeTest};
pub use tap::{AuditFinding, Tap};
