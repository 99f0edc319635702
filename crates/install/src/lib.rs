#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Formula installation pipeline
//!
//! Consuming one record is a linear, one-shot sequence: probe the runtime,
//! fetch and verify every pinned artifact, provision an isolated virtual
//! environment, install the archives into it, atomically link the declared
//! executable, and run the smoke test. Each step completes before the next
//! begins; failure at any step before the link leaves nothing reachable.

mod pipeline;
mod runtime;
mod staging;
mod venv;

pub use pipeline::{InstallReport, Installer};
pub use runtime::{probe_runtime, RuntimeHandle};
pub use staging::EnvGuard;
pub use venv::VenvManager;
