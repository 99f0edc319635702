//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vial - formula-driven installer for Python command line tools
#[derive(Parser)]
#[command(name = "vial")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Install pinned Python CLI tools into isolated environments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Tap directory holding formula records
    #[arg(long, global = true, value_name = "DIR")]
    pub tap: Option<PathBuf>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Install a package from its formula record
    #[command(alias = "i")]
    Install {
        /// Package name
        package: String,

        /// Version constraint (e.g. ==1.0.1, >=1.0)
        #[arg(long, value_name = "SPEC")]
        version: Option<String>,

        /// Pin the exact record by its source SHA-256 digest
        #[arg(long, value_name = "SHA256")]
        pin: Option<String>,
    },

    /// Uninstall a package
    #[command(alias = "rm")]
    Uninstall {
        /// Package name
        package: String,
    },

    /// List records available in the tap
    #[command(alias = "ls")]
    List,

    /// Show the resolved record for a package
    Info {
        /// Package name
        package: String,
    },

    /// Validate every record in the tap
    Check,
}
