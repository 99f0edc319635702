#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for vial
//!
//! Configuration is merged from hard-coded defaults, an optional
//! `~/.config/vial/config.toml`, and CLI flags (highest precedence).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use vial_errors::{ConfigError, Error};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Root directory for installed environments and executables
    pub root: Option<PathBuf>,
    /// Default tap directory holding formula records
    pub tap: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 300,
            retries: 3,
            retry_delay: 1,
        }
    }
}

fn default_timeout() -> u64 {
    300
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load from an explicit path, the default location, or fall back to defaults
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// config file is not.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given config file is missing or invalid.
    pub async fn load_or_default(explicit: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = explicit {
            return Self::load(path).await;
        }

        let default_path = Self::default_path();
        if fs::metadata(&default_path).await.is_ok() {
            Self::load(&default_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Default config file location
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("/"), PathBuf::from);
        home.join(".config").join("vial").join("config.toml")
    }

    /// Resolved root directory for installs
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.paths.root.clone().unwrap_or_else(|| {
            let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("/"), PathBuf::from);
            home.join(".local").join("share").join("vial")
        })
    }
}

/// Filesystem layout under the root directory
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory holding one venv per installed package
    #[must_use]
    pub fn venvs_dir(&self) -> PathBuf {
        self.root.join("venvs")
    }

    /// Directory of linked executables, expected on the user's PATH
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Scratch space for in-progress installs
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Download cache for fetched archives
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Create the full layout on disk
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub async fn ensure(&self) -> Result<(), Error> {
        for dir in [
            self.venvs_dir(),
            self.bin_dir(),
            self.staging_dir(),
            self.cache_dir(),
        ] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| Error::io_with_path(&e, dir))?;
        }
        Ok(())
    }
}
