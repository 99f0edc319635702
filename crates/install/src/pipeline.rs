//! The record consumption pipeline
//!
//! Order matters and is part of the contract: the runtime is probed before
//! any fetch, every artifact is fetched and verified before the environment
//! is provisioned, and the executable link lands atomically after the
//! archives are installed. A smoke-test failure is reported after the
//! install has been committed and does not roll it back.

use crate::runtime::probe_runtime;
use crate::staging::EnvGuard;
use crate::venv::VenvManager;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use vial_config::Layout;
use vial_errors::{Error, InstallError};
use vial_events::{AppEvent, EventEmitter, EventSender};
use vial_formula::Formula;
use vial_net::{fetch_and_verify, NetClient};
use vial_types::{PackageId, Version};

/// Outcome of a successful install
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub package_id: PackageId,
    pub venv_path: PathBuf,
    pub executable_path: PathBuf,
    pub runtime_version: Version,
}

/// Consumes formula records: fetch, verify, provision, install, smoke-test
pub struct Installer {
    layout: Layout,
    net: NetClient,
    events: Option<EventSender>,
}

impl Installer {
    /// Create an installer over a filesystem layout
    #[must_use]
    pub fn new(layout: Layout, net: NetClient) -> Self {
        Self {
            layout,
            net,
            events: None,
        }
    }

    /// Attach an event sender for progress reporting
    #[must_use]
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    fn events(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }

    /// Install one record
    ///
    /// # Errors
    ///
    /// Returns the first pipeline error; see `InstallError::failing_step`
    /// for which step aborted. On any error except `SmokeTestFailed` no
    /// partially installed environment or executable remains.
    pub async fn install(&self, formula: &Formula) -> Result<InstallReport, Error> {
        let package_id = formula.package_id();
        self.events()
            .emit_operation_started(format!("install {package_id}"));

        // Fail fast on an unsatisfiable runtime, before any fetch side effect
        let runtime = probe_runtime(&formula.runtime).await?;

        self.layout.ensure().await?;
        let archives = self.fetch_artifacts(formula, &package_id).await?;

        let manager = VenvManager::new(self.layout.venvs_dir());
        let venv_path = manager.venv_path(&package_id);
        let mut guard = EnvGuard::new(venv_path.clone());

        self.events().emit(AppEvent::VenvCreating {
            package: package_id.name.clone(),
            version: package_id.version.clone(),
            python: runtime.interpreter.display().to_string(),
        });
        manager
            .create_venv(&package_id, &runtime.interpreter, guard.path())
            .await?;
        self.events().emit(AppEvent::VenvCreated {
            package: package_id.name.clone(),
            version: package_id.version.clone(),
        });

        // Resources first, then the primary archive, matching the order a
        // virtualenv-with-resources install resolves its closure
        for archive in &archives {
            manager
                .install_archive(&package_id, guard.path(), archive, self.events())
                .await?;
        }

        let executable_path = manager
            .link_executable(
                guard.path(),
                &formula.test.executable,
                &self.layout.bin_dir(),
                self.events(),
            )
            .await?;
        guard.commit();

        self.run_smoke_test(formula, &executable_path).await?;

        self.events()
            .emit_operation_completed(format!("install {package_id}"), true);

        Ok(InstallReport {
            package_id,
            venv_path,
            executable_path,
            runtime_version: runtime.version,
        })
    }

    /// Remove an installed record: executable link first, then the environment
    ///
    /// # Errors
    ///
    /// Returns `InstallError::NotInstalled` if no environment exists for
    /// the record.
    pub async fn uninstall(&self, formula: &Formula) -> Result<(), Error> {
        let package_id = formula.package_id();
        let manager = VenvManager::new(self.layout.venvs_dir());
        let venv_path = manager.venv_path(&package_id);

        if !venv_path.exists() {
            return Err(InstallError::NotInstalled {
                package: package_id.to_string(),
            }
            .into());
        }

        let link = self.layout.bin_dir().join(&formula.test.executable);
        let _ = tokio::fs::remove_file(&link).await;
        tokio::fs::remove_dir_all(&venv_path).await.map_err(|e| {
            InstallError::FilesystemError {
                operation: "remove_venv".to_string(),
                path: venv_path.display().to_string(),
                message: e.to_string(),
            }
        })?;

        self.events()
            .emit_operation_completed(format!("uninstall {package_id}"), true);
        Ok(())
    }

    /// Fetch and verify every pinned artifact, resources before the source
    async fn fetch_artifacts(
        &self,
        formula: &Formula,
        package_id: &PackageId,
    ) -> Result<Vec<PathBuf>, Error> {
        let cache = self.layout.cache_dir().join(package_id.to_string());
        let mut archives = Vec::with_capacity(formula.resources.len() + 1);

        for resource in &formula.resources {
            let dest = cache.join(archive_file_name(&resource.url, &resource.name));
            fetch_and_verify(
                &self.net,
                &resource.url,
                &resource.sha256,
                &dest,
                &resource.name,
                self.events(),
            )
            .await?;
            archives.push(dest);
        }

        let label = formula.source_label();
        let dest = cache.join(archive_file_name(&formula.source.url, &label));
        fetch_and_verify(
            &self.net,
            &formula.source.url,
            &formula.source.sha256,
            &dest,
            &label,
            self.events(),
        )
        .await?;
        archives.push(dest);

        Ok(archives)
    }

    /// Invoke the installed executable with the record's help flag
    async fn run_smoke_test(&self, formula: &Formula, executable_path: &Path) -> Result<(), Error> {
        let test = &formula.test;
        self.events().emit(AppEvent::SmokeTestStarted {
            executable: test.executable.clone(),
            flag: test.flag.clone(),
        });

        let status = Command::new(executable_path)
            .arg(&test.flag)
            .output()
            .await
            .map(|output| output.status);

        match status {
            Ok(status) if status.success() => {
                self.events().emit(AppEvent::SmokeTestPassed {
                    executable: test.executable.clone(),
                });
                Ok(())
            }
            Ok(status) => {
                let status = status.to_string();
                self.events().emit(AppEvent::SmokeTestFailed {
                    executable: test.executable.clone(),
                    status: status.clone(),
                });
                Err(InstallError::SmokeTestFailed {
                    executable: test.executable.clone(),
                    flag: test.flag.clone(),
                    status,
                }
                .into())
            }
            Err(e) => {
                let status = e.to_string();
                self.events().emit(AppEvent::SmokeTestFailed {
                    executable: test.executable.clone(),
                    status: status.clone(),
                });
                Err(InstallError::SmokeTestFailed {
                    executable: test.executable.clone(),
                    flag: test.flag.clone(),
                    status,
                }
                .into())
            }
        }
    }
}

/// Derive a cache file name from an archive URL
fn archive_file_name(url: &str, fallback: &str) -> String {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("{fallback}.tar.gz"), ToString::to_string)
}
