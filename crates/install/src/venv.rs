//! Virtual environment provisioning and archive installation

use std::path::{Path, PathBuf};
use tokio::process::Command;
use vial_errors::{Error, InstallError};
use vial_events::{AppEvent, EventEmitter, EventSender};
use vial_types::PackageId;

/// Manages per-package virtual environments under a base directory
pub struct VenvManager {
    venvs_base: PathBuf,
}

impl VenvManager {
    /// Create a new venv manager
    #[must_use]
    pub fn new(venvs_base: PathBuf) -> Self {
        Self { venvs_base }
    }

    /// Final path of the environment for a package
    #[must_use]
    pub fn venv_path(&self, package_id: &PackageId) -> PathBuf {
        self.venvs_base.join(package_id.to_string())
    }

    /// Create a fresh virtual environment with the given interpreter
    ///
    /// Any pre-existing environment at the path is removed first, so a
    /// reinstall starts from a clean slate.
    ///
    /// # Errors
    ///
    /// Returns an error if directory preparation or `-m venv` fails.
    pub async fn create_venv(
        &self,
        package_id: &PackageId,
        interpreter: &Path,
        venv_path: &Path,
    ) -> Result<(), Error> {
        if let Some(parent) = venv_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallError::FilesystemError {
                    operation: "create_venvs_base".to_string(),
                    path: parent.display().to_string(),
                    message: e.to_string(),
                })?;
        }

        if venv_path.exists() {
            tokio::fs::remove_dir_all(venv_path).await.map_err(|e| {
                InstallError::FilesystemError {
                    operation: "remove_existing_venv".to_string(),
                    path: venv_path.display().to_string(),
                    message: e.to_string(),
                }
            })?;
        }

        let output = Command::new(interpreter)
            .arg("-m")
            .arg("venv")
            .arg(venv_path)
            .output()
            .await
            .map_err(|e| InstallError::VenvFailed {
                package: package_id.name.clone(),
                message: format!("failed to execute {}: {e}", interpreter.display()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InstallError::VenvFailed {
                package: package_id.name.clone(),
                message: format!("venv creation failed: {stderr}"),
            }
            .into());
        }

        Ok(())
    }

    /// Install a verified archive into the environment
    ///
    /// Runs `pip install --no-deps --no-index` so nothing outside the
    /// record's pinned artifacts enters the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is missing or pip fails.
    pub async fn install_archive(
        &self,
        package_id: &PackageId,
        venv_path: &Path,
        archive: &Path,
        events: Option<&EventSender>,
    ) -> Result<(), Error> {
        if !archive.exists() {
            return Err(InstallError::PipFailed {
                package: package_id.name.clone(),
                message: format!("archive not found: {}", archive.display()),
            }
            .into());
        }

        let archive_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        events.emit(AppEvent::ArchiveInstalling {
            package: package_id.name.clone(),
            archive: archive_name.clone(),
        });

        let pip = venv_path.join("bin").join("pip");
        let output = Command::new(&pip)
            .arg("install")
            .arg("--no-deps")
            .arg("--no-index")
            .arg(archive)
            .output()
            .await
            .map_err(|e| InstallError::PipFailed {
                package: package_id.name.clone(),
                message: format!("failed to execute {}: {e}", pip.display()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InstallError::PipFailed {
                package: package_id.name.clone(),
                message: format!("pip install failed: {stderr}"),
            }
            .into());
        }

        events.emit(AppEvent::ArchiveInstalled {
            package: package_id.name.clone(),
            archive: archive_name,
        });

        Ok(())
    }

    /// Link the environment's executable into the bin directory
    ///
    /// The link is created under a temporary name and renamed into place, so
    /// the executable becomes reachable atomically or not at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment exposes no such executable or
    /// linking fails.
    pub async fn link_executable(
        &self,
        venv_path: &Path,
        executable: &str,
        bin_dir: &Path,
        events: Option<&EventSender>,
    ) -> Result<PathBuf, Error> {
        let target = venv_path.join("bin").join(executable);
        if !target.exists() {
            return Err(InstallError::ExecutableMissing {
                executable: executable.to_string(),
            }
            .into());
        }

        tokio::fs::create_dir_all(bin_dir)
            .await
            .map_err(|e| InstallError::FilesystemError {
                operation: "create_bin_dir".to_string(),
                path: bin_dir.display().to_string(),
                message: e.to_string(),
            })?;

        let final_link = bin_dir.join(executable);
        let temp_link = bin_dir.join(format!(".{executable}.{}", std::process::id()));

        let _ = tokio::fs::remove_file(&temp_link).await;
        tokio::fs::symlink(&target, &temp_link).await.map_err(|e| {
            InstallError::FilesystemError {
                operation: "symlink_executable".to_string(),
                path: temp_link.display().to_string(),
                message: e.to_string(),
            }
        })?;

        if let Err(e) = tokio::fs::rename(&temp_link, &final_link).await {
            let _ = tokio::fs::remove_file(&temp_link).await;
            return Err(InstallError::AtomicOperationFailed {
                message: format!("failed to place {}: {e}", final_link.display()),
            }
            .into());
        }

        events.emit(AppEvent::ExecutableLinked {
            executable: executable.to_string(),
            path: final_link.display().to_string(),
        });

        Ok(final_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use vial_types::Version;

    fn fake_venv(root: &Path, executable: &str) -> PathBuf {
        let venv = root.join("venv");
        std::fs::create_dir_all(venv.join("bin")).unwrap();
        let exe = venv.join("bin").join(executable);
        std::fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        venv
    }

    #[tokio::test]
    async fn test_link_executable_creates_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let venv = fake_venv(dir.path(), "tm");
        let bin_dir = dir.path().join("bin");

        let manager = VenvManager::new(dir.path().join("venvs"));
        let link = manager
            .link_executable(&venv, "tm", &bin_dir, None)
            .await
            .unwrap();

        assert_eq!(link, bin_dir.join("tm"));
        let resolved = std::fs::read_link(&link).unwrap();
        assert_eq!(resolved, venv.join("bin").join("tm"));
        // No temp link left behind
        assert_eq!(std::fs::read_dir(&bin_dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_link_replaces_previous_install() {
        let dir = tempfile::tempdir().unwrap();
        let old_venv = fake_venv(&dir.path().join("old"), "tm");
        let new_venv = fake_venv(&dir.path().join("new"), "tm");
        let bin_dir = dir.path().join("bin");

        let manager = VenvManager::new(dir.path().join("venvs"));
        manager
            .link_executable(&old_venv, "tm", &bin_dir, None)
            .await
            .unwrap();
        let link = manager
            .link_executable(&new_venv, "tm", &bin_dir, None)
            .await
            .unwrap();

        let resolved = std::fs::read_link(&link).unwrap();
        assert_eq!(resolved, new_venv.join("bin").join("tm"));
    }

    #[tokio::test]
    async fn test_link_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let venv = fake_venv(dir.path(), "tm");
        let bin_dir = dir.path().join("bin");

        let manager = VenvManager::new(dir.path().join("venvs"));
        let err = manager
            .link_executable(&venv, "mrec", &bin_dir, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Install(InstallError::ExecutableMissing { .. })
        ));
        assert!(!bin_dir.join("mrec").exists());
    }

    #[tokio::test]
    async fn test_install_archive_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let venv = fake_venv(dir.path(), "tm");
        let manager = VenvManager::new(dir.path().join("venvs"));
        let id = PackageId::new("termo", Version::parse("1.1.1").unwrap());

        let err = manager
            .install_archive(&id, &venv, &dir.path().join("absent.tar.gz"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Install(InstallError::PipFailed { .. })));
    }

    #[test]
    fn test_venv_path_uses_package_id() {
        let manager = VenvManager::new(PathBuf::from("/opt/vial/venvs"));
        let id = PackageId::new("macro-cli", Version::parse("1.0.1").unwrap());
        assert_eq!(
            manager.venv_path(&id),
            PathBuf::from("/opt/vial/venvs/macro-cli-1.0.1")
        );
    }
}
