//! Scoped cleanup for in-progress environments
//!
//! Provisioning a virtual environment is a filesystem mutation with no
//! built-in rollback, so the whole provision-and-install sequence runs under
//! a guard: until `commit()` is called, dropping the guard removes the
//! partially created environment.

use std::path::{Path, PathBuf};

/// RAII guard over an environment directory being built
#[derive(Debug)]
pub struct EnvGuard {
    path: PathBuf,
    committed: bool,
}

impl EnvGuard {
    /// Guard a directory that is about to be created
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    /// The guarded path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the guard; the environment is now permanent
    pub fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        if !self.committed {
            // Best effort removal of the partial environment
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_removes_uncommitted_dir() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("termo-1.1.1");
        std::fs::create_dir_all(env_path.join("bin")).unwrap();
        std::fs::write(env_path.join("bin").join("tm"), b"#!/bin/sh\n").unwrap();

        {
            let _guard = EnvGuard::new(env_path.clone());
            assert!(env_path.exists());
        }
        assert!(!env_path.exists());
    }

    #[test]
    fn test_commit_keeps_dir() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("termo-1.1.1");
        std::fs::create_dir_all(&env_path).unwrap();

        {
            let mut guard = EnvGuard::new(env_path.clone());
            guard.commit();
        }
        assert!(env_path.exists());
    }

    #[test]
    fn test_drop_tolerates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let _guard = EnvGuard::new(dir.path().join("never-created"));
    }
}
