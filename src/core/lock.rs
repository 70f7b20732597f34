//! core::lock
//!
//! Exclusive run lock guarding a map artifact.
//!
//! Only one pipeline run may rebuild a given artifact at a time. The lock
//! lives next to the artifact as `.<file name>.lock` and is held with an
//! OS-level exclusive lock for the whole run.
//!
//! # Invariants
//!
//! - Acquisition is non-blocking (fails fast if another run holds it)
//! - The lock is released on drop
//!
//! # Example
//!
//! ```no_run
//! use countmap::core::lock::RunLock;
//! use std::path::Path;
//!
//! let lock = RunLock::acquire(Path::new("templates/map.html")).unwrap();
//! assert!(lock.is_held());
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another run already holds the lock.
    #[error("map artifact '{0}' is being rebuilt by another run")]
    AlreadyLocked(PathBuf),

    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on one artifact path.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    file: Option<File>,
}

impl RunLock {
    /// Compute the lock file path for an artifact.
    pub fn lock_path(artifact: &Path) -> PathBuf {
        let name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        artifact.with_file_name(format!(".{}.lock", name))
    }

    /// Acquire the lock for `artifact`, creating parent directories.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another run holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    pub fn acquire(artifact: &Path) -> Result<Self, LockError> {
        let path = Self::lock_path(artifact);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LockError::CreateFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(LockError::AlreadyLocked(artifact.to_path_buf()))
            }
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard is dropped.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_is_hidden_sibling() {
        assert_eq!(
            RunLock::lock_path(Path::new("templates/map.html")),
            PathBuf::from("templates/.map.html.lock")
        );
    }

    #[test]
    fn acquire_creates_parent_dirs() {
        let temp = TempDir::new().expect("temp dir");
        let artifact = temp.path().join("nested/out/map.html");

        let lock = RunLock::acquire(&artifact).expect("acquire");
        assert!(lock.is_held());
        assert!(lock.path().exists());
    }

    #[test]
    fn second_acquire_fails_fast() {
        let temp = TempDir::new().expect("temp dir");
        let artifact = temp.path().join("map.html");

        let _held = RunLock::acquire(&artifact).expect("first acquire");
        let result = RunLock::acquire(&artifact);
        assert!(matches!(result, Err(LockError::AlreadyLocked(_))));
    }

    #[test]
    fn released_on_drop() {
        let temp = TempDir::new().expect("temp dir");
        let artifact = temp.path().join("map.html");

        {
            let _lock = RunLock::acquire(&artifact).expect("first acquire");
        }

        let lock = RunLock::acquire(&artifact).expect("second acquire");
        assert!(lock.is_held());
    }

    #[test]
    fn explicit_release_is_repeatable() {
        let temp = TempDir::new().expect("temp dir");
        let artifact = temp.path().join("map.html");

        let mut lock = RunLock::acquire(&artifact).expect("acquire");
        lock.release().expect("first release");
        lock.release().expect("second release");
        assert!(!lock.is_held());
    }
}
