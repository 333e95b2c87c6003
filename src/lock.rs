//! File-based locking to prevent concurrent runs.
//!
//! Two runs sharing a work directory would wipe each other's raw files, so
//! only one instance may hold the lock at a time.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::CombinerError;

pub const LOCK_FILE_NAME: &str = ".blocklist-combiner.lock";

/// A guard that holds an exclusive lock inside the work directory.
/// The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct LockGuard {
    _file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Attempt to acquire the lock without blocking.
    pub fn acquire(work_dir: &Path) -> Result<Self, CombinerError> {
        fs::create_dir_all(work_dir)?;
        let path = work_dir.join(LOCK_FILE_NAME);

        // create+read+write without truncate avoids a race between creation and locking
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                CombinerError::Lock(format!("Failed to open lock file {}: {}", path.display(), e))
            })?;

        file.try_lock_exclusive().map_err(|_| {
            CombinerError::Lock(format!(
                "Another run is already using {}. Wait for it to finish or remove {}",
                work_dir.display(),
                path.display()
            ))
        })?;

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
