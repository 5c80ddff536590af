use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Advisory, exclusive, process-wide repository lock.
///
/// Held for the duration of a mutating operation and released on drop.
/// Acquisition blocks until any other holder releases it.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
    path: PathBuf,
}

impl RepoLock {
    /// Block until the lock file at `path` is held exclusively.
    pub fn acquire(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        FileExt::lock_exclusive(&file).map_err(|source| StoreError::Lock {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "repository lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to release repository lock");
        }
    }
}
