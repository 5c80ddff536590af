use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use loam_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Filesystem-backed object store.
///
/// Blobs live under `<root>/<first 2 hex>/<remaining 62 hex>`. A blob is
/// written to a temp file in its fan-out directory, synced, then renamed into
/// place, so readers only ever observe complete objects.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the fan-out buckets.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location of the blob for `id`.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId> {
        let id = ObjectId::from_bytes(data);
        let path = self.object_path(&id);
        if path.is_file() {
            return Ok(id);
        }

        let bucket = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&bucket)?;

        let mut tmp = NamedTempFile::new_in(&bucket)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(object = %id.short_hex(), bytes = data.len(), "stored blob");
        Ok(id)
    }

    fn read(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let data = match fs::read(self.object_path(id)) {
            Ok(data) => data,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let computed = ObjectId::from_bytes(&data);
        if computed != *id {
            warn!(object = %id, computed = %computed, "blob failed hash verification");
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(data))
    }

    fn contains(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn remove(&self, id: &ObjectId) -> StoreResult<bool> {
        let path = self.object_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(object = %id.short_hex(), "released blob");
                // Drop the bucket if it is now empty; a non-empty bucket is fine.
                if let Some(bucket) = path.parent() {
                    let _ = fs::remove_dir(bucket);
                }
                Ok(true)
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
