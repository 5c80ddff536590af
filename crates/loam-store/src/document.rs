//! Atomic JSON documents.
//!
//! Every piece of repository state (staging index, branch registry, history,
//! pending merge) is a single JSON document. Writes go to a temp file in the
//! same directory, are synced, and are renamed over the target, so a crash
//! leaves either the old document or the new one and never a torn file.

use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::trace;

use crate::error::{StoreError, StoreResult};

/// Read and parse the document at `path`.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::CorruptDocument {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Read the document at `path`, or `T::default()` if it does not exist yet.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> StoreResult<T> {
    Ok(read_json(path)?.unwrap_or_default())
}

/// Atomically replace the document at `path` with `value`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    write_bytes_atomic(path, &bytes)?;
    trace!(path = %path.display(), bytes = bytes.len(), "document written");
    Ok(())
}

/// Atomically replace the file at `path` with raw bytes.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Remove the document at `path`. Returns `true` if it existed.
pub fn remove_document(path: &Path) -> StoreResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn missing_document_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let got: Option<BTreeMap<String, u32>> = read_json(&dir.path().join("nope.json")).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn missing_document_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let got: BTreeMap<String, u32> = read_json_or_default(&dir.path().join("nope.json")).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let mut doc = BTreeMap::new();
        doc.insert("a".to_string(), 1u32);
        doc.insert("b".to_string(), 2u32);

        write_json_atomic(&path, &doc).unwrap();
        let back: BTreeMap<String, u32> = read_json(&path).unwrap().unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        write_json_atomic(&path, &vec![4]).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("doc.json")]);
        let back: Vec<i32> = read_json(&path).unwrap().unwrap();
        assert_eq!(back, vec![4]);
    }

    #[test]
    fn corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, b"{not json").unwrap();
        let err = read_json::<Vec<i32>>(&path).unwrap_err();
        assert!(matches!(err, StoreError::CorruptDocument { .. }));
    }

    #[test]
    fn remove_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &1u8).unwrap();
        assert!(remove_document(&path).unwrap());
        assert!(!remove_document(&path).unwrap());
    }
}
