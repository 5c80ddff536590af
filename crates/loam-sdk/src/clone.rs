//! Plain directory copy used by `clone`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::error::{SdkError, SdkResult};

/// Copy every file and directory under `source` into `destination`.
///
/// Existing files in `destination` are overwritten; others are left alone.
/// Symlinks are not followed. Returns the number of files copied.
pub fn clone_directory(source: &Path, destination: &Path) -> SdkResult<usize> {
    let source = fs::canonicalize(source)?;
    fs::create_dir_all(destination)?;
    let destination = fs::canonicalize(destination)?;

    let invalid = |reason: &str| SdkError::InvalidCloneTarget {
        source_dir: source.clone(),
        destination: destination.clone(),
        reason: reason.to_string(),
    };
    if destination == source {
        return Err(invalid("source and destination are the same directory"));
    }
    if destination.starts_with(&source) {
        return Err(invalid("destination is inside the source"));
    }

    let mut copied = 0;
    for entry in WalkDir::new(&source).min_depth(1) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(&source)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(entry.file_name()));
        let dest = destination.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
        } else if file_type.is_file() {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
    }

    info!(
        source = %source.display(),
        destination = %destination.display(),
        files = copied,
        "directory cloned"
    );
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_nested_tree() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("a/b")).unwrap();
        fs::write(src.path().join("top.txt"), "t").unwrap();
        fs::write(src.path().join("a/b/deep.txt"), "d").unwrap();
        fs::create_dir_all(src.path().join("empty")).unwrap();

        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("copy");
        assert_eq!(clone_directory(src.path(), &dest).unwrap(), 2);
        assert_eq!(fs::read_to_string(dest.join("a/b/deep.txt")).unwrap(), "d");
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn refuses_destination_inside_source() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("f"), "x").unwrap();
        let err = clone_directory(src.path(), &src.path().join("inner")).unwrap_err();
        assert!(matches!(err, SdkError::InvalidCloneTarget { .. }));
        assert_eq!(err.kind(), loam_types::ErrorKind::Validation);

        let err = clone_directory(src.path(), src.path()).unwrap_err();
        assert!(matches!(err, SdkError::InvalidCloneTarget { .. }));
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let out = tempfile::tempdir().unwrap();
        let err = clone_directory(&out.path().join("nope"), &out.path().join("dest")).unwrap_err();
        assert!(matches!(err, SdkError::Io(_)));
    }
}
