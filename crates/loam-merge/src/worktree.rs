//! All-or-nothing working-tree updates.
//!
//! A [`WorktreePatch`] collects the writes and removals a merge needs.
//! [`WorktreePatch::prepare`] checks every destination and stages new
//! content in temp files under the metadata directory without touching the
//! working tree. [`PreparedPatch::apply`] then renames the staged files into
//! place; if any step fails, everything already applied is put back.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{MergeError, MergeResult};

/// Pending working-tree edits, keyed by repo-relative path.
#[derive(Debug, Default)]
pub(crate) struct WorktreePatch {
    writes: BTreeMap<String, Vec<u8>>,
    removals: Vec<String>,
}

impl WorktreePatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn write(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.writes.insert(path.into(), bytes.into());
    }

    pub(crate) fn remove(&mut self, path: impl Into<String>) {
        self.removals.push(path.into());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.removals.is_empty()
    }

    /// Validate destinations under `root` and stage content in `staging`.
    ///
    /// Fails with [`MergeError::WorktreeClash`] when a destination or one of
    /// its parents is in the way. The working tree is not modified.
    pub(crate) fn prepare(self, root: &Path, staging: &Path) -> MergeResult<PreparedPatch> {
        let mut backups = Vec::new();
        for rel in self.writes.keys() {
            let dest = root.join(rel);
            check_parents(root, rel, &dest)?;
            backups.push((dest.clone(), read_existing(rel, &dest)?));
        }
        for rel in &self.removals {
            let dest = root.join(rel);
            backups.push((dest.clone(), read_existing(rel, &dest)?));
        }

        fs::create_dir_all(staging)?;
        let mut staged = Vec::with_capacity(self.writes.len());
        for (rel, bytes) in self.writes {
            let mut tmp = NamedTempFile::new_in(staging)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            staged.push((root.join(&rel), tmp));
        }
        let removals = self.removals.iter().map(|rel| root.join(rel)).collect();
        debug!(writes = staged.len(), "working-tree changes staged");
        Ok(PreparedPatch {
            staged,
            removals,
            backups,
        })
    }
}

/// Walk the parents of `dest` below `root`; each must be a directory or absent.
fn check_parents(root: &Path, rel: &str, dest: &Path) -> MergeResult<()> {
    let clash = |reason: String| MergeError::WorktreeClash {
        path: rel.to_string(),
        reason,
    };
    let mut parents: Vec<&Path> = dest
        .ancestors()
        .skip(1)
        .take_while(|p| *p != root && p.starts_with(root))
        .collect();
    parents.reverse();
    for parent in parents {
        match fs::symlink_metadata(parent) {
            Ok(meta) if !meta.is_dir() => {
                return Err(clash(format!("{} is not a directory", parent.display())));
            }
            Ok(_) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Current bytes at `dest`, `None` if absent. A directory there is a clash.
fn read_existing(rel: &str, dest: &Path) -> MergeResult<Option<Vec<u8>>> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => Err(MergeError::WorktreeClash {
            path: rel.to_string(),
            reason: "a directory is in the way".to_string(),
        }),
        Ok(_) => Ok(Some(fs::read(dest)?)),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Content staged and destinations checked; nothing applied yet.
#[derive(Debug)]
pub(crate) struct PreparedPatch {
    staged: Vec<(PathBuf, NamedTempFile)>,
    removals: Vec<PathBuf>,
    backups: Vec<(PathBuf, Option<Vec<u8>>)>,
}

impl PreparedPatch {
    /// Move staged content into place and perform removals.
    ///
    /// On failure the paths already touched are restored before the error
    /// is returned.
    pub(crate) fn apply(self) -> MergeResult<AppliedPatch> {
        let mut applied = AppliedPatch {
            backups: self.backups,
            created_dirs: Vec::new(),
        };
        match apply_all(self.staged, &self.removals, &mut applied.created_dirs) {
            Ok(()) => Ok(applied),
            Err(e) => {
                applied.rollback();
                Err(e)
            }
        }
    }
}

fn apply_all(
    staged: Vec<(PathBuf, NamedTempFile)>,
    removals: &[PathBuf],
    created_dirs: &mut Vec<PathBuf>,
) -> MergeResult<()> {
    for (dest, tmp) in staged {
        if let Some(parent) = dest.parent() {
            create_dirs(parent, created_dirs)?;
        }
        tmp.persist(&dest).map_err(|e| MergeError::Io(e.error))?;
    }
    for dest in removals {
        match fs::remove_file(dest) {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// `create_dir_all` that remembers which directories it created.
fn create_dirs(dir: &Path, created: &mut Vec<PathBuf>) -> MergeResult<()> {
    let missing: Vec<PathBuf> = dir
        .ancestors()
        .take_while(|p| !p.exists())
        .map(Path::to_path_buf)
        .collect();
    for p in missing.into_iter().rev() {
        fs::create_dir(&p)?;
        created.push(p);
    }
    Ok(())
}

/// Changes now in the working tree, with what they replaced.
#[derive(Debug)]
pub(crate) struct AppliedPatch {
    backups: Vec<(PathBuf, Option<Vec<u8>>)>,
    created_dirs: Vec<PathBuf>,
}

impl AppliedPatch {
    /// Put every touched path back the way it was. Best effort.
    pub(crate) fn rollback(self) {
        for (dest, before) in self.backups.iter().rev() {
            let result = match before {
                Some(bytes) => fs::write(dest, bytes),
                None => match fs::remove_file(dest) {
                    Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
                    other => other,
                },
            };
            if let Err(e) = result {
                warn!(path = %dest.display(), error = %e, "could not restore path");
            }
        }
        for dir in self.created_dirs.iter().rev() {
            let _ = fs::remove_dir(dir);
        }
        debug!(paths = self.backups.len(), "working-tree changes rolled back");
    }
}
