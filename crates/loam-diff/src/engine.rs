//! Commit-to-commit and commit-to-working-tree comparisons.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use loam_commit::CommitStore;
use loam_ignore::IgnoreMatcher;
use loam_types::ObjectId;
use serde::Serialize;
use tracing::debug;

use crate::blob_diff::{compare_files, FileDiff};
use crate::error::DiffResult;
use crate::tree_diff::{compare_trees, TreeChange};

/// How a path changed between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// One changed path with its line diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub status: ChangeStatus,
    pub diff: FileDiff,
}

/// Differences between two commits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitDiff {
    pub files: Vec<FileChange>,
    /// Added plus removed lines over all files.
    pub total_changes: usize,
}

/// Differences between a commit and the working tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorktreeDiff {
    /// The commit compared against, if any.
    pub base: Option<ObjectId>,
    pub files: Vec<FileChange>,
    pub total_changes: usize,
}

impl WorktreeDiff {
    fn with_status(&self, status: ChangeStatus) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| f.status == status)
            .map(|f| f.path.as_str())
            .collect()
    }

    /// Files on disk that the commit does not have.
    pub fn added(&self) -> Vec<&str> {
        self.with_status(ChangeStatus::Added)
    }

    /// Files whose content differs from the commit.
    pub fn modified(&self) -> Vec<&str> {
        self.with_status(ChangeStatus::Modified)
    }

    /// Committed files missing on disk.
    pub fn deleted(&self) -> Vec<&str> {
        self.with_status(ChangeStatus::Deleted)
    }

    /// Returns `true` if the working tree matches the commit.
    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }
}

/// Computes diffs for one repository.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    root: PathBuf,
    commits: CommitStore,
    ignore: IgnoreMatcher,
}

impl DiffEngine {
    /// An engine over the working tree at `root`.
    pub fn new(root: impl Into<PathBuf>, commits: CommitStore, ignore: IgnoreMatcher) -> Self {
        Self {
            root: root.into(),
            commits,
            ignore,
        }
    }

    /// Working-tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Line diff of two byte slices.
    pub fn compare_files(&self, old: &[u8], new: &[u8]) -> FileDiff {
        compare_files(old, new)
    }

    /// Compare commit `from` to commit `to`.
    ///
    /// Paths only in `to` are added, paths only in `from` deleted, and paths
    /// in both with different content modified.
    pub fn compare_commits(&self, from: &ObjectId, to: &ObjectId) -> DiffResult<CommitDiff> {
        let old_files = self.commits.files(from)?;
        let new_files = self.commits.files(to)?;
        let tree = compare_trees(&old_files, &new_files);

        let mut files = Vec::with_capacity(tree.len());
        for change in &tree.changes {
            let old = match change.old_id() {
                Some(_) => self.commits.read_file(from, change.path())?,
                None => Vec::new(),
            };
            let new = match change.new_id() {
                Some(_) => self.commits.read_file(to, change.path())?,
                None => Vec::new(),
            };
            files.push(FileChange {
                path: change.path().to_string(),
                status: status_of(change),
                diff: compare_files(&old, &new),
            });
        }

        let total_changes = files.iter().map(|f| f.diff.changed_lines()).sum();
        debug!(
            from = %from.short_hex(),
            to = %to.short_hex(),
            files = files.len(),
            total_changes,
            "commits compared"
        );
        Ok(CommitDiff {
            files,
            total_changes,
        })
    }

    /// Compare the working tree against `commit`.
    ///
    /// Without a commit every non-ignored file is added. Ignored paths and
    /// the metadata directory are never reported as added; a committed file
    /// missing on disk is reported as deleted.
    pub fn compare_working_tree(&self, commit: Option<&ObjectId>) -> DiffResult<WorktreeDiff> {
        let committed = match commit {
            Some(hash) => self.commits.files(hash)?,
            None => BTreeMap::new(),
        };

        let mut files = Vec::new();
        let on_disk = self.ignore.walk_tree(&self.root)?;
        for rel in &on_disk {
            let bytes = fs::read(self.root.join(rel))?;
            match (commit, committed.get(rel)) {
                (Some(hash), Some(old_id)) => {
                    if ObjectId::from_bytes(&bytes) == *old_id {
                        continue;
                    }
                    let old = self.commits.read_file(hash, rel)?;
                    files.push(FileChange {
                        path: rel.clone(),
                        status: ChangeStatus::Modified,
                        diff: compare_files(&old, &bytes),
                    });
                }
                _ => files.push(FileChange {
                    path: rel.clone(),
                    status: ChangeStatus::Added,
                    diff: compare_files(&[], &bytes),
                }),
            }
        }

        if let Some(hash) = commit {
            for path in committed.keys() {
                if self.root.join(path).is_file() {
                    continue;
                }
                let old = self.commits.read_file(hash, path)?;
                files.push(FileChange {
                    path: path.clone(),
                    status: ChangeStatus::Deleted,
                    diff: compare_files(&old, &[]),
                });
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let total_changes = files.iter().map(|f| f.diff.changed_lines()).sum();
        debug!(
            base = ?commit.map(|h| h.short_hex()),
            files = files.len(),
            "working tree compared"
        );
        Ok(WorktreeDiff {
            base: commit.copied(),
            files,
            total_changes,
        })
    }
}

fn status_of(change: &TreeChange) -> ChangeStatus {
    match change {
        TreeChange::Added { .. } => ChangeStatus::Added,
        TreeChange::Deleted { .. } => ChangeStatus::Deleted,
        TreeChange::Modified { .. } => ChangeStatus::Modified,
    }
}
