//! Working directory status types.

use serde::Serialize;

/// Every non-ignored working-tree file classified against the staging index.
///
/// All lists hold repo-relative paths in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorkdirStatus {
    /// Files whose on-disk content equals the staged version.
    pub staged: Vec<String>,
    /// Staged files whose on-disk content has changed since staging.
    pub modified: Vec<String>,
    /// Files present on disk but not staged.
    pub untracked: Vec<String>,
    /// Staged files that no longer exist on disk.
    pub deleted: Vec<String>,
}

impl WorkdirStatus {
    /// Create an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no category has entries.
    pub fn is_clean(&self) -> bool {
        self.total_entries() == 0
    }

    /// Returns `true` if anything is staged.
    pub fn has_staged_changes(&self) -> bool {
        !self.staged.is_empty() || !self.modified.is_empty() || !self.deleted.is_empty()
    }

    /// Total number of entries across all categories.
    pub fn total_entries(&self) -> usize {
        self.staged.len() + self.modified.len() + self.untracked.len() + self.deleted.len()
    }
}
