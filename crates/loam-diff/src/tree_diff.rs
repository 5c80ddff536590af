//! Tree-level diff: compare two path → hash maps and list what changed.
//!
//! Entries are compared by path and content hash only. Paths present on both
//! sides with the same hash do not appear in the result.

use std::collections::BTreeMap;

use loam_types::ObjectId;

/// The result of comparing two trees.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// Changes in path order.
    pub changes: Vec<TreeChange>,
}

impl TreeDiff {
    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Paths of every change, in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(TreeChange::path)
    }
}

/// A single change between two trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeChange {
    /// Only in the new tree.
    Added { path: String, new_id: ObjectId },
    /// Only in the old tree.
    Deleted { path: String, old_id: ObjectId },
    /// In both, with different content.
    Modified {
        path: String,
        old_id: ObjectId,
        new_id: ObjectId,
    },
}

impl TreeChange {
    /// Path this change applies to.
    pub fn path(&self) -> &str {
        match self {
            TreeChange::Added { path, .. }
            | TreeChange::Deleted { path, .. }
            | TreeChange::Modified { path, .. } => path,
        }
    }

    /// Content id on the old side, if any.
    pub fn old_id(&self) -> Option<ObjectId> {
        match self {
            TreeChange::Added { .. } => None,
            TreeChange::Deleted { old_id, .. } | TreeChange::Modified { old_id, .. } => {
                Some(*old_id)
            }
        }
    }

    /// Content id on the new side, if any.
    pub fn new_id(&self) -> Option<ObjectId> {
        match self {
            TreeChange::Deleted { .. } => None,
            TreeChange::Added { new_id, .. } | TreeChange::Modified { new_id, .. } => {
                Some(*new_id)
            }
        }
    }
}

/// Compare `old` against `new` over the union of their paths.
pub fn compare_trees(
    old: &BTreeMap<String, ObjectId>,
    new: &BTreeMap<String, ObjectId>,
) -> TreeDiff {
    let mut changes = Vec::new();
    let mut old_iter = old.iter().peekable();
    let mut new_iter = new.iter().peekable();

    // Both maps are sorted, so a merge walk yields the union in order.
    loop {
        let change = match (old_iter.peek(), new_iter.peek()) {
            (None, None) => break,
            (Some((path, id)), None) => {
                let change = TreeChange::Deleted {
                    path: (*path).clone(),
                    old_id: **id,
                };
                old_iter.next();
                Some(change)
            }
            (None, Some((path, id))) => {
                let change = TreeChange::Added {
                    path: (*path).clone(),
                    new_id: **id,
                };
                new_iter.next();
                Some(change)
            }
            (Some((op, oid)), Some((np, nid))) => match op.cmp(np) {
                std::cmp::Ordering::Less => {
                    let change = TreeChange::Deleted {
                        path: (*op).clone(),
                        old_id: **oid,
                    };
                    old_iter.next();
                    Some(change)
                }
                std::cmp::Ordering::Greater => {
                    let change = TreeChange::Added {
                        path: (*np).clone(),
                        new_id: **nid,
                    };
                    new_iter.next();
                    Some(change)
                }
                std::cmp::Ordering::Equal => {
                    let change = (oid != nid).then(|| TreeChange::Modified {
                        path: (*op).clone(),
                        old_id: **oid,
                        new_id: **nid,
                    });
                    old_iter.next();
                    new_iter.next();
                    change
                }
            },
        };
        changes.extend(change);
    }

    TreeDiff { changes }
}
