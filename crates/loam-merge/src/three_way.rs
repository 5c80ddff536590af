//! Per-path three-way classification.
//!
//! Both heads are diffed against the merge base. A path changed on one side
//! only takes that side, identical changes on both sides agree (a path both
//! sides deleted stays deleted), and differing changes conflict.

use std::collections::BTreeMap;

use loam_diff::{compare_trees, TreeChange};
use loam_types::ObjectId;

use crate::conflict::ConflictKind;

/// A change to apply to the target tree. Same shape as a tree diff entry,
/// read relative to the target.
pub type MergeChange = TreeChange;

/// Classification of every path either side touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreeWay {
    /// Source-side changes the target does not have yet, in path order.
    pub changes: Vec<MergeChange>,
    /// Paths both sides changed differently, in path order.
    pub conflicts: Vec<(String, ConflictKind)>,
}

impl ThreeWay {
    /// Returns `true` if no path conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Classify the paths of `source` and `target` against `base`.
///
/// An empty `base` stands for unrelated histories: every path present on
/// both sides with different content is then an add/add conflict.
pub fn three_way(
    base: &BTreeMap<String, ObjectId>,
    target: &BTreeMap<String, ObjectId>,
    source: &BTreeMap<String, ObjectId>,
) -> ThreeWay {
    let target_changed = side_changes(base, target);
    let source_changed = compare_trees(base, source);

    let mut result = ThreeWay::default();
    for change in &source_changed.changes {
        let path = change.path();
        let source_id = change.new_id();
        let base_id = change.old_id();

        match target_changed.get(path) {
            // Untouched on the target, so the source change applies as is.
            None => result.changes.push(change.clone()),
            Some(target_id) if *target_id == source_id => {}
            Some(target_id) => {
                let kind = match (base_id, source_id, target_id) {
                    (None, _, _) => ConflictKind::AddAdd,
                    (Some(_), Some(_), Some(_)) => ConflictKind::Content,
                    (Some(_), Some(_), None) => ConflictKind::ModifyDelete,
                    (Some(_), None, _) => ConflictKind::DeleteModify,
                };
                result.conflicts.push((path.to_string(), kind));
            }
        }
    }
    result
}

/// `path -> new content id` for every path `side` changed relative to `base`.
/// Deletions map to `None`.
fn side_changes(
    base: &BTreeMap<String, ObjectId>,
    side: &BTreeMap<String, ObjectId>,
) -> BTreeMap<String, Option<ObjectId>> {
    compare_trees(base, side)
        .changes
        .into_iter()
        .map(|c| {
            let id = c.new_id();
            let path = match c {
                TreeChange::Added { path, .. }
                | TreeChange::Deleted { path, .. }
                | TreeChange::Modified { path, .. } => path,
            };
            (path, id)
        })
        .collect()
}
