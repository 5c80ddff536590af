//! Commit lineage queries.
//!
//! Commits form a DAG through `parent` and `merge_parent`. These queries
//! walk it breadth-first, the way a merge needs: ancestor sets, the best
//! common ancestor of two heads, and ancestry tests.

use std::collections::{HashMap, HashSet, VecDeque};

use loam_types::ObjectId;
use tracing::debug;

use crate::commit::Commit;
use crate::error::CommitResult;
use crate::store::CommitStore;

impl CommitStore {
    /// All ancestors of `hash` (not including itself), breadth-first,
    /// following both parents.
    pub fn ancestors(&self, hash: &ObjectId) -> CommitResult<Vec<ObjectId>> {
        let mut cache = HashMap::new();
        let set = self.ancestor_walk(hash, &mut cache)?;
        Ok(set.into_iter().filter(|id| id != hash).collect())
    }

    /// Returns `true` if `ancestor` is `descendant` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> CommitResult<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        let mut cache = HashMap::new();
        Ok(self
            .ancestor_walk(descendant, &mut cache)?
            .contains(ancestor))
    }

    /// The best common ancestor of `a` and `b`.
    ///
    /// Candidates are the intersection of both ancestor sets (each including
    /// its start). Candidates that are themselves ancestors of another
    /// candidate are dropped; of the rest, the newest commit wins. Returns
    /// `None` when the histories are unrelated. Linear in the size of the
    /// two histories.
    pub fn merge_base(&self, a: &ObjectId, b: &ObjectId) -> CommitResult<Option<ObjectId>> {
        if a == b {
            self.get(a)?;
            return Ok(Some(*a));
        }

        let mut cache = HashMap::new();
        let set_a: HashSet<ObjectId> = self.ancestor_walk(a, &mut cache)?.into_iter().collect();
        let set_b: HashSet<ObjectId> = self.ancestor_walk(b, &mut cache)?.into_iter().collect();
        let common: HashSet<ObjectId> = set_a.intersection(&set_b).copied().collect();

        // Every strict ancestor of a common commit is itself common, and is
        // dominated. One walk from the candidates' parents finds them all.
        let mut dominated = HashSet::new();
        let mut queue: VecDeque<ObjectId> = common
            .iter()
            .filter_map(|id| cache.get(id))
            .flat_map(|c| c.parents())
            .collect();
        while let Some(id) = queue.pop_front() {
            if dominated.insert(id) {
                if let Some(commit) = cache.get(&id) {
                    queue.extend(commit.parents());
                }
            }
        }
        let best = common.difference(&dominated).copied();

        let base = best
            .filter_map(|id| cache.get(&id).map(|c: &Commit| (c.timestamp, id)))
            .max()
            .map(|(_, id)| id);
        debug!(
            a = %a.short_hex(),
            b = %b.short_hex(),
            base = ?base.map(|id| id.short_hex()),
            "merge base computed"
        );
        Ok(base)
    }

    /// Breadth-first ancestor walk including `start`, loading commits
    /// through `cache`.
    fn ancestor_walk(
        &self,
        start: &ObjectId,
        cache: &mut HashMap<ObjectId, Commit>,
    ) -> CommitResult<Vec<ObjectId>> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        visited.insert(*start);
        queue.push_back(*start);

        while let Some(current) = queue.pop_front() {
            if !cache.contains_key(&current) {
                let commit = self.get(&current)?;
                cache.insert(current, commit);
            }
            order.push(current);
            if let Some(commit) = cache.get(&current) {
                for parent in commit.parents() {
                    if visited.insert(parent) {
                        queue.push_back(parent);
                    }
                }
            }
        }
        Ok(order)
    }
}
