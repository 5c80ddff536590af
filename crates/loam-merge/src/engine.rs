//! The merge engine.
//!
//! A merge walks `Idle -> Diffing -> ConflictDetected | Applying -> Done`.
//! Nothing outside `<meta>/merges/` is written until the merge is known to
//! be clean, and the target head only moves after the merge commit and the
//! working-tree writes have succeeded.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use loam_commit::CommitStore;
use loam_history::HistoryLog;
use loam_refs::BranchRegistry;
use loam_types::ObjectId;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::conflict::Conflict;
use crate::error::{MergeError, MergeResult};
use crate::state::MergeState;
use crate::three_way::{three_way, MergeChange, ThreeWay};
use crate::worktree::WorktreePatch;

const MERGES_DIR: &str = "merges";
const CONFLICTS_FILE: &str = "conflicts.json";
const STAGING_DIR: &str = "staging";

/// Where a merge currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePhase {
    Idle,
    Diffing,
    ConflictDetected,
    Applying,
    Done,
}

impl fmt::Display for MergePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Diffing => write!(f, "diffing"),
            Self::ConflictDetected => write!(f, "conflict_detected"),
            Self::Applying => write!(f, "applying"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// What a completed merge did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub source_branch: String,
    pub target_branch: String,
    /// The merge commit now at the head of the target.
    pub commit: ObjectId,
    pub base: Option<ObjectId>,
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    /// Paths whose content came from a conflict resolution.
    pub resolved: Vec<String>,
}

/// Result of [`MergeEngine::merge`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The merge commit was written and the target head moved.
    Applied(MergeSummary),
    /// Conflicts were recorded; nothing else changed.
    Conflicted { conflicts: Vec<Conflict> },
    /// The source has nothing the target lacks.
    UpToDate,
}

/// Result of [`MergeEngine::resolve_conflicts`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Some conflicts remain.
    Pending {
        resolved: Vec<String>,
        remaining: Vec<String>,
        unknown: Vec<String>,
    },
    /// The last conflict was resolved and the merge committed.
    Completed {
        summary: MergeSummary,
        unknown: Vec<String>,
    },
}

/// Runs merges for one repository.
#[derive(Debug)]
pub struct MergeEngine {
    root: PathBuf,
    state_path: PathBuf,
    staging_dir: PathBuf,
    commits: CommitStore,
    refs: BranchRegistry,
    history: HistoryLog,
    author: String,
    phase: MergePhase,
}

impl MergeEngine {
    /// An engine over the working tree `root` and metadata directory `meta`.
    pub fn new(
        root: impl Into<PathBuf>,
        meta: &Path,
        commits: CommitStore,
        refs: BranchRegistry,
        history: HistoryLog,
        author: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            state_path: meta.join(MERGES_DIR).join(CONFLICTS_FILE),
            staging_dir: meta.join(MERGES_DIR).join(STAGING_DIR),
            commits,
            refs,
            history,
            author: author.into(),
            phase: MergePhase::Idle,
        }
    }

    /// Phase reached by the last operation.
    pub fn phase(&self) -> MergePhase {
        self.phase
    }

    /// Path of the pending-merge document.
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    fn enter(&mut self, phase: MergePhase) {
        debug!(from = %self.phase, to = %phase, "merge phase");
        self.phase = phase;
    }

    /// Merge `source` into `target` (default: the current branch).
    pub fn merge(&mut self, source: &str, target: Option<&str>) -> MergeResult<MergeOutcome> {
        self.enter(MergePhase::Idle);
        if let Some(state) = MergeState::load(&self.state_path)? {
            return Err(MergeError::ConflictsPending {
                source_branch: state.source_branch,
                target_branch: state.target_branch,
            });
        }

        let target_name = match target {
            Some(name) => name.to_string(),
            None => self.refs.current_branch()?,
        };
        let source_branch = self.refs.get(source)?;
        let target_branch = self.refs.get(&target_name)?;

        let Some(source_head) = source_branch.head_commit else {
            info!(source, target = %target_name, "source has no commits; up to date");
            self.enter(MergePhase::Done);
            return Ok(MergeOutcome::UpToDate);
        };
        let target_head = target_branch.head_commit;
        if let Some(th) = target_head {
            if self.commits.is_ancestor(&source_head, &th)? {
                info!(source, target = %target_name, "already up to date");
                self.enter(MergePhase::Done);
                return Ok(MergeOutcome::UpToDate);
            }
        }

        self.enter(MergePhase::Diffing);
        let base = match target_head {
            Some(th) => self.commits.merge_base(&th, &source_head)?,
            None => None,
        };
        let plan = self.plan(base, target_head, source_head)?;

        if !plan.is_clean() {
            self.enter(MergePhase::ConflictDetected);
            let mut conflicts = Vec::with_capacity(plan.conflicts.len());
            for (path, kind) in &plan.conflicts {
                let source_bytes = self.read_side(Some(source_head), path)?;
                let target_bytes = self.read_side(target_head, path)?;
                conflicts.push(Conflict::new(
                    path,
                    *kind,
                    source_bytes.as_deref(),
                    target_bytes.as_deref(),
                ));
            }
            let state = MergeState {
                source_branch: source.to_string(),
                target_branch: target_name.clone(),
                source_head,
                target_head,
                base,
                started_at: Utc::now(),
                conflicts: conflicts.clone(),
                resolved: BTreeMap::new(),
            };
            state.save(&self.state_path)?;
            warn!(
                source,
                target = %target_name,
                conflicts = conflicts.len(),
                "merge stopped on conflicts"
            );
            return Ok(MergeOutcome::Conflicted { conflicts });
        }

        self.enter(MergePhase::Applying);
        let summary = self.complete(
            source,
            &target_name,
            source_head,
            target_head,
            base,
            &plan.changes,
            &BTreeMap::new(),
        )?;
        self.enter(MergePhase::Done);
        Ok(MergeOutcome::Applied(summary))
    }

    /// Apply resolutions to the pending merge.
    ///
    /// Paths that are not pending are reported back in `unknown`. When the
    /// last conflict is resolved the merge commit is written and the
    /// pending state removed.
    pub fn resolve_conflicts(
        &mut self,
        resolutions: &BTreeMap<String, String>,
    ) -> MergeResult<ResolveOutcome> {
        let mut state = MergeState::load(&self.state_path)?.ok_or(MergeError::NoMergeInProgress)?;

        let (accepted, unknown): (Vec<&String>, Vec<&String>) = resolutions
            .keys()
            .partition(|path| state.conflicts.iter().any(|c| &c.path == *path));
        let unknown: Vec<String> = unknown.into_iter().cloned().collect();
        for path in &unknown {
            warn!(path = %path, "no pending conflict for path");
        }

        let completes = state.conflicts.len() == accepted.len();
        if completes {
            let current = self.refs.head(Some(&state.target_branch))?;
            if current != state.target_head {
                return Err(MergeError::StaleMerge {
                    branch: state.target_branch.clone(),
                });
            }
        }

        // A completing resolution is written together with the merge commit.
        let on_target = !completes && self.refs.current_branch()? == state.target_branch;
        let mut patch = WorktreePatch::new();
        let mut resolved = Vec::with_capacity(accepted.len());
        for path in accepted {
            let content = &resolutions[path];
            if on_target {
                patch.write(path.clone(), content.as_bytes());
            }
            state.conflicts.retain(|c| &c.path != path);
            state.resolved.insert(path.clone(), content.clone());
            resolved.push(path.clone());
            info!(path = %path, "conflict resolved");
        }

        if !completes {
            let applied = if patch.is_empty() {
                None
            } else {
                Some(patch.prepare(&self.root, &self.staging_dir)?.apply()?)
            };
            if !resolved.is_empty() {
                if let Err(e) = state.save(&self.state_path) {
                    if let Some(applied) = applied {
                        applied.rollback();
                    }
                    return Err(e);
                }
            }
            let remaining = state.pending_paths().into_iter().map(String::from).collect();
            return Ok(ResolveOutcome::Pending {
                resolved,
                remaining,
                unknown,
            });
        }

        self.enter(MergePhase::Applying);
        let plan = self.plan(state.base, state.target_head, state.source_head)?;
        let summary = self.complete(
            &state.source_branch,
            &state.target_branch,
            state.source_head,
            state.target_head,
            state.base,
            &plan.changes,
            &state.resolved,
        )?;
        MergeState::clear(&self.state_path)?;
        self.enter(MergePhase::Done);
        Ok(ResolveOutcome::Completed { summary, unknown })
    }

    /// Pending conflicts; empty when no merge is pending.
    pub fn list_conflicts(&self) -> MergeResult<Vec<Conflict>> {
        Ok(MergeState::load(&self.state_path)?
            .map(|s| s.conflicts)
            .unwrap_or_default())
    }

    /// The pending merge, if any.
    pub fn pending(&self) -> MergeResult<Option<MergeState>> {
        MergeState::load(&self.state_path)
    }

    /// Drop the pending merge. Resolutions already written to the working
    /// tree stay there.
    pub fn abort(&mut self) -> MergeResult<Option<MergeState>> {
        let state = MergeState::load(&self.state_path)?;
        if let Some(s) = &state {
            MergeState::clear(&self.state_path)?;
            info!(source = %s.source_branch, target = %s.target_branch, "merge aborted");
        }
        self.enter(MergePhase::Idle);
        Ok(state)
    }

    fn files_of(
        &self,
        commit: Option<ObjectId>,
    ) -> MergeResult<BTreeMap<String, ObjectId>> {
        Ok(match commit {
            Some(hash) => self.commits.files(&hash)?,
            None => BTreeMap::new(),
        })
    }

    fn plan(
        &self,
        base: Option<ObjectId>,
        target_head: Option<ObjectId>,
        source_head: ObjectId,
    ) -> MergeResult<ThreeWay> {
        let base_files = self.files_of(base)?;
        let target_files = self.files_of(target_head)?;
        let source_files = self.files_of(Some(source_head))?;
        let plan = three_way(&base_files, &target_files, &source_files);
        debug!(
            base = ?base.map(|b| b.short_hex()),
            changes = plan.changes.len(),
            conflicts = plan.conflicts.len(),
            "three-way comparison done"
        );
        Ok(plan)
    }

    /// Bytes of `path` in `commit`, or `None` if the commit lacks it.
    fn read_side(&self, commit: Option<ObjectId>, path: &str) -> MergeResult<Option<Vec<u8>>> {
        let Some(hash) = commit else {
            return Ok(None);
        };
        let c = self.commits.get(&hash)?;
        if c.file_hash(path).is_none() {
            return Ok(None);
        }
        Ok(Some(self.commits.read_file(&hash, path)?))
    }

    #[allow(clippy::too_many_arguments)]
    fn complete(
        &self,
        source: &str,
        target: &str,
        source_head: ObjectId,
        target_head: Option<ObjectId>,
        base: Option<ObjectId>,
        changes: &[MergeChange],
        resolutions: &BTreeMap<String, String>,
    ) -> MergeResult<MergeSummary> {
        let mut tree = match target_head {
            Some(th) => self.commits.read_tree(&th)?,
            None => BTreeMap::new(),
        };
        let mut summary = MergeSummary {
            source_branch: source.to_string(),
            target_branch: target.to_string(),
            commit: source_head,
            base,
            added: Vec::new(),
            modified: Vec::new(),
            deleted: Vec::new(),
            resolved: resolutions.keys().cloned().collect(),
        };

        for change in changes {
            let path = change.path().to_string();
            match change {
                MergeChange::Added { .. } | MergeChange::Modified { .. } => {
                    let bytes = self.commits.read_file(&source_head, &path)?;
                    tree.insert(path.clone(), bytes);
                    if matches!(change, MergeChange::Added { .. }) {
                        summary.added.push(path);
                    } else {
                        summary.modified.push(path);
                    }
                }
                MergeChange::Deleted { .. } => {
                    tree.remove(&path);
                    summary.deleted.push(path);
                }
            }
        }
        for (path, content) in resolutions {
            tree.insert(path.clone(), content.as_bytes().to_vec());
        }

        let applied = if self.refs.current_branch()? == target {
            let mut patch = WorktreePatch::new();
            for path in summary.added.iter().chain(&summary.modified).chain(&summary.resolved) {
                if let Some(bytes) = tree.get(path) {
                    patch.write(path.clone(), bytes.clone());
                }
            }
            for path in &summary.deleted {
                patch.remove(path.clone());
            }
            Some(patch.prepare(&self.root, &self.staging_dir)?.apply()?)
        } else {
            debug!(target, "target is not checked out; working tree untouched");
            None
        };

        let message = format!("Merge branch '{source}' into '{target}'");
        let committed = self
            .commits
            .create_from_tree(&tree, &message, &self.author, target_head, Some(source_head))
            .map_err(MergeError::from)
            .and_then(|commit| {
                self.refs.update_head(target, commit.hash)?;
                Ok(commit)
            });
        let commit = match committed {
            Ok(commit) => commit,
            Err(e) => {
                if let Some(applied) = applied {
                    applied.rollback();
                }
                return Err(e);
            }
        };
        summary.commit = commit.hash;

        let mut files_changed: Vec<String> = summary
            .added
            .iter()
            .chain(&summary.modified)
            .chain(&summary.deleted)
            .chain(&summary.resolved)
            .cloned()
            .collect();
        files_changed.sort();
        files_changed.dedup();
        self.history.record_with_changes(&commit, target, files_changed)?;

        info!(
            source,
            target,
            commit = %commit.hash.short_hex(),
            added = summary.added.len(),
            modified = summary.modified.len(),
            deleted = summary.deleted.len(),
            resolved = summary.resolved.len(),
            "merge committed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::conflict::ConflictKind;
    use loam_types::ErrorKind;

    struct Fixture {
        dir: tempfile::TempDir,
        engine: MergeEngine,
    }

    impl Fixture {
        fn refs(&self) -> &BranchRegistry {
            &self.engine.refs
        }

        fn commits(&self) -> &CommitStore {
            &self.engine.commits
        }

        /// Commit `files` as the whole tree of `branch`.
        fn commit_on(&self, branch: &str, files: &[(&str, &str)]) -> ObjectId {
            let tree: BTreeMap<String, Vec<u8>> = files
                .iter()
                .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec()))
                .collect();
            let parent = self.refs().head(Some(branch)).unwrap();
            let msg = format!("{branch} {}", Utc::now().timestamp_nanos_opt().unwrap());
            let commit = self
                .commits()
                .create_from_tree(&tree, &msg, "tester", parent, None)
                .unwrap();
            self.refs().update_head(branch, commit.hash).unwrap();
            commit.hash
        }

        fn write(&self, rel: &str, body: &str) {
            fs::write(self.dir.path().join(rel), body).unwrap();
        }

        fn read(&self, rel: &str) -> Option<String> {
            fs::read_to_string(self.dir.path().join(rel)).ok()
        }
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let meta = dir.path().join(".loam");
        let commits = CommitStore::open(meta.join("commits")).unwrap();
        let refs = BranchRegistry::new(&meta);
        refs.init("main").unwrap();
        let history = HistoryLog::new(meta.join("history.json"));
        let engine = MergeEngine::new(dir.path(), &meta, commits, refs, history, "tester");
        Fixture { dir, engine }
    }

    /// main: a.txt=v1; feat branches off; feat commits v3, main commits v2.
    fn diverged() -> Fixture {
        let fx = fixture();
        fx.commit_on("main", &[("a.txt", "v1")]);
        fx.refs().create("feat", None).unwrap();
        fx.commit_on("feat", &[("a.txt", "v3")]);
        fx.commit_on("main", &[("a.txt", "v2")]);
        fx.write("a.txt", "v2");
        fx
    }

    fn resolutions(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn source_without_commits_is_up_to_date() {
        let mut fx = fixture();
        fx.refs().create("empty", None).unwrap();
        assert_eq!(fx.engine.merge("empty", None).unwrap(), MergeOutcome::UpToDate);
    }

    #[test]
    fn ancestor_source_is_up_to_date() {
        let mut fx = fixture();
        fx.commit_on("main", &[("a.txt", "1")]);
        fx.refs().create("old", None).unwrap();
        fx.commit_on("main", &[("a.txt", "2")]);
        assert_eq!(fx.engine.merge("old", None).unwrap(), MergeOutcome::UpToDate);
        assert_eq!(fx.engine.phase(), MergePhase::Done);
    }

    #[test]
    fn unknown_branch_is_not_found() {
        let mut fx = fixture();
        let err = fx.engine.merge("ghost", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = fx.engine.merge("main", Some("ghost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn clean_merge_writes_commit_tree_and_history() {
        let mut fx = fixture();
        let base = fx.commit_on("main", &[("a.txt", "a"), ("gone.txt", "g")]);
        fx.refs().create("feat", None).unwrap();
        let feat_head = fx.commit_on("feat", &[("a.txt", "a"), ("b.txt", "b")]);
        let main_head = fx.commit_on("main", &[("a.txt", "a2"), ("gone.txt", "g")]);
        fx.write("a.txt", "a2");
        fx.write("gone.txt", "g");

        let MergeOutcome::Applied(summary) = fx.engine.merge("feat", None).unwrap() else {
            panic!("expected a clean merge");
        };
        assert_eq!(summary.base, Some(base));
        assert_eq!(summary.added, vec!["b.txt"]);
        assert_eq!(summary.deleted, vec!["gone.txt"]);
        assert!(summary.modified.is_empty());

        let commit = fx.commits().get(&summary.commit).unwrap();
        assert_eq!(commit.parent, Some(main_head));
        assert_eq!(commit.merge_parent, Some(feat_head));
        let files: Vec<_> = commit.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(files, vec!["a.txt", "b.txt"]);

        assert_eq!(fx.read("b.txt").as_deref(), Some("b"));
        assert_eq!(fx.read("gone.txt"), None);
        assert_eq!(fx.read("a.txt").as_deref(), Some("a2"));
        assert_eq!(fx.refs().head(Some("main")).unwrap(), Some(summary.commit));

        let latest = fx.engine.history.latest(Some("main")).unwrap().unwrap();
        assert_eq!(latest.hash, summary.commit);
        assert_eq!(latest.files_changed, vec!["b.txt", "gone.txt"]);
        assert_eq!(fx.engine.phase(), MergePhase::Done);

        // Merging again has nothing left to do.
        assert_eq!(fx.engine.merge("feat", None).unwrap(), MergeOutcome::UpToDate);
    }

    #[test]
    fn merge_into_other_branch_leaves_working_tree() {
        let mut fx = fixture();
        fx.commit_on("main", &[("a.txt", "a")]);
        fx.refs().create("feat", None).unwrap();
        fx.refs().create("side", None).unwrap();
        fx.commit_on("feat", &[("a.txt", "a"), ("f.txt", "f")]);

        let outcome = fx.engine.merge("feat", Some("side")).unwrap();
        assert!(matches!(outcome, MergeOutcome::Applied(_)));
        assert_eq!(fx.read("f.txt"), None);
        let side_files = fx
            .commits()
            .files(&fx.refs().head(Some("side")).unwrap().unwrap())
            .unwrap();
        assert!(side_files.contains_key("f.txt"));
    }

    #[test]
    fn diverged_edit_conflicts_and_changes_nothing() {
        let mut fx = diverged();
        let main_before = fx.refs().head(Some("main")).unwrap();
        let history_before = fx.engine.history.len().unwrap();

        let MergeOutcome::Conflicted { conflicts } = fx.engine.merge("feat", Some("main")).unwrap()
        else {
            panic!("expected conflicts");
        };
        assert_eq!(
            conflicts,
            vec![Conflict {
                path: "a.txt".into(),
                kind: ConflictKind::Content,
                source_content: Some("v3".into()),
                target_content: Some("v2".into()),
            }]
        );
        assert_eq!(fx.engine.phase(), MergePhase::ConflictDetected);
        assert!(fx.engine.state_path().is_file());
        assert_eq!(fx.engine.list_conflicts().unwrap(), conflicts);
        assert_eq!(fx.refs().head(Some("main")).unwrap(), main_before);
        assert_eq!(fx.engine.history.len().unwrap(), history_before);
        assert_eq!(fx.read("a.txt").as_deref(), Some("v2"));
    }

    #[test]
    fn pending_conflicts_block_new_merges() {
        let mut fx = diverged();
        fx.engine.merge("feat", None).unwrap();
        let err = fx.engine.merge("feat", None).unwrap_err();
        assert!(matches!(err, MergeError::ConflictsPending { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn resolving_last_conflict_completes_merge() {
        let mut fx = diverged();
        let main_before = fx.refs().head(Some("main")).unwrap();
        let feat_head = fx.refs().head(Some("feat")).unwrap();
        fx.engine.merge("feat", None).unwrap();

        let outcome = fx
            .engine
            .resolve_conflicts(&resolutions(&[("a.txt", "v4"), ("nope.txt", "x")]))
            .unwrap();
        let ResolveOutcome::Completed { summary, unknown } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(unknown, vec!["nope.txt"]);
        assert_eq!(summary.resolved, vec!["a.txt"]);
        assert_eq!(fx.read("a.txt").as_deref(), Some("v4"));
        assert_eq!(fx.read("nope.txt"), None);
        assert!(!fx.engine.state_path().exists());
        assert!(fx.engine.list_conflicts().unwrap().is_empty());

        let commit = fx.commits().get(&summary.commit).unwrap();
        assert_eq!(commit.parent, main_before);
        assert_eq!(commit.merge_parent, feat_head);
        assert_eq!(fx.commits().read_file(&commit.hash, "a.txt").unwrap(), b"v4");
        assert_eq!(fx.refs().head(Some("main")).unwrap(), Some(commit.hash));
    }

    #[test]
    fn partial_resolution_stays_pending() {
        let mut fx = fixture();
        fx.commit_on("main", &[("a.txt", "1"), ("b.txt", "1")]);
        fx.refs().create("feat", None).unwrap();
        fx.commit_on("feat", &[("a.txt", "f"), ("b.txt", "f")]);
        fx.commit_on("main", &[("a.txt", "m"), ("b.txt", "m")]);
        fx.engine.merge("feat", None).unwrap();

        let outcome = fx
            .engine
            .resolve_conflicts(&resolutions(&[("a.txt", "merged")]))
            .unwrap();
        assert_eq!(
            outcome,
            ResolveOutcome::Pending {
                resolved: vec!["a.txt".into()],
                remaining: vec!["b.txt".into()],
                unknown: vec![],
            }
        );
        let state = fx.engine.pending().unwrap().unwrap();
        assert_eq!(state.resolved.get("a.txt").map(String::as_str), Some("merged"));
        assert_eq!(state.pending_paths(), vec!["b.txt"]);

        let outcome = fx
            .engine
            .resolve_conflicts(&resolutions(&[("b.txt", "merged too")]))
            .unwrap();
        let ResolveOutcome::Completed { summary, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(summary.resolved, vec!["a.txt", "b.txt"]);
        let head = fx.refs().head(None).unwrap().unwrap();
        assert_eq!(fx.commits().read_file(&head, "a.txt").unwrap(), b"merged");
    }

    #[test]
    fn resolve_without_pending_merge_is_a_state_error() {
        let mut fx = fixture();
        let err = fx
            .engine
            .resolve_conflicts(&resolutions(&[("a.txt", "x")]))
            .unwrap_err();
        assert!(matches!(err, MergeError::NoMergeInProgress));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn moved_target_makes_completion_stale() {
        let mut fx = diverged();
        fx.engine.merge("feat", None).unwrap();
        fx.commit_on("main", &[("a.txt", "v5")]);

        let err = fx
            .engine
            .resolve_conflicts(&resolutions(&[("a.txt", "v4")]))
            .unwrap_err();
        assert!(matches!(err, MergeError::StaleMerge { .. }));
        assert_eq!(fx.engine.list_conflicts().unwrap().len(), 1);
    }

    #[test]
    fn abort_drops_pending_state() {
        let mut fx = diverged();
        fx.engine.merge("feat", None).unwrap();
        let dropped = fx.engine.abort().unwrap().unwrap();
        assert_eq!(dropped.source_branch, "feat");
        assert!(fx.engine.pending().unwrap().is_none());
        assert!(fx.engine.abort().unwrap().is_none());
    }

    #[test]
    fn unrelated_histories_conflict_as_add_add() {
        let mut fx = fixture();
        fx.refs().create("other", None).unwrap();
        fx.commit_on("main", &[("a.txt", "main"), ("same.txt", "s")]);
        fx.commit_on("other", &[("a.txt", "other"), ("same.txt", "s")]);

        let MergeOutcome::Conflicted { conflicts } = fx.engine.merge("other", None).unwrap() else {
            panic!("expected conflicts");
        };
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::AddAdd);
    }

    #[test]
    fn delete_on_one_side_modify_on_other() {
        let mut fx = fixture();
        fx.commit_on("main", &[("a.txt", "1"), ("keep.txt", "k")]);
        fx.refs().create("feat", None).unwrap();
        fx.commit_on("feat", &[("keep.txt", "k")]);
        fx.commit_on("main", &[("a.txt", "2"), ("keep.txt", "k")]);

        let MergeOutcome::Conflicted { conflicts } = fx.engine.merge("feat", None).unwrap() else {
            panic!("expected conflicts");
        };
        assert_eq!(conflicts[0].kind, ConflictKind::DeleteModify);
        assert_eq!(conflicts[0].source_content, None);
        assert_eq!(conflicts[0].target_content.as_deref(), Some("2"));
    }

    #[test]
    fn working_tree_clash_fails_without_changes() {
        let mut fx = fixture();
        fx.commit_on("main", &[("x.txt", "x")]);
        fx.refs().create("feat", None).unwrap();
        fx.commit_on("feat", &[("x.txt", "x"), ("a.txt", "a"), ("d/x.txt", "dx")]);
        fx.commit_on("main", &[("x.txt", "x"), ("m.txt", "m")]);
        fx.write("x.txt", "x");
        fx.write("m.txt", "m");
        fx.write("d", "untracked file");
        let main_head = fx.refs().head(Some("main")).unwrap();
        let commits_before = fx.commits().list_ids().unwrap().len();
        let history_before = fx.engine.history.len().unwrap();

        let err = fx.engine.merge("feat", None).unwrap_err();
        assert!(matches!(err, MergeError::WorktreeClash { ref path, .. } if path == "d/x.txt"));
        assert_eq!(err.kind(), ErrorKind::State);

        assert_eq!(fx.read("a.txt"), None);
        assert_eq!(fx.read("d").as_deref(), Some("untracked file"));
        assert_eq!(fx.refs().head(Some("main")).unwrap(), main_head);
        assert_eq!(fx.commits().list_ids().unwrap().len(), commits_before);
        assert_eq!(fx.engine.history.len().unwrap(), history_before);
        assert!(fx.engine.pending().unwrap().is_none());
    }

    #[test]
    fn identical_edits_merge_cleanly() {
        let mut fx = fixture();
        fx.commit_on("main", &[("a.txt", "v1")]);
        fx.refs().create("feat", None).unwrap();
        let feat_head = fx.commit_on("feat", &[("a.txt", "v2")]);
        let main_head = fx.commit_on("main", &[("a.txt", "v2")]);
        assert_ne!(feat_head, main_head);
        fx.write("a.txt", "v2");

        let MergeOutcome::Applied(summary) = fx.engine.merge("feat", None).unwrap() else {
            panic!("expected a clean merge");
        };
        assert!(summary.added.is_empty() && summary.modified.is_empty());
        assert!(fx.engine.list_conflicts().unwrap().is_empty());
        assert_ne!(summary.commit, main_head);

        let commit = fx.commits().get(&summary.commit).unwrap();
        assert_eq!(commit.parent, Some(main_head));
        assert_eq!(commit.merge_parent, Some(feat_head));
        assert_eq!(fx.refs().head(Some("main")).unwrap(), Some(summary.commit));
        assert_eq!(fx.read("a.txt").as_deref(), Some("v2"));
    }

    #[test]
    fn identical_commits_share_hash_and_are_up_to_date() {
        let mut fx = fixture();
        let base = fx.commit_on("main", &[("a.txt", "v1")]);
        fx.refs().create("feat", None).unwrap();
        let tree = BTreeMap::from([("a.txt".to_string(), b"v2".to_vec())]);
        let on_main = fx
            .commits()
            .create_from_tree(&tree, "same edit", "tester", Some(base), None)
            .unwrap();
        let on_feat = fx
            .commits()
            .create_from_tree(&tree, "same edit", "tester", Some(base), None)
            .unwrap();
        assert_eq!(on_main.hash, on_feat.hash);
        fx.refs().update_head("main", on_main.hash).unwrap();
        fx.refs().update_head("feat", on_feat.hash).unwrap();

        assert_eq!(fx.engine.merge("feat", None).unwrap(), MergeOutcome::UpToDate);
        assert_eq!(fx.refs().head(Some("main")).unwrap(), Some(on_main.hash));
    }
}
