use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use loam_commit::{Commit, CommitStore};
use loam_diff::{CommitDiff, DiffEngine, WorktreeDiff};
use loam_history::{HistoryLog, HistoryRecord};
use loam_ignore::IgnoreMatcher;
use loam_index::{StagingIndex, WorkdirStatus};
use loam_merge::{Conflict, MergeEngine, MergeOutcome, MergeState, ResolveOutcome};
use loam_refs::{Branch, BranchRegistry};
use loam_store::{document, FsObjectStore, ObjectStore, RepoLock};
use loam_types::ObjectId;
use tracing::{debug, info};

use crate::clone::clone_directory;
use crate::config::{EngineConfig, RepoConfig, ENGINE_CONFIG_FILE};
use crate::error::{SdkError, SdkResult};

const CONFIG_FILE: &str = "config.json";
const INDEX_FILE: &str = "index";
const HISTORY_FILE: &str = "history.json";
const OBJECTS_DIR: &str = "objects";
const COMMITS_DIR: &str = "commits";
const LOCK_FILE: &str = "lock";

/// Result of [`Repository::diff`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffView {
    /// Two commits compared.
    Commits {
        from: ObjectId,
        to: ObjectId,
        diff: CommitDiff,
    },
    /// The working tree compared against a commit (or against nothing).
    WorkingTree(WorktreeDiff),
}

/// An open Loam repository.
pub struct Repository {
    root: PathBuf,
    meta: PathBuf,
    config: EngineConfig,
    repo_config: RepoConfig,
    store: Arc<dyn ObjectStore>,
    commits: CommitStore,
    refs: BranchRegistry,
    history: HistoryLog,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("id", &self.repo_config.id)
            .finish()
    }
}

impl Repository {
    // ---- Bootstrap ----

    /// Create a repository at `root` (created if missing).
    pub fn init(root: &Path, config: EngineConfig) -> SdkResult<Self> {
        fs::create_dir_all(root)?;
        let root = fs::canonicalize(root)?;
        let meta = root.join(&config.metadata_dir);
        if meta.join(CONFIG_FILE).is_file() {
            return Err(SdkError::AlreadyInitialized(root));
        }

        fs::create_dir_all(meta.join(OBJECTS_DIR))?;
        fs::create_dir_all(meta.join(COMMITS_DIR))?;
        let repo_config = RepoConfig::new();
        document::write_json_atomic(&meta.join(CONFIG_FILE), &repo_config)?;
        BranchRegistry::new(&meta).init(&config.default_branch)?;
        document::write_json_atomic(&meta.join(HISTORY_FILE), &Vec::<HistoryRecord>::new())?;

        info!(root = %root.display(), id = %repo_config.id, "repository initialized");
        Self::load(root, config)
    }

    /// Open the repository containing `start`, using `config`.
    pub fn open(start: &Path, config: EngineConfig) -> SdkResult<Self> {
        let root = find_root(start, &config.metadata_dir)?;
        Self::load(root, config)
    }

    /// Open the repository containing `start`, reading engine settings from
    /// `<meta>/loam.toml` when present.
    pub fn discover(start: &Path) -> SdkResult<Self> {
        let defaults = EngineConfig::default();
        let root = find_root(start, &defaults.metadata_dir)?;
        let config = EngineConfig::load_or_default(
            &root.join(&defaults.metadata_dir).join(ENGINE_CONFIG_FILE),
        )?;
        Self::load(root, config)
    }

    fn load(root: PathBuf, config: EngineConfig) -> SdkResult<Self> {
        let meta = root.join(&config.metadata_dir);
        let repo_config: RepoConfig = document::read_json(&meta.join(CONFIG_FILE))?
            .ok_or_else(|| SdkError::NotARepository(root.clone()))?;
        let store: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::open(meta.join(OBJECTS_DIR))?);
        let commits = CommitStore::open(meta.join(COMMITS_DIR))?;
        let refs = BranchRegistry::new(&meta);
        let history = HistoryLog::new(meta.join(HISTORY_FILE));
        debug!(root = %root.display(), "repository opened");
        Ok(Self {
            root,
            meta,
            config,
            repo_config,
            store,
            commits,
            refs,
            history,
        })
    }

    /// Working-tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Metadata directory.
    pub fn meta_dir(&self) -> &Path {
        &self.meta
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repo_config(&self) -> &RepoConfig {
        &self.repo_config
    }

    fn lock(&self) -> SdkResult<RepoLock> {
        Ok(RepoLock::acquire(&self.meta.join(LOCK_FILE))?)
    }

    fn ignore_matcher(&self) -> SdkResult<IgnoreMatcher> {
        Ok(IgnoreMatcher::load(
            self.root.join(&self.config.ignore_file),
            self.config.metadata_dir.clone(),
        )?)
    }

    fn index(&self) -> SdkResult<StagingIndex> {
        Ok(StagingIndex::open(
            &self.root,
            self.meta.join(INDEX_FILE),
            Arc::clone(&self.store),
            self.ignore_matcher()?,
        )?)
    }

    fn merge_engine(&self) -> MergeEngine {
        MergeEngine::new(
            &self.root,
            &self.meta,
            self.commits.clone(),
            self.refs.clone(),
            self.history.clone(),
            self.config.author.clone(),
        )
    }

    fn diff_engine(&self) -> SdkResult<DiffEngine> {
        Ok(DiffEngine::new(&self.root, self.commits.clone(), self.ignore_matcher()?))
    }

    fn ensure_no_pending_merge(&self) -> SdkResult<()> {
        match self.merge_engine().pending()? {
            Some(state) => Err(SdkError::MergeInProgress {
                source_branch: state.source_branch,
                target_branch: state.target_branch,
            }),
            None => Ok(()),
        }
    }

    // ---- Staging ----

    /// Stage files or directories. Returns every staged path.
    pub fn add<P: AsRef<Path>>(&self, paths: &[P]) -> SdkResult<Vec<String>> {
        let _lock = self.lock()?;
        let mut index = self.index()?;
        let mut staged = Vec::new();
        for path in paths {
            staged.extend(index.add(path.as_ref())?);
        }
        Ok(staged)
    }

    /// Unstage one path, or everything.
    pub fn reset(&self, path: Option<&Path>) -> SdkResult<Vec<String>> {
        let _lock = self.lock()?;
        Ok(self.index()?.reset(path)?)
    }

    /// Staged, modified, untracked, and deleted paths.
    pub fn status(&self) -> SdkResult<WorkdirStatus> {
        Ok(self.index()?.status()?)
    }

    // ---- Commits ----

    /// Commit the staged snapshot on the current branch.
    pub fn commit(&self, message: &str, author: Option<&str>) -> SdkResult<Commit> {
        let _lock = self.lock()?;
        let branch = self.refs.current_branch()?;
        let parent = self.refs.head(Some(&branch))?;
        let mut index = self.index()?;
        let author = author.unwrap_or(&self.config.author);

        let commit = self.commits.commit_snapshot(&index, message, author, parent)?;
        self.refs.update_head(&branch, commit.hash)?;
        self.history.record(&commit, &branch)?;
        index.clear()?;
        info!(branch = %branch, commit = %commit.hash.short_hex(), "committed");
        Ok(commit)
    }

    /// History records, newest first.
    pub fn log(&self, branch: Option<&str>, limit: Option<usize>) -> SdkResult<Vec<HistoryRecord>> {
        Ok(self.history.query(branch, limit)?)
    }

    /// The commit a revision names.
    pub fn show(&self, rev: &str) -> SdkResult<Commit> {
        let hash = self.resolve_commit(rev)?;
        Ok(self.commits.get(&hash)?)
    }

    /// Resolve `HEAD`, a branch name, or a (possibly abbreviated) hash.
    pub fn resolve_commit(&self, rev: &str) -> SdkResult<ObjectId> {
        let branch = if rev == "HEAD" {
            Some(self.refs.current_branch()?)
        } else if self.refs.exists(rev)? {
            Some(rev.to_string())
        } else {
            None
        };
        match branch {
            Some(name) => self
                .refs
                .head(Some(&name))?
                .ok_or(SdkError::NoCommits(name)),
            None => Ok(self.commits.resolve(rev)?),
        }
    }

    /// Head of the current branch.
    pub fn head(&self) -> SdkResult<Option<ObjectId>> {
        Ok(self.refs.head(None)?)
    }

    // ---- Branches ----

    pub fn current_branch(&self) -> SdkResult<String> {
        Ok(self.refs.current_branch()?)
    }

    pub fn branches(&self) -> SdkResult<Vec<Branch>> {
        Ok(self.refs.list()?)
    }

    /// Create `name` from `from` (default: the current branch).
    pub fn create_branch(&self, name: &str, from: Option<&str>) -> SdkResult<Branch> {
        let _lock = self.lock()?;
        Ok(self.refs.create(name, from)?)
    }

    pub fn delete_branch(&self, name: &str) -> SdkResult<Branch> {
        let _lock = self.lock()?;
        Ok(self.refs.delete(name)?)
    }

    /// Make `name` current. With `checkout`, its head's files are restored
    /// into the working tree.
    pub fn switch(&self, name: &str, checkout: bool) -> SdkResult<Branch> {
        let _lock = self.lock()?;
        self.ensure_no_pending_merge()?;
        let branch = self.refs.switch(name)?;
        if checkout {
            if let Some(head) = branch.head_commit {
                self.commits.restore(&head, &self.root)?;
            }
        }
        Ok(branch)
    }

    /// Restore a commit's files into the working tree. Files the commit
    /// does not track are left alone.
    pub fn checkout(&self, rev: &str) -> SdkResult<Vec<String>> {
        let _lock = self.lock()?;
        let hash = self.resolve_commit(rev)?;
        Ok(self.commits.restore(&hash, &self.root)?)
    }

    // ---- Diff ----

    /// Compare two revisions, or the working tree against one revision
    /// (default: the current head).
    pub fn diff(&self, from: Option<&str>, to: Option<&str>) -> SdkResult<DiffView> {
        let engine = self.diff_engine()?;
        match (from, to) {
            (Some(a), Some(b)) => {
                let from = self.resolve_commit(a)?;
                let to = self.resolve_commit(b)?;
                let diff = engine.compare_commits(&from, &to)?;
                Ok(DiffView::Commits { from, to, diff })
            }
            (Some(rev), None) | (None, Some(rev)) => {
                let base = self.resolve_commit(rev)?;
                Ok(DiffView::WorkingTree(engine.compare_working_tree(Some(&base))?))
            }
            (None, None) => {
                let base = self.head()?;
                Ok(DiffView::WorkingTree(engine.compare_working_tree(base.as_ref())?))
            }
        }
    }

    // ---- Merge ----

    /// Merge `source` into `target` (default: the current branch).
    pub fn merge(&self, source: &str, target: Option<&str>) -> SdkResult<MergeOutcome> {
        let _lock = self.lock()?;
        Ok(self.merge_engine().merge(source, target)?)
    }

    /// Resolve pending conflicts with the given `path -> content` choices.
    pub fn resolve(&self, resolutions: &BTreeMap<String, String>) -> SdkResult<ResolveOutcome> {
        let _lock = self.lock()?;
        Ok(self.merge_engine().resolve_conflicts(resolutions)?)
    }

    /// Pending conflicts; empty when no merge is pending.
    pub fn conflicts(&self) -> SdkResult<Vec<Conflict>> {
        Ok(self.merge_engine().list_conflicts()?)
    }

    pub fn pending_merge(&self) -> SdkResult<Option<MergeState>> {
        Ok(self.merge_engine().pending()?)
    }

    /// Drop a pending merge.
    pub fn abort_merge(&self) -> SdkResult<Option<MergeState>> {
        let _lock = self.lock()?;
        Ok(self.merge_engine().abort()?)
    }

    // ---- Ignore ----

    /// Append patterns to the ignore file. Returns those not already present.
    pub fn ignore<S: AsRef<str>>(&self, patterns: &[S]) -> SdkResult<Vec<String>> {
        let _lock = self.lock()?;
        let mut matcher = self.ignore_matcher()?;
        let mut added = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if matcher.add(pattern)? {
                added.push(pattern.to_string());
            }
        }
        Ok(added)
    }

    pub fn ignore_patterns(&self) -> SdkResult<Vec<String>> {
        Ok(self.ignore_matcher()?.patterns())
    }

    /// Working-tree files the ignore patterns exclude.
    pub fn ignored_files(&self) -> SdkResult<Vec<String>> {
        Ok(self.ignore_matcher()?.list_ignored(&self.root)?)
    }

    /// Repo-relative form of `path`. Relative inputs are taken from the root.
    pub fn relative_path(&self, path: &Path) -> SdkResult<String> {
        let joined = self.root.join(path);
        let abs = fs::canonicalize(&joined).unwrap_or(joined);
        loam_ignore::relative_path(&self.root, &abs).ok_or(SdkError::OutsideRepository(abs))
    }

    // ---- Clone ----

    /// Copy the whole repository directory to `destination` and open the copy.
    pub fn clone_to(&self, destination: &Path) -> SdkResult<Repository> {
        let _lock = self.lock()?;
        clone_directory(&self.root, destination)?;
        Repository::open(destination, self.config.clone())
    }
}

/// The nearest ancestor of `start` (inclusive) holding `<metadata_dir>/config.json`.
pub fn find_root(start: &Path, metadata_dir: &str) -> SdkResult<PathBuf> {
    let start = fs::canonicalize(start).map_err(|_| SdkError::NotARepository(start.to_path_buf()))?;
    let found = start
        .ancestors()
        .find(|dir| dir.join(metadata_dir).join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf);
    found.ok_or(SdkError::NotARepository(start))
}
