//! On-disk commit store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use loam_index::StagingIndex;
use loam_store::document;
use loam_types::ObjectId;
use tracing::{debug, info};

use crate::commit::{compute_hash, Commit, FileRecord};
use crate::error::{CommitError, CommitResult};

const METADATA_FILE: &str = "metadata.json";
const TREE_DIR: &str = "tree";

/// Shortest abbreviated hash accepted by [`CommitStore::resolve`].
pub const MIN_PREFIX_LEN: usize = 4;

/// Immutable commits under `<meta>/commits/`.
#[derive(Debug, Clone)]
pub struct CommitStore {
    dir: PathBuf,
}

impl CommitStore {
    /// Open (creating if necessary) the commit directory.
    pub fn open(dir: impl Into<PathBuf>) -> CommitResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn commit_dir(&self, hash: &ObjectId) -> PathBuf {
        self.dir.join(hash.to_hex())
    }

    // ---------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------

    /// Freeze the staging snapshot into a commit and empty the index.
    ///
    /// Fails with [`CommitError::EmptyCommit`] when nothing is staged. The
    /// index is only cleared once the commit directory is in place.
    pub fn create(
        &self,
        index: &mut StagingIndex,
        message: &str,
        author: &str,
        parent: Option<ObjectId>,
    ) -> CommitResult<Commit> {
        let commit = self.commit_snapshot(index, message, author, parent)?;
        index.clear()?;
        Ok(commit)
    }

    /// Freeze the staging snapshot into a commit, leaving the index as is.
    ///
    /// For callers that have more to record before the staged set may be
    /// dropped; they clear the index themselves.
    pub fn commit_snapshot(
        &self,
        index: &StagingIndex,
        message: &str,
        author: &str,
        parent: Option<ObjectId>,
    ) -> CommitResult<Commit> {
        if index.is_empty() {
            return Err(CommitError::EmptyCommit);
        }

        let mut tree = BTreeMap::new();
        for (path, hash) in index.snapshot() {
            let bytes = index.store().get(&hash)?;
            tree.insert(path, bytes);
        }
        self.create_from_tree(&tree, message, author, parent, None)
    }

    /// Write a commit whose content is given directly as `path -> bytes`.
    ///
    /// Used for merge commits, whose trees are assembled from other commits.
    /// The directory is built in a temporary sibling and renamed into place;
    /// if a commit with the same hash already exists it is returned as is.
    pub fn create_from_tree(
        &self,
        tree: &BTreeMap<String, Vec<u8>>,
        message: &str,
        author: &str,
        parent: Option<ObjectId>,
        merge_parent: Option<ObjectId>,
    ) -> CommitResult<Commit> {
        let mut files = Vec::with_capacity(tree.len());
        for (path, bytes) in tree {
            validate_tree_path(path)?;
            files.push(FileRecord {
                path: path.clone(),
                hash: ObjectId::from_bytes(bytes),
            });
        }

        let hash = compute_hash(&files, parent, merge_parent, author, message)?;
        let final_dir = self.commit_dir(&hash);
        if final_dir.join(METADATA_FILE).is_file() {
            debug!(commit = %hash.short_hex(), "identical commit already stored");
            return self.get(&hash);
        }

        let commit = Commit {
            hash,
            message: message.to_string(),
            author: author.to_string(),
            timestamp: Utc::now(),
            parent,
            merge_parent,
            files,
        };

        let staging = tempfile::Builder::new()
            .prefix(".tmp-commit-")
            .tempdir_in(&self.dir)?;
        let tree_root = staging.path().join(TREE_DIR);
        fs::create_dir_all(&tree_root)?;
        for (path, bytes) in tree {
            let dest = tree_root.join(path);
            if let Some(parent_dir) = dest.parent() {
                fs::create_dir_all(parent_dir)?;
            }
            fs::write(&dest, bytes)?;
        }
        document::write_json_atomic(&staging.path().join(METADATA_FILE), &commit)?;

        // The emptied temp handle is dropped afterwards; its cleanup of the
        // moved path is a no-op.
        fs::rename(staging.path(), &final_dir)?;

        info!(
            commit = %hash.short_hex(),
            files = commit.files.len(),
            merge = merge_parent.is_some(),
            "commit created"
        );
        Ok(commit)
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    /// Load a commit by full hash.
    pub fn get(&self, hash: &ObjectId) -> CommitResult<Commit> {
        let path = self.commit_dir(hash).join(METADATA_FILE);
        match document::read_json::<Commit>(&path) {
            Ok(Some(commit)) => Ok(commit),
            Ok(None) => Err(CommitError::NotFound(hash.to_hex())),
            Err(e) => Err(CommitError::Corrupt {
                commit: hash.to_hex(),
                reason: e.to_string(),
            }),
        }
    }

    /// Returns `true` if a commit with this hash exists.
    pub fn exists(&self, hash: &ObjectId) -> bool {
        self.commit_dir(hash).join(METADATA_FILE).is_file()
    }

    /// Resolve a full or abbreviated hex hash to a stored commit.
    pub fn resolve(&self, prefix: &str) -> CommitResult<ObjectId> {
        let prefix = prefix.trim();
        if let Ok(id) = ObjectId::from_hex(prefix) {
            return if self.exists(&id) {
                Ok(id)
            } else {
                Err(CommitError::NotFound(prefix.to_string()))
            };
        }
        if prefix.len() < MIN_PREFIX_LEN {
            return Err(CommitError::NotFound(prefix.to_string()));
        }

        let matches: Vec<ObjectId> = self
            .list_ids()?
            .into_iter()
            .filter(|id| id.matches_prefix(prefix))
            .collect();
        match matches.as_slice() {
            [] => Err(CommitError::NotFound(prefix.to_string())),
            [id] => Ok(*id),
            _ => Err(CommitError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// Hashes of every stored commit, sorted.
    pub fn list_ids(&self) -> CommitResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Ok(id) = ObjectId::from_hex(name) {
                if self.exists(&id) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// The commit's files as `path -> content hash`.
    pub fn files(&self, hash: &ObjectId) -> CommitResult<BTreeMap<String, ObjectId>> {
        Ok(self.get(hash)?.file_map())
    }

    /// Bytes of one committed file.
    pub fn read_file(&self, hash: &ObjectId, path: &str) -> CommitResult<Vec<u8>> {
        let commit = self.get(hash)?;
        if commit.file_hash(path).is_none() {
            return Err(CommitError::PathNotFound {
                commit: hash.to_hex(),
                path: path.to_string(),
            });
        }
        self.read_tree_file(hash, path)
    }

    /// Every committed file's bytes, keyed by path.
    pub fn read_tree(&self, hash: &ObjectId) -> CommitResult<BTreeMap<String, Vec<u8>>> {
        let commit = self.get(hash)?;
        let mut tree = BTreeMap::new();
        for file in &commit.files {
            tree.insert(file.path.clone(), self.read_tree_file(hash, &file.path)?);
        }
        Ok(tree)
    }

    /// Copy every file of the commit into `destination`, preserving relative
    /// paths. Returns the restored paths.
    pub fn restore(&self, hash: &ObjectId, destination: &Path) -> CommitResult<Vec<String>> {
        let commit = self.get(hash)?;
        let mut restored = Vec::with_capacity(commit.files.len());
        for file in &commit.files {
            let bytes = self.read_tree_file(hash, &file.path)?;
            let dest = destination.join(&file.path);
            if let Some(parent_dir) = dest.parent() {
                fs::create_dir_all(parent_dir)?;
            }
            fs::write(&dest, bytes)?;
            restored.push(file.path.clone());
        }
        info!(commit = %hash.short_hex(), files = restored.len(), "commit restored");
        Ok(restored)
    }

    fn read_tree_file(&self, hash: &ObjectId, path: &str) -> CommitResult<Vec<u8>> {
        validate_tree_path(path)?;
        let file = self.commit_dir(hash).join(TREE_DIR).join(path);
        fs::read(&file).map_err(|e| CommitError::Corrupt {
            commit: hash.to_hex(),
            reason: format!("{path}: {e}"),
        })
    }
}

/// Tree paths must be relative and stay inside the tree.
fn validate_tree_path(path: &str) -> CommitResult<()> {
    let p = Path::new(path);
    let ok = !path.is_empty()
        && p.components().all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(CommitError::InvalidPath(path.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use loam_ignore::IgnoreMatcher;
    use loam_store::{FsObjectStore, ObjectStore};
    use std::sync::Arc;

    pub(crate) struct Fixture {
        pub dir: tempfile::TempDir,
        pub index: StagingIndex,
        pub commits: CommitStore,
    }

    impl Fixture {
        pub fn write(&self, rel: &str, body: &str) {
            let path = self.dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        pub fn commit(&mut self, files: &[(&str, &str)], msg: &str, parent: Option<ObjectId>) -> Commit {
            for (rel, body) in files {
                self.write(rel, body);
                self.index.add(Path::new(rel)).unwrap();
            }
            self.commits.create(&mut self.index, msg, "tester", parent).unwrap()
        }
    }

    pub(crate) fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let meta = dir.path().join(".loam");
        let store: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::open(meta.join("objects")).unwrap());
        let index = StagingIndex::open(
            dir.path(),
            meta.join("index"),
            store,
            IgnoreMatcher::empty(".loam"),
        )
        .unwrap();
        let commits = CommitStore::open(meta.join("commits")).unwrap();
        Fixture { dir, index, commits }
    }

    #[test]
    fn commit_records_staged_hashes_and_clears_index() {
        let mut fx = fixture();
        let commit = fx.commit(&[("a.txt", "v1")], "c1", None);

        assert_eq!(
            commit.files,
            vec![FileRecord {
                path: "a.txt".into(),
                hash: ObjectId::from_bytes(b"v1"),
            }]
        );
        assert_eq!(
            commit.files[0].hash.to_hex(),
            "3bfc269594ef649228e9a74bab00f042efc91d5acc6fbee31a382e80d42388fe"
        );
        assert!(fx.index.is_empty());
        assert_eq!(fx.commits.get(&commit.hash).unwrap(), commit);
    }

    #[test]
    fn empty_staging_creates_nothing() {
        let mut fx = fixture();
        let err = fx.commits.create(&mut fx.index, "c", "a", None).unwrap_err();
        assert!(matches!(err, CommitError::EmptyCommit));
        assert_eq!(err.kind(), loam_types::ErrorKind::State);
        assert!(fx.commits.list_ids().unwrap().is_empty());
        assert_eq!(fs::read_dir(fx.dir.path().join(".loam/commits")).unwrap().count(), 0);
    }

    #[test]
    fn files_are_sorted_and_tree_is_mirrored() {
        let mut fx = fixture();
        let commit = fx.commit(&[("z.txt", "z"), ("d/a.txt", "a")], "c", None);
        let paths: Vec<_> = commit.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["d/a.txt", "z.txt"]);
        assert_eq!(fx.commits.read_file(&commit.hash, "d/a.txt").unwrap(), b"a");
        assert!(fx
            .dir
            .path()
            .join(".loam/commits")
            .join(commit.hash.to_hex())
            .join("tree/d/a.txt")
            .is_file());
    }

    #[test]
    fn identical_commit_is_reused() {
        let fx = fixture();
        let mut tree = BTreeMap::new();
        tree.insert("a.txt".to_string(), b"v1".to_vec());
        let c1 = fx.commits.create_from_tree(&tree, "m", "a", None, None).unwrap();
        let c2 = fx.commits.create_from_tree(&tree, "m", "a", None, None).unwrap();
        assert_eq!(c1, c2);
        assert_eq!(fx.commits.list_ids().unwrap().len(), 1);
    }

    #[test]
    fn get_unknown_is_not_found() {
        let fx = fixture();
        let err = fx.commits.get(&ObjectId::from_bytes(b"nope")).unwrap_err();
        assert!(matches!(err, CommitError::NotFound(_)));
        assert_eq!(err.kind(), loam_types::ErrorKind::NotFound);
    }

    #[test]
    fn read_untracked_path_fails() {
        let mut fx = fixture();
        let c = fx.commit(&[("a.txt", "v1")], "c", None);
        assert!(matches!(
            fx.commits.read_file(&c.hash, "b.txt"),
            Err(CommitError::PathNotFound { .. })
        ));
    }

    #[test]
    fn restore_copies_tree() {
        let mut fx = fixture();
        let c = fx.commit(&[("a.txt", "v1"), ("d/b.txt", "b")], "c", None);
        let out = tempfile::tempdir().unwrap();
        let restored = fx.commits.restore(&c.hash, out.path()).unwrap();
        assert_eq!(restored, vec!["a.txt", "d/b.txt"]);
        assert_eq!(fs::read_to_string(out.path().join("d/b.txt")).unwrap(), "b");
    }

    #[test]
    fn resolve_prefixes() {
        let mut fx = fixture();
        let c = fx.commit(&[("a.txt", "v1")], "c", None);
        let hex = c.hash.to_hex();

        assert_eq!(fx.commits.resolve(&hex).unwrap(), c.hash);
        assert_eq!(fx.commits.resolve(&hex[..8]).unwrap(), c.hash);
        assert!(matches!(fx.commits.resolve(&hex[..2]), Err(CommitError::NotFound(_))));
        let missing = if hex.starts_with('0') { "ffffffff" } else { "00000000" };
        assert!(matches!(fx.commits.resolve(missing), Err(CommitError::NotFound(_))));
    }

    #[test]
    fn invalid_tree_paths_are_rejected() {
        let fx = fixture();
        for bad in ["../x", "/abs", "", "a/../../b"] {
            let mut tree = BTreeMap::new();
            tree.insert(bad.to_string(), b"x".to_vec());
            let err = fx.commits.create_from_tree(&tree, "m", "a", None, None).unwrap_err();
            assert!(matches!(err, CommitError::InvalidPath(_)), "{bad}");
        }
    }

    #[test]
    fn merge_commit_records_both_parents() {
        let mut fx = fixture();
        let a = fx.commit(&[("a.txt", "1")], "a", None);
        let b = fx.commit(&[("b.txt", "2")], "b", None);
        let tree = fx.commits.read_tree(&a.hash).unwrap();
        let m = fx
            .commits
            .create_from_tree(&tree, "merge", "t", Some(a.hash), Some(b.hash))
            .unwrap();
        assert_eq!(m.parents().collect::<Vec<_>>(), vec![a.hash, b.hash]);
        assert!(fx.commits.get(&m.hash).unwrap().is_merge());
    }

    #[test]
    fn snapshot_commit_keeps_index() {
        let mut fx = fixture();
        fx.write("a.txt", "v1");
        fx.index.add(Path::new("a.txt")).unwrap();

        let commit = fx.commits.commit_snapshot(&fx.index, "c1", "tester", None).unwrap();
        assert_eq!(fx.index.len(), 1);
        assert_eq!(commit.file_hash("a.txt"), Some(ObjectId::from_bytes(b"v1")));
        fx.index.clear().unwrap();
        assert!(matches!(
            fx.commits.commit_snapshot(&fx.index, "c2", "tester", None),
            Err(CommitError::EmptyCommit)
        ));
    }
}
