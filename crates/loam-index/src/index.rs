//! The persisted staging area.
//!
//! [`StagingIndex`] keeps the index document in memory and rewrites it
//! atomically after every mutation. Staged bytes are written to the content
//! store before the entry that references them becomes visible.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use loam_ignore::{relative_path, IgnoreMatcher};
use loam_store::{document, ObjectStore};
use loam_types::ObjectId;
use tracing::{debug, info};

use crate::entry::StagingEntry;
use crate::error::{IndexError, IndexResult};
use crate::status::WorkdirStatus;

/// The staging index: which file versions go into the next commit.
pub struct StagingIndex {
    root: PathBuf,
    path: PathBuf,
    entries: BTreeMap<String, StagingEntry>,
    store: Arc<dyn ObjectStore>,
    ignore: IgnoreMatcher,
}

impl std::fmt::Debug for StagingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingIndex")
            .field("root", &self.root)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl StagingIndex {
    /// Load the index document at `path` for the working tree at `root`.
    ///
    /// A missing document is an empty index.
    pub fn open(
        root: impl Into<PathBuf>,
        path: impl Into<PathBuf>,
        store: Arc<dyn ObjectStore>,
        ignore: IgnoreMatcher,
    ) -> IndexResult<Self> {
        let path = path.into();
        let entries = document::read_json_or_default(&path)?;
        Ok(Self {
            root: root.into(),
            path,
            entries,
            store,
            ignore,
        })
    }

    /// Working-tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Content store holding the staged bytes.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Ignore rules applied while staging.
    pub fn ignore(&self) -> &IgnoreMatcher {
        &self.ignore
    }

    /// Number of staged paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by repo-relative path.
    pub fn get(&self, path: &str) -> Option<&StagingEntry> {
        self.entries.get(path)
    }

    /// All entries, keyed by path.
    pub fn entries(&self) -> &BTreeMap<String, StagingEntry> {
        &self.entries
    }

    /// Sorted `(path, hash)` pairs of everything staged.
    pub fn snapshot(&self) -> Vec<(String, ObjectId)> {
        self.entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.hash))
            .collect()
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Stage a file, or every non-ignored file under a directory.
    ///
    /// Relative paths are taken relative to the working-tree root. Ignored
    /// paths (and the metadata directory) are skipped silently. Returns the
    /// repo-relative paths that were staged.
    pub fn add(&mut self, path: &Path) -> IndexResult<Vec<String>> {
        let abs = self.absolutize(path);
        let rel = self.to_relative(&abs)?;

        if !abs.exists() {
            return Err(IndexError::PathNotFound(path.display().to_string()));
        }
        if let Some(rel) = &rel {
            if self.ignore.is_excluded(rel) {
                debug!(path = %rel, "skipping ignored path");
                return Ok(Vec::new());
            }
        }

        let targets = if abs.is_dir() {
            self.ignore.walk(&self.root, &abs)?
        } else {
            rel.into_iter().collect()
        };

        for rel in &targets {
            let bytes = fs::read(self.root.join(rel))?;
            let hash = self.store.put(&bytes)?;
            self.entries.insert(rel.clone(), StagingEntry::new(hash));
            debug!(path = %rel, hash = %hash.short_hex(), "staged");
        }
        self.save()?;

        info!(count = targets.len(), "files staged");
        Ok(targets)
    }

    /// Unstage one path (a file or a directory prefix), or everything when
    /// `path` is `None`.
    ///
    /// Blobs that no remaining entry references are released from the store.
    /// Returns the paths that were unstaged.
    pub fn reset(&mut self, path: Option<&Path>) -> IndexResult<Vec<String>> {
        let removed: Vec<String> = match path {
            None => self.entries.keys().cloned().collect(),
            Some(path) => {
                let abs = self.absolutize(path);
                match self.to_relative(&abs)? {
                    None => self.entries.keys().cloned().collect(),
                    Some(rel) => {
                        let prefix = format!("{rel}/");
                        let matched: Vec<String> = self
                            .entries
                            .keys()
                            .filter(|p| **p == rel || p.starts_with(&prefix))
                            .cloned()
                            .collect();
                        if matched.is_empty() {
                            return Err(IndexError::PathNotFound(rel));
                        }
                        matched
                    }
                }
            }
        };

        let mut released = BTreeSet::new();
        for rel in &removed {
            if let Some(entry) = self.entries.remove(rel) {
                released.insert(entry.hash);
            }
        }
        let still_referenced: BTreeSet<ObjectId> =
            self.entries.values().map(|e| e.hash).collect();
        for hash in released.difference(&still_referenced) {
            self.store.remove(hash)?;
        }
        self.save()?;

        debug!(count = removed.len(), "unstaged");
        Ok(removed)
    }

    /// Empty the index without releasing any blobs.
    ///
    /// Called after a commit has copied the staged content into its own tree.
    pub fn clear(&mut self) -> IndexResult<()> {
        self.entries.clear();
        self.save()
    }

    // ---------------------------------------------------------------
    // Status
    // ---------------------------------------------------------------

    /// Classify every non-ignored working-tree file against the index.
    pub fn status(&self) -> IndexResult<WorkdirStatus> {
        let mut status = WorkdirStatus::new();
        let on_disk = self.ignore.walk_tree(&self.root)?;

        for rel in &on_disk {
            match self.entries.get(rel) {
                Some(entry) => {
                    let current = ObjectId::from_bytes(&fs::read(self.root.join(rel))?);
                    if current == entry.hash {
                        status.staged.push(rel.clone());
                    } else {
                        status.modified.push(rel.clone());
                    }
                }
                None => status.untracked.push(rel.clone()),
            }
        }

        status.deleted = self
            .entries
            .keys()
            .filter(|rel| !self.root.join(rel.as_str()).is_file())
            .cloned()
            .collect();
        Ok(status)
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn save(&self) -> IndexResult<()> {
        document::write_json_atomic(&self.path, &self.entries)?;
        Ok(())
    }

    fn absolutize(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        normalize(&joined)
    }

    /// Repo-relative form of an absolute path, `None` for the root itself.
    fn to_relative(&self, abs: &Path) -> IndexResult<Option<String>> {
        let root = normalize(&self.root);
        if abs == root {
            return Ok(None);
        }
        match relative_path(&root, abs) {
            Some(rel) => Ok(Some(rel)),
            None => Err(IndexError::OutsideRepository(abs.to_path_buf())),
        }
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_store::{FsObjectStore, InMemoryObjectStore};

    struct Fixture {
        dir: tempfile::TempDir,
        index: StagingIndex,
    }

    impl Fixture {
        fn write(&self, rel: &str, body: &str) {
            let path = self.dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }
    }

    fn fixture_with(patterns: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> =
            Arc::new(FsObjectStore::open(dir.path().join(".loam/objects")).unwrap());
        let ignore = IgnoreMatcher::from_patterns(".loam", patterns.iter().copied()).unwrap();
        let index = StagingIndex::open(
            dir.path(),
            dir.path().join(".loam/index"),
            store,
            ignore,
        )
        .unwrap();
        Fixture { dir, index }
    }

    fn fixture() -> Fixture {
        fixture_with(&[])
    }

    #[test]
    fn new_index_is_empty() {
        let fx = fixture();
        assert!(fx.index.is_empty());
        assert_eq!(fx.index.len(), 0);
        assert!(fx.index.snapshot().is_empty());
    }

    #[test]
    fn add_file_stores_blob_and_entry() {
        let mut fx = fixture();
        fx.write("a.txt", "v1");

        let staged = fx.index.add(Path::new("a.txt")).unwrap();
        assert_eq!(staged, vec!["a.txt"]);

        let entry = fx.index.get("a.txt").unwrap();
        assert_eq!(entry.hash, ObjectId::from_bytes(b"v1"));
        assert_eq!(fx.index.store().get(&entry.hash).unwrap(), b"v1");
    }

    #[test]
    fn add_absolute_path() {
        let mut fx = fixture();
        fx.write("dir/b.txt", "b");
        let abs = fx.root().join("dir/b.txt");
        assert_eq!(fx.index.add(&abs).unwrap(), vec!["dir/b.txt"]);
    }

    #[test]
    fn readd_overwrites_entry() {
        let mut fx = fixture();
        fx.write("a.txt", "v1");
        fx.index.add(Path::new("a.txt")).unwrap();
        fx.write("a.txt", "v2");
        fx.index.add(Path::new("a.txt")).unwrap();

        assert_eq!(fx.index.len(), 1);
        assert_eq!(fx.index.get("a.txt").unwrap().hash, ObjectId::from_bytes(b"v2"));
    }

    #[test]
    fn add_directory_stages_non_ignored_files() {
        let mut fx = fixture_with(&["*.log"]);
        fx.write("src/lib.rs", "lib");
        fx.write("src/nested/mod.rs", "mod");
        fx.write("src/debug.log", "noise");

        let staged = fx.index.add(Path::new("src")).unwrap();
        assert_eq!(staged, vec!["src/lib.rs", "src/nested/mod.rs"]);
    }

    #[test]
    fn add_root_skips_metadata_dir() {
        let mut fx = fixture();
        fx.write("a.txt", "a");
        fx.write(".loam/config.json", "{}");

        let staged = fx.index.add(fx.root().to_path_buf().as_path()).unwrap();
        assert_eq!(staged, vec!["a.txt"]);
    }

    #[test]
    fn add_ignored_path_is_silently_skipped() {
        let mut fx = fixture_with(&["*.log"]);
        fx.write("debug.log", "noise");
        assert!(fx.index.add(Path::new("debug.log")).unwrap().is_empty());
        assert!(fx.index.is_empty());
    }

    #[test]
    fn add_missing_path_fails() {
        let mut fx = fixture();
        let err = fx.index.add(Path::new("nope.txt")).unwrap_err();
        assert!(matches!(err, IndexError::PathNotFound(_)));
        assert_eq!(err.kind(), loam_types::ErrorKind::NotFound);
    }

    #[test]
    fn add_outside_repository_fails() {
        let mut fx = fixture();
        let other = tempfile::tempdir().unwrap();
        fs::write(other.path().join("x.txt"), "x").unwrap();

        let err = fx.index.add(&other.path().join("x.txt")).unwrap_err();
        assert!(matches!(err, IndexError::OutsideRepository(_)));
        assert_eq!(err.kind(), loam_types::ErrorKind::Validation);

        let err = fx.index.add(Path::new("../escape.txt")).unwrap_err();
        assert!(matches!(err, IndexError::OutsideRepository(_)));
    }

    #[test]
    fn index_survives_reopen() {
        let mut fx = fixture();
        fx.write("a.txt", "v1");
        fx.index.add(Path::new("a.txt")).unwrap();

        let reopened = StagingIndex::open(
            fx.root(),
            fx.root().join(".loam/index"),
            Arc::clone(fx.index.store()),
            IgnoreMatcher::empty(".loam"),
        )
        .unwrap();
        assert_eq!(reopened.snapshot(), fx.index.snapshot());
    }

    #[test]
    fn reset_single_path_releases_unshared_blob() {
        let mut fx = fixture();
        fx.write("a.txt", "only-a");
        fx.write("b.txt", "shared");
        fx.write("c.txt", "shared");
        fx.index.add(Path::new(".")).unwrap();

        let a = fx.index.get("a.txt").unwrap().hash;
        let shared = fx.index.get("b.txt").unwrap().hash;

        assert_eq!(fx.index.reset(Some(Path::new("a.txt"))).unwrap(), vec!["a.txt"]);
        assert!(!fx.index.store().contains(&a).unwrap());

        fx.index.reset(Some(Path::new("b.txt"))).unwrap();
        assert!(fx.index.store().contains(&shared).unwrap());
        assert_eq!(fx.index.len(), 1);
    }

    #[test]
    fn reset_unstaged_path_fails() {
        let mut fx = fixture();
        let err = fx.index.reset(Some(Path::new("ghost.txt"))).unwrap_err();
        assert!(matches!(err, IndexError::PathNotFound(_)));
    }

    #[test]
    fn reset_all_empties_index() {
        let mut fx = fixture();
        fx.write("a.txt", "a");
        fx.write("d/b.txt", "b");
        fx.index.add(Path::new(".")).unwrap();

        let removed = fx.index.reset(None).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(fx.index.is_empty());
    }

    #[test]
    fn reset_directory_prefix() {
        let mut fx = fixture();
        fx.write("d/a.txt", "a");
        fx.write("d/b.txt", "b");
        fx.write("dx.txt", "x");
        fx.index.add(Path::new(".")).unwrap();

        let removed = fx.index.reset(Some(Path::new("d"))).unwrap();
        assert_eq!(removed, vec!["d/a.txt", "d/b.txt"]);
        assert!(fx.index.get("dx.txt").is_some());
    }

    #[test]
    fn status_classifies_files() {
        let mut fx = fixture_with(&["*.log"]);
        fx.write("same.txt", "same");
        fx.write("changed.txt", "before");
        fx.write("gone.txt", "bye");
        fx.index.add(Path::new(".")).unwrap();

        fx.write("changed.txt", "after");
        fs::remove_file(fx.root().join("gone.txt")).unwrap();
        fx.write("new.txt", "new");
        fx.write("noise.log", "ignored");

        let status = fx.index.status().unwrap();
        assert_eq!(status.staged, vec!["same.txt"]);
        assert_eq!(status.modified, vec!["changed.txt"]);
        assert_eq!(status.untracked, vec!["new.txt"]);
        assert_eq!(status.deleted, vec!["gone.txt"]);
    }

    #[test]
    fn clear_keeps_blobs() {
        let mut fx = fixture();
        fx.write("a.txt", "kept");
        fx.index.add(Path::new("a.txt")).unwrap();
        let hash = fx.index.get("a.txt").unwrap().hash;

        fx.index.clear().unwrap();
        assert!(fx.index.is_empty());
        assert!(fx.index.store().contains(&hash).unwrap());
    }

    #[test]
    fn in_memory_store_backend() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "v1").unwrap();
        let mut index = StagingIndex::open(
            dir.path(),
            dir.path().join("index"),
            Arc::new(InMemoryObjectStore::new()),
            IgnoreMatcher::empty(".loam"),
        )
        .unwrap();
        index.add(Path::new("a.txt")).unwrap();
        assert_eq!(
            index.snapshot(),
            vec![("a.txt".to_string(), ObjectId::from_bytes(b"v1"))]
        );
    }

    #[test]
    fn normalize_resolves_dots() {
        assert_eq!(normalize(Path::new("/r/a/./b/../c")), PathBuf::from("/r/a/c"));
    }
}
