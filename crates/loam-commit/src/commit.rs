//! Commit metadata and hashing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use loam_types::ObjectId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CommitError, CommitResult};

/// One committed path and the content hash of its bytes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub hash: ObjectId,
}

/// Commit metadata, persisted as `metadata.json` in the commit directory.
///
/// `files` is sorted by path. `merge_parent` is only present on commits
/// created by a merge, and names the merged-in branch head.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: ObjectId,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub parent: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_parent: Option<ObjectId>,
    pub files: Vec<FileRecord>,
}

impl Commit {
    /// Parents in lineage order: first parent, then merge parent.
    pub fn parents(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.parent.iter().chain(self.merge_parent.iter()).copied()
    }

    /// Returns `true` if this commit was created by a merge.
    pub fn is_merge(&self) -> bool {
        self.merge_parent.is_some()
    }

    /// The file list as a path-keyed map.
    pub fn file_map(&self) -> BTreeMap<String, ObjectId> {
        self.files
            .iter()
            .map(|f| (f.path.clone(), f.hash))
            .collect()
    }

    /// Content hash recorded for `path`, if tracked.
    pub fn file_hash(&self, path: &str) -> Option<ObjectId> {
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(path))
            .ok()
            .map(|i| self.files[i].hash)
    }
}

/// Hashed fields of a commit, in their canonical serialized order.
#[derive(Serialize)]
struct CanonicalCommit<'a> {
    files: &'a [FileRecord],
    parent: Option<ObjectId>,
    merge_parent: Option<ObjectId>,
    author: &'a str,
    message: &'a str,
}

/// Compute the identity of a commit.
///
/// `files` must already be sorted by path. The timestamp is not hashed.
pub fn compute_hash(
    files: &[FileRecord],
    parent: Option<ObjectId>,
    merge_parent: Option<ObjectId>,
    author: &str,
    message: &str,
) -> CommitResult<ObjectId> {
    let canonical = CanonicalCommit {
        files,
        parent,
        merge_parent,
        author,
        message,
    };
    let bytes =
        serde_json::to_vec(&canonical).map_err(|e| CommitError::Serialization(e.to_string()))?;
    Ok(ObjectId::from_hash(Sha256::digest(&bytes).into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(pairs: &[(&str, &str)]) -> Vec<FileRecord> {
        pairs
            .iter()
            .map(|(p, c)| FileRecord {
                path: p.to_string(),
                hash: ObjectId::from_bytes(c.as_bytes()),
            })
            .collect()
    }

    #[test]
    fn hash_is_reproducible() {
        let f = files(&[("a.txt", "v1")]);
        let h1 = compute_hash(&f, None, None, "ann", "c1").unwrap();
        let h2 = compute_hash(&f, None, None, "ann", "c1").unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_covers_every_field() {
        let f = files(&[("a.txt", "v1")]);
        let base = compute_hash(&f, None, None, "ann", "c1").unwrap();
        let p = Some(ObjectId::from_bytes(b"parent"));

        assert_ne!(base, compute_hash(&files(&[("a.txt", "v2")]), None, None, "ann", "c1").unwrap());
        assert_ne!(base, compute_hash(&files(&[("b.txt", "v1")]), None, None, "ann", "c1").unwrap());
        assert_ne!(base, compute_hash(&f, p, None, "ann", "c1").unwrap());
        assert_ne!(base, compute_hash(&f, None, p, "ann", "c1").unwrap());
        assert_ne!(base, compute_hash(&f, None, None, "bob", "c1").unwrap());
        assert_ne!(base, compute_hash(&f, None, None, "ann", "c2").unwrap());
    }

    #[test]
    fn merge_parent_is_omitted_when_absent() {
        let commit = Commit {
            hash: ObjectId::from_bytes(b"c"),
            message: "m".into(),
            author: "a".into(),
            timestamp: Utc::now(),
            parent: None,
            merge_parent: None,
            files: files(&[("a.txt", "v1")]),
        };
        let json = serde_json::to_value(&commit).unwrap();
        assert!(json.get("merge_parent").is_none());
        assert!(json["parent"].is_null());
        assert_eq!(json["files"][0]["path"], "a.txt");

        let back: Commit = serde_json::from_value(json).unwrap();
        assert_eq!(back, commit);
    }

    #[test]
    fn file_lookup() {
        let commit = Commit {
            hash: ObjectId::from_bytes(b"c"),
            message: "m".into(),
            author: "a".into(),
            timestamp: Utc::now(),
            parent: Some(ObjectId::from_bytes(b"p1")),
            merge_parent: Some(ObjectId::from_bytes(b"p2")),
            files: files(&[("a.txt", "1"), ("b/c.txt", "2")]),
        };
        assert_eq!(commit.file_hash("b/c.txt"), Some(ObjectId::from_bytes(b"2")));
        assert_eq!(commit.file_hash("zzz"), None);
        assert_eq!(commit.parents().count(), 2);
        assert!(commit.is_merge());
        assert_eq!(commit.file_map().len(), 2);
    }
}
