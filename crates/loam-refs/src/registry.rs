//! File-backed branch registry.
//!
//! Every operation reads the branch document, applies its change, and
//! writes the document back atomically. Validation happens before any write,
//! so a rejected operation leaves the document untouched.

use std::path::{Path, PathBuf};

use chrono::Utc;
use loam_store::document;
use loam_types::ObjectId;
use tracing::{debug, info};

use crate::error::{RefError, RefResult};
use crate::names::validate_branch_name;
use crate::types::{Branch, BranchDocument, BranchRecord};

const BRANCHES_FILE: &str = "branches.json";
const HEAD_FILE: &str = "HEAD";

/// Named branches and the current-branch pointer of one repository.
#[derive(Debug, Clone)]
pub struct BranchRegistry {
    meta: PathBuf,
}

impl BranchRegistry {
    /// A registry over the metadata directory `meta`. No I/O happens here.
    pub fn new(meta: impl Into<PathBuf>) -> Self {
        Self { meta: meta.into() }
    }

    fn document_path(&self) -> PathBuf {
        self.meta.join(BRANCHES_FILE)
    }

    /// Path of the HEAD pointer file.
    pub fn head_path(&self) -> PathBuf {
        self.meta.join(HEAD_FILE)
    }

    fn load(&self) -> RefResult<BranchDocument> {
        document::read_json(&self.document_path())?.ok_or(RefError::NotInitialized)
    }

    fn save(&self, doc: &BranchDocument) -> RefResult<()> {
        document::write_json_atomic(&self.document_path(), doc)?;
        Ok(())
    }

    fn write_head(&self, name: &str) -> RefResult<()> {
        let pointer = format!("ref: refs/branches/{name}\n");
        document::write_bytes_atomic(&self.head_path(), pointer.as_bytes())?;
        Ok(())
    }

    /// Create the document with an empty `default_branch` if absent.
    ///
    /// Returns `true` if the registry was created by this call.
    pub fn init(&self, default_branch: &str) -> RefResult<bool> {
        if self.document_path().is_file() {
            return Ok(false);
        }
        validate_branch_name(default_branch)?;

        let mut doc = BranchDocument {
            current_branch: default_branch.to_string(),
            branches: Default::default(),
        };
        doc.branches.insert(
            default_branch.to_string(),
            BranchRecord {
                head_commit: None,
                created_at: Utc::now(),
                base_branch: None,
            },
        );
        self.save(&doc)?;
        self.write_head(default_branch)?;
        info!(branch = default_branch, "branch registry initialized");
        Ok(true)
    }

    /// Create `name`, copying the head of `base` (default: current branch).
    pub fn create(&self, name: &str, base: Option<&str>) -> RefResult<Branch> {
        validate_branch_name(name)?;
        let mut doc = self.load()?;
        if doc.branches.contains_key(name) {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let base_name = base.unwrap_or(&doc.current_branch).to_string();
        let base_record = doc
            .branches
            .get(&base_name)
            .ok_or_else(|| RefError::NotFound {
                name: base_name.clone(),
            })?;

        let record = BranchRecord {
            head_commit: base_record.head_commit,
            created_at: Utc::now(),
            base_branch: Some(base_name.clone()),
        };
        let branch = record.to_branch(name);
        doc.branches.insert(name.to_string(), record);
        self.save(&doc)?;

        info!(branch = name, base = %base_name, "branch created");
        Ok(branch)
    }

    /// Make `name` the current branch.
    pub fn switch(&self, name: &str) -> RefResult<Branch> {
        let mut doc = self.load()?;
        let branch = doc
            .branches
            .get(name)
            .map(|r| r.to_branch(name))
            .ok_or_else(|| RefError::NotFound {
                name: name.to_string(),
            })?;

        doc.current_branch = name.to_string();
        self.save(&doc)?;
        self.write_head(name)?;
        info!(branch = name, "switched branch");
        Ok(branch)
    }

    /// Point `name` at `hash`.
    pub fn update_head(&self, name: &str, hash: ObjectId) -> RefResult<()> {
        let mut doc = self.load()?;
        let record = doc
            .branches
            .get_mut(name)
            .ok_or_else(|| RefError::NotFound {
                name: name.to_string(),
            })?;
        record.head_commit = Some(hash);
        self.save(&doc)?;
        debug!(branch = name, head = %hash.short_hex(), "branch head updated");
        Ok(())
    }

    /// Name of the current branch.
    pub fn current_branch(&self) -> RefResult<String> {
        Ok(self.load()?.current_branch)
    }

    /// Head of `name` (default: current branch). `None` before the first commit.
    pub fn head(&self, name: Option<&str>) -> RefResult<Option<ObjectId>> {
        let doc = self.load()?;
        let name = name.unwrap_or(&doc.current_branch);
        doc.branches
            .get(name)
            .map(|r| r.head_commit)
            .ok_or_else(|| RefError::NotFound {
                name: name.to_string(),
            })
    }

    /// Look up one branch.
    pub fn get(&self, name: &str) -> RefResult<Branch> {
        self.load()?
            .branches
            .get(name)
            .map(|r| r.to_branch(name))
            .ok_or_else(|| RefError::NotFound {
                name: name.to_string(),
            })
    }

    /// Returns `true` if `name` exists.
    pub fn exists(&self, name: &str) -> RefResult<bool> {
        Ok(self.load()?.branches.contains_key(name))
    }

    /// All branches, sorted by name.
    pub fn list(&self) -> RefResult<Vec<Branch>> {
        Ok(self
            .load()?
            .branches
            .iter()
            .map(|(name, r)| r.to_branch(name))
            .collect())
    }

    /// Delete a branch that is not current. Its commits are kept.
    pub fn delete(&self, name: &str) -> RefResult<Branch> {
        let mut doc = self.load()?;
        if doc.current_branch == name {
            return Err(RefError::DeleteCurrentBranch {
                name: name.to_string(),
            });
        }
        let record = doc.branches.remove(name).ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })?;
        self.save(&doc)?;
        info!(branch = name, "branch deleted");
        Ok(record.to_branch(name))
    }

    /// Metadata directory this registry lives in.
    pub fn meta_dir(&self) -> &Path {
        &self.meta
    }
}
