//! The persisted pending merge.
//!
//! While a merge has unresolved conflicts its state lives in
//! `<meta>/merges/conflicts.json`. The file exists exactly as long as at
//! least one conflict is pending; every write goes through the atomic
//! document primitive.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use loam_store::document;
use loam_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::conflict::Conflict;
use crate::error::MergeResult;

/// A merge waiting for conflict resolutions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeState {
    pub source_branch: String,
    pub target_branch: String,
    pub source_head: ObjectId,
    /// Target head when the merge started; `None` if the target had no commits.
    pub target_head: Option<ObjectId>,
    pub base: Option<ObjectId>,
    pub started_at: DateTime<Utc>,
    /// Conflicts still waiting for a resolution.
    pub conflicts: Vec<Conflict>,
    /// Content chosen so far, by path.
    #[serde(default)]
    pub resolved: BTreeMap<String, String>,
}

impl MergeState {
    /// Load the pending merge, if any.
    pub fn load(path: &Path) -> MergeResult<Option<Self>> {
        Ok(document::read_json(path)?)
    }

    /// Persist this state.
    pub fn save(&self, path: &Path) -> MergeResult<()> {
        document::write_json_atomic(path, self)?;
        Ok(())
    }

    /// Remove the state file. Returns `true` if one existed.
    pub fn clear(path: &Path) -> MergeResult<bool> {
        Ok(document::remove_document(path)?)
    }

    /// Paths still waiting for a resolution.
    pub fn pending_paths(&self) -> Vec<&str> {
        self.conflicts.iter().map(|c| c.path.as_str()).collect()
    }

    /// Returns `true` if every conflict has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.conflicts.is_empty()
    }
}
