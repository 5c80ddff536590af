//! Branch types and the persisted branch document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use loam_types::ObjectId;
use serde::{Deserialize, Serialize};

/// A named, mutable pointer to a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    /// `None` until the first commit on this branch.
    pub head_commit: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
    /// The branch whose head this one was copied from.
    pub base_branch: Option<String>,
}

/// One entry of the `branches` map. The name is the map key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BranchRecord {
    pub head_commit: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
    pub base_branch: Option<String>,
}

impl BranchRecord {
    pub(crate) fn to_branch(&self, name: &str) -> Branch {
        Branch {
            name: name.to_string(),
            head_commit: self.head_commit,
            created_at: self.created_at,
            base_branch: self.base_branch.clone(),
        }
    }
}

/// The `branches.json` document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BranchDocument {
    pub current_branch: String,
    pub branches: BTreeMap<String, BranchRecord>,
}
