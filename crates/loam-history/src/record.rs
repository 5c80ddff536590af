use chrono::{DateTime, Utc};
use loam_commit::Commit;
use loam_types::ObjectId;
use serde::{Deserialize, Serialize};

/// One row of the history log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub hash: ObjectId,
    pub branch: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub files_changed: Vec<String>,
    pub parent: Option<ObjectId>,
}

impl HistoryRecord {
    /// A record for `commit` on `branch`, stamped with the current time.
    pub fn new(commit: &Commit, branch: &str, files_changed: Vec<String>) -> Self {
        Self {
            hash: commit.hash,
            branch: branch.to_string(),
            message: commit.message.clone(),
            timestamp: Utc::now(),
            files_changed,
            parent: commit.parent,
        }
    }
}
