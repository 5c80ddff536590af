//! Staged file entries.

use chrono::{DateTime, Utc};
use loam_types::ObjectId;
use serde::{Deserialize, Serialize};

/// One staged file version.
///
/// The path is the key of the index document and is not repeated here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingEntry {
    /// Content hash of the staged bytes.
    pub hash: ObjectId,
    /// When the path was last staged.
    pub staged_at: DateTime<Utc>,
}

impl StagingEntry {
    /// A new entry stamped with the current time.
    pub fn new(hash: ObjectId) -> Self {
        Self {
            hash,
            staged_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_hash_as_hex() {
        let entry = StagingEntry::new(ObjectId::from_bytes(b"v1"));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["hash"], entry.hash.to_hex());
        assert!(json["staged_at"].is_string());
    }
}
