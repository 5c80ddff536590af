//! Conflict records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a path could not be merged automatically.
///
/// Two-sided names read `<source>_<target>`: `modify_delete` means the
/// source branch changed the file and the target branch deleted it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Both sides changed an existing file differently.
    Content,
    /// Both sides created the path with different content.
    AddAdd,
    /// Source modified, target deleted.
    ModifyDelete,
    /// Source deleted, target modified.
    DeleteModify,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::AddAdd => write!(f, "add/add"),
            Self::ModifyDelete => write!(f, "modify/delete"),
            Self::DeleteModify => write!(f, "delete/modify"),
        }
    }
}

/// One conflicting path.
///
/// Content is decoded lossily for display; a side that deleted the path has
/// no content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub path: String,
    pub kind: ConflictKind,
    pub source_content: Option<String>,
    pub target_content: Option<String>,
}

impl Conflict {
    pub(crate) fn new(
        path: &str,
        kind: ConflictKind,
        source: Option<&[u8]>,
        target: Option<&[u8]>,
    ) -> Self {
        Self {
            path: path.to_string(),
            kind,
            source_content: source.map(|b| String::from_utf8_lossy(b).into_owned()),
            target_content: target.map(|b| String::from_utf8_lossy(b).into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&ConflictKind::AddAdd).unwrap(), "\"add_add\"");
        assert_eq!(
            serde_json::to_string(&ConflictKind::ModifyDelete).unwrap(),
            "\"modify_delete\""
        );
        assert_eq!(ConflictKind::DeleteModify.to_string(), "delete/modify");
    }

    #[test]
    fn deleted_side_has_no_content() {
        let c = Conflict::new("a.txt", ConflictKind::DeleteModify, None, Some(b"kept"));
        assert_eq!(c.source_content, None);
        assert_eq!(c.target_content.as_deref(), Some("kept"));

        let json = serde_json::to_value(&c).unwrap();
        assert!(json["source_content"].is_null());
        assert_eq!(json["kind"], "delete_modify");
    }
}
