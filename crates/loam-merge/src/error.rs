//! Error types for merge operations.

use loam_types::ErrorKind;

/// Errors that can occur while merging or resolving.
///
/// Conflicts found by a merge are not errors; they are reported through
/// [`crate::MergeOutcome::Conflicted`].
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A previous merge still has unresolved conflicts.
    #[error("merge of {source_branch} into {target_branch} has unresolved conflicts")]
    ConflictsPending {
        source_branch: String,
        target_branch: String,
    },

    /// Resolution was requested but no merge is pending.
    #[error("no merge in progress")]
    NoMergeInProgress,

    /// The target branch moved after the merge started.
    #[error("branch {branch} moved since the merge started; abort and merge again")]
    StaleMerge { branch: String },

    /// Something in the working tree blocks a merge write.
    #[error("cannot update {path} in the working tree: {reason}")]
    WorktreeClash { path: String, reason: String },

    #[error("commit error: {0}")]
    Commit(#[from] loam_commit::CommitError),

    #[error("branch error: {0}")]
    Ref(#[from] loam_refs::RefError),

    #[error("history error: {0}")]
    History(#[from] loam_history::HistoryError),

    #[error("store error: {0}")]
    Store(#[from] loam_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MergeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConflictsPending { .. } => ErrorKind::Conflict,
            Self::NoMergeInProgress | Self::StaleMerge { .. } | Self::WorktreeClash { .. } => {
                ErrorKind::State
            }
            Self::Commit(e) => e.kind(),
            Self::Ref(e) => e.kind(),
            Self::History(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
