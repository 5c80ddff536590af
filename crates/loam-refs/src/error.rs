//! Error types for branch operations.

use loam_types::ErrorKind;
use thiserror::Error;

/// Errors that can occur during branch operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The branch was not found.
    #[error("branch not found: {name}")]
    NotFound { name: String },

    /// A branch with this name already exists.
    #[error("branch already exists: {name}")]
    AlreadyExists { name: String },

    /// The branch name is invalid.
    #[error("invalid branch name {name:?}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// Cannot delete the current branch.
    #[error("cannot delete current branch: {name}")]
    DeleteCurrentBranch { name: String },

    /// The branch document does not exist yet.
    #[error("branch registry is not initialized")]
    NotInitialized,

    /// Persisting or loading the branch document failed.
    #[error("store error: {0}")]
    Store(#[from] loam_store::StoreError),
}

impl RefError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } | Self::InvalidBranchName { .. } => ErrorKind::Validation,
            Self::DeleteCurrentBranch { .. } | Self::NotInitialized => ErrorKind::State,
            Self::Store(e) => e.kind(),
        }
    }
}

/// Convenience type alias for branch operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
