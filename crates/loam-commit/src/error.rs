//! Error types for commit operations.

use loam_types::ErrorKind;

/// Errors that can occur while creating or reading commits.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// No commit with this hash (or prefix) exists.
    #[error("commit not found: {0}")]
    NotFound(String),

    /// A commit was requested from an empty staging index.
    #[error("nothing staged to commit")]
    EmptyCommit,

    /// An abbreviated hash matched more than one commit.
    #[error("ambiguous commit prefix {prefix}: {count} matches")]
    AmbiguousPrefix { prefix: String, count: usize },

    /// A tree path is absolute or escapes the tree.
    #[error("invalid tree path: {0}")]
    InvalidPath(String),

    /// The commit exists but does not track this path.
    #[error("path {path} not in commit {commit}")]
    PathNotFound { commit: String, path: String },

    /// Commit metadata could not be parsed, or a tree file is missing.
    #[error("corrupt commit {commit}: {reason}")]
    Corrupt { commit: String, reason: String },

    /// Serialization failure while hashing or writing metadata.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Staging index operation failed.
    #[error("index error: {0}")]
    Index(#[from] loam_index::IndexError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] loam_store::StoreError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::PathNotFound { .. } => ErrorKind::NotFound,
            Self::EmptyCommit | Self::Corrupt { .. } => ErrorKind::State,
            Self::AmbiguousPrefix { .. } | Self::InvalidPath(_) => ErrorKind::Validation,
            Self::Index(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Serialization(_) | Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Convenience alias for commit results.
pub type CommitResult<T> = Result<T, CommitError>;
