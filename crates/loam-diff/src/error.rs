//! Error types for the diff crate.

use loam_types::ErrorKind;

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Reading a commit failed.
    #[error("commit error: {0}")]
    Commit(#[from] loam_commit::CommitError),

    /// Walking the working tree failed.
    #[error("ignore error: {0}")]
    Ignore(#[from] loam_ignore::IgnoreError),

    /// Reading a working-tree file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiffError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Commit(e) => e.kind(),
            Self::Ignore(e) => e.kind(),
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
