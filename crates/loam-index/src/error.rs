//! Error types for the index crate.

use std::path::PathBuf;

use loam_types::ErrorKind;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The path resolves outside the working tree.
    #[error("path is outside the repository: {}", .0.display())]
    OutsideRepository(PathBuf),

    /// The path does not exist on disk, or is not staged (for reset).
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// Walking or matching the working tree failed.
    #[error("ignore error: {0}")]
    Ignore(#[from] loam_ignore::IgnoreError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] loam_store::StoreError),

    /// Reading a working-tree file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutsideRepository(_) => ErrorKind::Validation,
            Self::PathNotFound(_) => ErrorKind::NotFound,
            Self::Ignore(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
