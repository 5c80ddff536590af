use std::path::PathBuf;

use loam_types::{ErrorKind, ObjectId};

/// Errors from object store and document operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// A persisted document could not be parsed.
    #[error("corrupt document {}: {reason}", path.display())]
    CorruptDocument { path: PathBuf, reason: String },

    /// Serialization failure while writing a document.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The repository lock could not be taken.
    #[error("failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Classify this error within the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::HashMismatch { .. } | Self::CorruptDocument { .. } => ErrorKind::State,
            Self::Serialization(_) | Self::Lock { .. } | Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
