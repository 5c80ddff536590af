use loam_types::ErrorKind;

/// Errors from ignore-pattern handling and tree walks.
#[derive(Debug, thiserror::Error)]
pub enum IgnoreError {
    /// The pattern is not a valid glob.
    #[error("invalid ignore pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Walking the working tree failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Persisting the ignore file failed.
    #[error("store error: {0}")]
    Store(#[from] loam_store::StoreError),

    /// I/O error reading the ignore file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IgnoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPattern { .. } => ErrorKind::Validation,
            Self::Store(e) => e.kind(),
            Self::Walk(_) | Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Convenience alias for ignore results.
pub type IgnoreResult<T> = Result<T, IgnoreError>;
