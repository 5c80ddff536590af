use loam_types::ErrorKind;

/// Errors produced by history operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("no history record for commit {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] loam_store::StoreError),
}

impl HistoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Store(e) => e.kind(),
        }
    }
}

pub type HistoryResult<T> = Result<T, HistoryError>;
