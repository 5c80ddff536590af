use std::path::PathBuf;

use loam_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("not a loam repository (or any parent up to /): {0}")]
    NotARepository(PathBuf),

    #[error("repository already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("path is outside the repository: {0}")]
    OutsideRepository(PathBuf),

    #[error("branch {0} has no commits yet")]
    NoCommits(String),

    #[error("cannot clone {source_dir} into {destination}: {reason}")]
    InvalidCloneTarget {
        source_dir: PathBuf,
        destination: PathBuf,
        reason: String,
    },

    #[error("merge of {source_branch} into {target_branch} has unresolved conflicts")]
    MergeInProgress {
        source_branch: String,
        target_branch: String,
    },

    #[error("invalid configuration {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("store error: {0}")]
    Store(#[from] loam_store::StoreError),

    #[error("ignore error: {0}")]
    Ignore(#[from] loam_ignore::IgnoreError),

    #[error("index error: {0}")]
    Index(#[from] loam_index::IndexError),

    #[error("commit error: {0}")]
    Commit(#[from] loam_commit::CommitError),

    #[error("branch error: {0}")]
    Ref(#[from] loam_refs::RefError),

    #[error("history error: {0}")]
    History(#[from] loam_history::HistoryError),

    #[error("diff error: {0}")]
    Diff(#[from] loam_diff::DiffError),

    #[error("merge error: {0}")]
    Merge(#[from] loam_merge::MergeError),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotARepository(_) => ErrorKind::NotFound,
            Self::AlreadyInitialized(_) | Self::NoCommits(_) => ErrorKind::State,
            Self::OutsideRepository(_) | Self::InvalidCloneTarget { .. } | Self::Config { .. } => {
                ErrorKind::Validation
            }
            Self::MergeInProgress { .. } => ErrorKind::Conflict,
            Self::Store(e) => e.kind(),
            Self::Ignore(e) => e.kind(),
            Self::Index(e) => e.kind(),
            Self::Commit(e) => e.kind(),
            Self::Ref(e) => e.kind(),
            Self::History(e) => e.kind(),
            Self::Diff(e) => e.kind(),
            Self::Merge(e) => e.kind(),
            Self::Walk(_) | Self::Io(_) => ErrorKind::Io,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
