//! Repository facade for Loam.
//!
//! [`Repository`] is the entry point for applications embedding Loam and for
//! the `loam` binary. It owns the on-disk layout under the metadata
//! directory, finds a repository from any path inside it, and takes the
//! advisory repository lock around every mutating operation.
//!
//! Components are wired from an explicit [`EngineConfig`]; nothing is read
//! from process-global state.

pub mod clone;
pub mod config;
pub mod error;
pub mod repository;

pub use clone::clone_directory;
pub use config::{EngineConfig, RepoConfig};
pub use error::{SdkError, SdkResult};
pub use repository::{DiffView, Repository};

// Re-export the types callers see in results.
pub use loam_commit::{Commit, FileRecord};
pub use loam_diff::{ChangeStatus, CommitDiff, FileChange, FileDiff, WorktreeDiff};
pub use loam_history::HistoryRecord;
pub use loam_index::WorkdirStatus;
pub use loam_merge::{Conflict, ConflictKind, MergeOutcome, MergeState, MergeSummary, ResolveOutcome};
pub use loam_refs::Branch;
pub use loam_types::{ErrorKind, ObjectId};
