//! Diff engine for Loam.
//!
//! Computes line-level differences between file versions and path-level
//! differences between commits or between a commit and the working tree.
//!
//! # Key Types
//!
//! - [`FileDiff`] / [`DiffHunk`] / [`DiffLine`] -- line diff of one file, or
//!   an explicit binary outcome
//! - [`TreeDiff`] / [`TreeChange`] -- added/deleted/modified paths between
//!   two `path -> hash` maps
//! - [`DiffEngine`] -- commit-to-commit and commit-to-working-tree diffs

pub mod blob_diff;
pub mod engine;
pub mod error;
pub mod tree_diff;

pub use blob_diff::{compare_files, DiffHunk, DiffLine, DiffOutcome, FileDiff};
pub use engine::{ChangeStatus, CommitDiff, DiffEngine, FileChange, WorktreeDiff};
pub use error::{DiffError, DiffResult};
pub use tree_diff::{compare_trees, TreeChange, TreeDiff};
