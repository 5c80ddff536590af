//! Branch management for Loam.
//!
//! Branches are named, mutable pointers to commits. The registry persists
//! them in `<meta>/branches.json` together with the name of the current
//! branch, and mirrors the current branch into `<meta>/HEAD` as
//! `ref: refs/branches/<name>`.
//!
//! # Architecture
//!
//! - A branch is created by copying another branch's head at that moment.
//!   It does not follow its base afterwards.
//! - Only `update_head` moves a branch.
//! - The current branch cannot be deleted.
//!
//! # Modules
//!
//! - [`error`] -- Error types for branch operations
//! - [`types`] -- [`Branch`] and the persisted document
//! - [`names`] -- Branch name validation
//! - [`registry`] -- The file-backed [`BranchRegistry`]

pub mod error;
pub mod names;
pub mod registry;
pub mod types;

pub use error::{RefError, RefResult};
pub use names::validate_branch_name;
pub use registry::BranchRegistry;
pub use types::Branch;
