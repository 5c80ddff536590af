//! Merge engine for Loam.
//!
//! Merges one branch into another with a three-way comparison against the
//! best common ancestor of their heads. Clean merges produce a merge commit
//! right away; conflicting merges are persisted under `<meta>/merges/` until
//! every conflicting path has been given a resolution.
//!
//! # Key Types
//!
//! - [`MergeEngine`] -- runs merges and resolutions
//! - [`MergeOutcome`] / [`ResolveOutcome`] -- tagged results
//! - [`Conflict`] / [`ConflictKind`] -- one conflicting path
//! - [`MergeState`] -- the persisted pending merge
//! - [`three_way`] -- the pure per-path classification

pub mod conflict;
pub mod engine;
pub mod error;
pub mod state;
pub mod three_way;
mod worktree;

pub use conflict::{Conflict, ConflictKind};
pub use engine::{MergeEngine, MergeOutcome, MergePhase, MergeSummary, ResolveOutcome};
pub use error::{MergeError, MergeResult};
pub use state::MergeState;
pub use three_way::{three_way, MergeChange, ThreeWay};
