//! Commit storage for Loam.
//!
//! A commit freezes the staging snapshot into an immutable directory under
//! `<meta>/commits/<hash>/`: a `metadata.json` document plus a `tree/`
//! mirroring the committed paths. The commit hash covers the sorted
//! `(path, content hash)` pairs, the parent lineage, the author and the
//! message, so identical trees with identical metadata hash identically.
//!
//! # Key Types
//!
//! - [`Commit`] -- commit metadata as persisted
//! - [`CommitStore`] -- creation, lookup, restore
//! - Lineage queries on [`CommitStore`]: `ancestors`, `merge_base`,
//!   `is_ancestor`

pub mod commit;
pub mod error;
pub mod lineage;
pub mod store;

pub use commit::{Commit, FileRecord};
pub use error::{CommitError, CommitResult};
pub use store::CommitStore;
