//! Staging index for Loam.
//!
//! Records which file versions will make up the next commit. The index is a
//! single JSON document (`<meta>/index`) mapping repo-relative paths to the
//! content hash of the staged version and the time it was staged. The staged
//! bytes themselves live in the content store.
//!
//! # Key Types
//!
//! - [`StagingIndex`] -- the persisted staging area
//! - [`StagingEntry`] -- one staged file version
//! - [`WorkdirStatus`] -- working-tree files classified against the index

pub mod entry;
pub mod error;
pub mod index;
pub mod status;

pub use entry::StagingEntry;
pub use error::{IndexError, IndexResult};
pub use index::StagingIndex;
pub use status::WorkdirStatus;
