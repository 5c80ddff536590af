//! Content-addressed object storage for Loam.
//!
//! This crate implements the hash-keyed blob store behind the staging index
//! (`.loam/objects/`). Every file version is stored as an immutable object
//! identified by the SHA-256 of its bytes, so the same content staged twice,
//! or on two branches, is stored once.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`FsObjectStore`] -- fan-out directory store used by real repositories
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Persistence Primitives
//!
//! - [`document`] -- the atomic JSON document primitive (temp file + fsync +
//!   rename) that every Loam component uses to persist state
//! - [`RepoLock`] -- advisory exclusive lock serializing mutating operations
//!   across processes
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Write-then-link: write the object fully, then make it visible by rename.
//! 3. Reads verify the content hash; a mismatch is reported, never masked.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod document;
pub mod error;
pub mod fs;
pub mod lock;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use lock::RepoLock;
pub use memory::InMemoryObjectStore;
pub use traits::ObjectStore;
