//! Ignore patterns and working-tree walking for Loam.
//!
//! Patterns live in `<root>/.loamignore`, one glob per line. Blank lines and
//! lines starting with `#` are skipped. A pattern ending in `/` only matches
//! directories. `*` matches any run of characters, including `/`, and every
//! pattern is anchored to the full repo-relative path.
//!
//! The walker in [`walk`] prunes ignored directories before descending and
//! never enters the repository's metadata directory.

pub mod error;
pub mod matcher;
pub mod walk;

pub use error::{IgnoreError, IgnoreResult};
pub use matcher::IgnoreMatcher;
pub use walk::relative_path;
