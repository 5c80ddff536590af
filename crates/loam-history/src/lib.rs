//! Append-only commit history for Loam.
//!
//! Every commit made on any branch, including merge commits, gets one
//! [`HistoryRecord`] in `<meta>/history.json`. Records are never edited or
//! reordered in place; queries sort a copy.
//!
//! - [`HistoryRecord`] -- one row per commit
//! - [`HistoryLog`] -- append and query

pub mod error;
pub mod log;
pub mod record;

pub use error::{HistoryError, HistoryResult};
pub use log::HistoryLog;
pub use record::HistoryRecord;
