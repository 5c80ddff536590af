//! Foundation types for Loam.
//!
//! This crate provides the identifiers and shared vocabulary used throughout
//! the Loam workspace. Every other Loam crate depends on `loam-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (SHA-256 of the raw bytes)
//! - [`ErrorKind`] -- The error taxonomy every component error maps onto

pub mod error;
pub mod object;

pub use error::{ErrorKind, TypeError};
pub use object::ObjectId;
