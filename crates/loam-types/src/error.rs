use std::fmt;

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Coarse classification shared by every component error.
///
/// Component crates keep their own detailed error enums; `kind()` on each of
/// them maps onto this taxonomy so that a boundary layer (the CLI) can pick a
/// message style and exit code without matching on every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid input: a bad branch name, a duplicate, a path outside the repo.
    Validation,
    /// A commit, branch, object, path, or repository root does not exist.
    NotFound,
    /// The operation is not valid in the current state (empty staging area,
    /// corrupt metadata document, stale merge).
    State,
    /// Unresolved merge conflicts block the operation.
    Conflict,
    /// Underlying filesystem failure.
    Io,
}

impl ErrorKind {
    /// Process exit code used by the command-line front end.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Io => 1,
            Self::Validation => 2,
            Self::NotFound => 3,
            Self::State => 4,
            Self::Conflict => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation error"),
            Self::NotFound => write!(f, "not found"),
            Self::State => write!(f, "state error"),
            Self::Conflict => write!(f, "conflict"),
            Self::Io => write!(f, "i/o error"),
        }
    }
}
