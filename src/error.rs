//! Error types for branch comparison

use std::path::PathBuf;
use thiserror::Error;

/// Exit status used when the user interrupts a comparison
pub const EXIT_CANCELLED: i32 = 130;

/// Errors that abort a comparison run
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("no git repository found at {}", path.display())]
    RepositoryNotFound {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("revision range '{range}' could not be resolved")]
    RangeNotFound {
        range: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to walk commits of '{range}'")]
    Git {
        range: String,
        #[source]
        source: git2::Error,
    },

    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("comparison cancelled")]
    Cancelled,

    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl DiffError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DiffError::Cancelled => EXIT_CANCELLED,
            _ => 1,
        }
    }
}

/// Returned when merging an empty set of comparison results
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot merge an empty set of comparison results")]
pub struct MergeError;

/// A single comparator failed on a single commit pair.
///
/// The matcher downgrades this to a failed match for that pair.
#[derive(Debug, Error)]
#[error("{strategy} could not compare {left} with {right}: {reason}")]
pub struct ComparisonError {
    pub strategy: &'static str,
    pub left: String,
    pub right: String,
    pub reason: String,
}
