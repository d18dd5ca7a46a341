//! branch-diff - compare commits across two git revision ranges
//!
//! A library for finding out which commits two branches share:
//! - Identical commits (same hash)
//! - Rewritten commits, matched by Change-Id footer or summary similarity
//! - Commits only present on one side

pub mod compare;
pub mod config;
pub mod error;
pub mod git;
pub mod matcher;
pub mod report;
pub mod reporter;

pub use compare::{default_comparators, merge, CommitComparator, ComparisonResult, MatchKind};
pub use config::Config;
pub use error::{ComparisonError, DiffError, MergeError, EXIT_CANCELLED};
pub use git::{CommitRecord, CommitSource, GitCommitSource};
pub use matcher::BranchMatcher;
pub use report::{MatchedPair, Report};
pub use reporter::{MemoryReporter, NullReporter, Reporter, TerminalReporter, Verbosity};
