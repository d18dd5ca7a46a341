//! Git operations module
//!
//! Provides:
//! - Commit records detached from the repository
//! - Revision range walking (`A..B`, `A...B`, single revisions)

pub mod commits;

pub use commits::{CommitRecord, CommitSource, GitCommitSource, SHORT_HASH_LEN};
