//! Commit comparison
//!
//! Provides:
//! - Comparison strategies (hash, Change-Id, summary similarity)
//! - Weighted merging of their results
//! - Summary edit distance

pub mod distance;
pub mod result;
pub mod strategy;

pub use distance::{edit_distance, similarity};
pub use result::{merge, ComparisonResult, MatchKind, CONFIDENCE_MAX, WEIGHT_MAX};
pub use strategy::{
    default_comparators, ChangeIdComparator, CommitComparator, HashComparator, SummaryComparator,
};
