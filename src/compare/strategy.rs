//! Commit comparison strategies
//!
//! Each comparator looks at one aspect of a commit pair and reports how
//! confident it is that both commits carry the same change. Comparators are
//! evaluated in registration order, cheapest and most certain first.

use std::sync::Arc;

use super::distance::{edit_distance, similarity};
use super::result::{ComparisonResult, CONFIDENCE_MAX, WEIGHT_MAX};
use crate::config::MatchingConfig;
use crate::error::ComparisonError;
use crate::git::CommitRecord;
use crate::reporter::{Reporter, Verbosity};

/// A single way of deciding whether two commits match
pub trait CommitComparator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reliability multiplier applied when results are merged
    fn weight(&self) -> f64;

    fn compare(
        &self,
        left: &Arc<CommitRecord>,
        right: &Arc<CommitRecord>,
        reporter: &dyn Reporter,
    ) -> Result<ComparisonResult, ComparisonError>;
}

/// Identical commit hashes
#[derive(Debug, Default, Clone, Copy)]
pub struct HashComparator;

impl CommitComparator for HashComparator {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn weight(&self) -> f64 {
        WEIGHT_MAX
    }

    fn compare(
        &self,
        left: &Arc<CommitRecord>,
        right: &Arc<CommitRecord>,
        reporter: &dyn Reporter,
    ) -> Result<ComparisonResult, ComparisonError> {
        if left.hash.is_empty() || right.hash.is_empty() {
            return Err(ComparisonError {
                strategy: self.name(),
                left: left.hash.clone(),
                right: right.hash.clone(),
                reason: "commit has no hash".to_string(),
            });
        }

        let same = left.hash == right.hash;
        reporter.debug(format_args!("{} == {}: {}", left.hash, right.hash, same));

        if same {
            Ok(ComparisonResult::full(self.name(), self.weight(), Arc::clone(left)))
        } else {
            Ok(ComparisonResult::fail(Some(Arc::clone(left)), Some(Arc::clone(right))))
        }
    }
}

/// Matching Change-Id footers
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeIdComparator;

impl CommitComparator for ChangeIdComparator {
    fn name(&self) -> &'static str {
        "change-id"
    }

    fn weight(&self) -> f64 {
        WEIGHT_MAX
    }

    fn compare(
        &self,
        left: &Arc<CommitRecord>,
        right: &Arc<CommitRecord>,
        reporter: &dyn Reporter,
    ) -> Result<ComparisonResult, ComparisonError> {
        let left_id = left.change_id();
        let right_id = right.change_id();
        let same = matches!((&left_id, &right_id), (Some(l), Some(r)) if l == r);
        reporter.debug(format_args!("{:?} == {:?}: {}", left_id, right_id, same));

        if same {
            Ok(ComparisonResult::partial(
                self.name(),
                self.weight(),
                Arc::clone(left),
                Arc::clone(right),
                CONFIDENCE_MAX,
            ))
        } else {
            Ok(ComparisonResult::fail(Some(Arc::clone(left)), Some(Arc::clone(right))))
        }
    }
}

/// Similar one-line summaries
#[derive(Debug, Clone, Copy)]
pub struct SummaryComparator {
    pub threshold: f64,
    pub weight: f64,
}

impl SummaryComparator {
    pub const DEFAULT_THRESHOLD: f64 = 0.7;
    pub const DEFAULT_WEIGHT: f64 = 0.4;
}

impl Default for SummaryComparator {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            weight: Self::DEFAULT_WEIGHT,
        }
    }
}

impl CommitComparator for SummaryComparator {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn compare(
        &self,
        left: &Arc<CommitRecord>,
        right: &Arc<CommitRecord>,
        reporter: &dyn Reporter,
    ) -> Result<ComparisonResult, ComparisonError> {
        let fail = || ComparisonResult::fail(Some(Arc::clone(left)), Some(Arc::clone(right)));

        let Some(score) = similarity(&left.summary, &right.summary) else {
            reporter.debug(format_args!("both summaries empty, nothing to compare"));
            return Ok(fail());
        };

        if reporter.enabled(Verbosity::Debug) {
            reporter.debug(format_args!(
                "distance \"{}\" / \"{}\": {} (similarity {:.3})",
                left.summary,
                right.summary,
                edit_distance(&left.summary, &right.summary),
                score
            ));
        }

        if score >= self.threshold {
            Ok(ComparisonResult::partial(
                self.name(),
                self.weight,
                Arc::clone(left),
                Arc::clone(right),
                score,
            ))
        } else {
            Ok(fail())
        }
    }
}

/// Build the ordered comparator list for a matching configuration
pub fn default_comparators(config: &MatchingConfig) -> Vec<Box<dyn CommitComparator>> {
    let mut comparators: Vec<Box<dyn CommitComparator>> = vec![Box::new(HashComparator)];

    if config.change_id {
        comparators.push(Box::new(ChangeIdComparator));
    }

    comparators.push(Box::new(SummaryComparator {
        threshold: config.summary_threshold,
        weight: config.summary_weight,
    }));

    comparators
}
