//! All-pairs commit matching between two revision ranges

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::compare::{merge, CommitComparator, ComparisonResult};
use crate::error::DiffError;
use crate::git::{CommitRecord, CommitSource, SHORT_HASH_LEN};
use crate::report::Report;
use crate::reporter::Reporter;

/// Compares every commit of one range against every commit of another
pub struct BranchMatcher {
    comparators: Vec<Box<dyn CommitComparator>>,
    reporter: Arc<dyn Reporter>,
    cancel: Arc<AtomicBool>,
}

impl BranchMatcher {
    pub fn new(comparators: Vec<Box<dyn CommitComparator>>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            comparators,
            reporter,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a flag that aborts the run once set
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Fetch both ranges from `source` and match them
    pub fn diff_ranges(
        &self,
        source: &dyn CommitSource,
        range_a: &str,
        range_b: &str,
    ) -> Result<Report, DiffError> {
        let commits_a = source.commits(range_a)?;
        let commits_b = source.commits(range_b)?;
        self.diff(commits_a, commits_b)
    }

    /// Match two commit lists and classify the outcome.
    ///
    /// Returns [`DiffError::Cancelled`] without a report if the cancel flag
    /// is raised mid-run.
    pub fn diff(
        &self,
        commits_a: Vec<CommitRecord>,
        commits_b: Vec<CommitRecord>,
    ) -> Result<Report, DiffError> {
        let commits_a: Vec<Arc<CommitRecord>> = commits_a.into_iter().map(Arc::new).collect();
        let commits_b: Vec<Arc<CommitRecord>> = commits_b.into_iter().map(Arc::new).collect();

        self.reporter.progress_start(commits_a.len());
        let scanned = self.scan(&commits_a, &commits_b);
        self.reporter.progress_finish();

        let (mut results, claimed) = scanned?;

        for (commit, _) in commits_b.iter().zip(&claimed).filter(|(_, seen)| !**seen) {
            self.reporter.info(format_args!(
                "{} not previously seen",
                commit.short(SHORT_HASH_LEN)
            ));
            results.push(ComparisonResult::fail(None, Some(Arc::clone(commit))));
        }

        Ok(Report::classify(results))
    }

    /// Best result per commit of `commits_a`, plus which commits of
    /// `commits_b` were matched by anything
    fn scan(
        &self,
        commits_a: &[Arc<CommitRecord>],
        commits_b: &[Arc<CommitRecord>],
    ) -> Result<(Vec<ComparisonResult>, Vec<bool>), DiffError> {
        let mut results = Vec::with_capacity(commits_a.len());
        let mut claimed = vec![false; commits_b.len()];

        for commit_a in commits_a {
            self.check_cancelled()?;
            self.reporter
                .info(format_args!("Checking {}", commit_a.short(SHORT_HASH_LEN)));

            let mut candidates = Vec::with_capacity(commits_b.len());
            for (index, commit_b) in commits_b.iter().enumerate() {
                self.check_cancelled()?;
                self.reporter
                    .info(format_args!("  against {}", commit_b.short(SHORT_HASH_LEN)));

                let result = self.compare_pair(commit_a, commit_b)?;
                self.reporter.info(format_args!("    {}", result));
                if result.is_positive() {
                    claimed[index] = true;
                }
                candidates.push(result);
            }

            let best = if candidates.is_empty() {
                ComparisonResult::fail(Some(Arc::clone(commit_a)), None)
            } else {
                merge(candidates, self.reporter.as_ref())?
            };
            self.reporter.info(format_args!("    -> {}", best));
            results.push(best);
            self.reporter.progress_advance();
        }

        Ok((results, claimed))
    }

    /// Run the comparators on one pair and merge their verdicts.
    ///
    /// Stops at the first comparator that is fully confident. A comparator
    /// error turns the whole pair into a failed match.
    pub fn compare_pair(
        &self,
        commit_a: &Arc<CommitRecord>,
        commit_b: &Arc<CommitRecord>,
    ) -> Result<ComparisonResult, DiffError> {
        let reporter = self.reporter.as_ref();
        let mut results = Vec::with_capacity(self.comparators.len());

        for comparator in &self.comparators {
            let result = match comparator.compare(commit_a, commit_b, reporter) {
                Ok(result) => result,
                Err(e) => {
                    reporter.warn(format_args!("{}", e));
                    return Ok(ComparisonResult::fail(
                        Some(Arc::clone(commit_a)),
                        Some(Arc::clone(commit_b)),
                    ));
                }
            };
            reporter.info(format_args!("      {}: {}", comparator.name(), result));

            let certain = result.is_certain();
            results.push(result);
            if certain {
                reporter.info(format_args!(
                    "      Found maximum confidence result, skipping other comparators"
                ));
                break;
            }
        }

        if results.is_empty() {
            return Ok(ComparisonResult::fail(
                Some(Arc::clone(commit_a)),
                Some(Arc::clone(commit_b)),
            ));
        }

        Ok(merge(results, reporter)?)
    }

    fn check_cancelled(&self) -> Result<(), DiffError> {
        if self.cancel.load(Ordering::SeqCst) {
            Err(DiffError::Cancelled)
        } else {
            Ok(())
        }
    }
}
