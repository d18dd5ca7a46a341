//! Comparison results and weighted merging

use std::fmt;
use std::sync::Arc;

use crate::error::MergeError;
use crate::git::CommitRecord;
use crate::reporter::{Reporter, Verbosity};

pub const CONFIDENCE_MAX: f64 = 1.0;
pub const WEIGHT_MAX: f64 = 1.0;

/// Outcome category of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Same commit in both ranges
    Full,
    /// Likely the same logical change, altered
    Partial,
    /// No match
    Fail,
}

/// Verdict of one comparator (or of a merge) for a commit pair
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub kind: MatchKind,
    /// Absent for commits only found in the second range
    pub source: Option<Arc<CommitRecord>>,
    pub destination: Option<Arc<CommitRecord>>,
    pub confidence: f64,
    pub weight: f64,
    /// Comparator that produced a positive result
    pub strategy: Option<&'static str>,
}

impl ComparisonResult {
    /// The same commit appears on both sides
    pub fn full(strategy: &'static str, weight: f64, commit: Arc<CommitRecord>) -> Self {
        Self {
            kind: MatchKind::Full,
            source: Some(Arc::clone(&commit)),
            destination: Some(commit),
            confidence: CONFIDENCE_MAX,
            weight,
            strategy: Some(strategy),
        }
    }

    pub fn partial(
        strategy: &'static str,
        weight: f64,
        source: Arc<CommitRecord>,
        destination: Arc<CommitRecord>,
        confidence: f64,
    ) -> Self {
        Self {
            kind: MatchKind::Partial,
            source: Some(source),
            destination: Some(destination),
            confidence: confidence.clamp(0.0, CONFIDENCE_MAX),
            weight,
            strategy: Some(strategy),
        }
    }

    pub fn fail(
        source: Option<Arc<CommitRecord>>,
        destination: Option<Arc<CommitRecord>>,
    ) -> Self {
        Self {
            kind: MatchKind::Fail,
            source,
            destination,
            confidence: 0.0,
            weight: 0.0,
            strategy: None,
        }
    }

    /// Ranking score used by [`merge`]
    pub fn score(&self) -> f64 {
        self.confidence * self.weight
    }

    pub fn is_positive(&self) -> bool {
        self.kind != MatchKind::Fail
    }

    pub fn is_certain(&self) -> bool {
        self.confidence >= CONFIDENCE_MAX
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MatchKind::Full => write!(f, "FullMatch"),
            MatchKind::Partial => write!(f, "PartialMatch ({:.3})", self.confidence),
            MatchKind::Fail => write!(f, "Fail"),
        }
    }
}

/// Pick the result with the highest `confidence × weight`.
///
/// Ties go to the earliest result in `results`.
pub fn merge(
    results: Vec<ComparisonResult>,
    reporter: &dyn Reporter,
) -> Result<ComparisonResult, MergeError> {
    if reporter.enabled(Verbosity::Debug) {
        trace_groups(&results, reporter);
    }

    let mut best: Option<ComparisonResult> = None;
    for result in results {
        let better = match &best {
            Some(current) => result.score() > current.score(),
            None => true,
        };
        if better {
            best = Some(result);
        }
    }

    let winner = best.ok_or(MergeError)?;
    reporter.debug(format_args!("-> winning result: {}", winner));
    Ok(winner)
}

fn trace_groups(results: &[ComparisonResult], reporter: &dyn Reporter) {
    // Score groups in order of first appearance
    let mut groups: Vec<(f64, Vec<String>)> = Vec::new();
    for result in results {
        let score = result.score();
        match groups.iter_mut().find(|(s, _)| *s == score) {
            Some((_, members)) => members.push(result.to_string()),
            None => groups.push((score, vec![result.to_string()])),
        }
    }

    reporter.debug(format_args!("Merging results"));
    for (score, members) in groups {
        reporter.debug(format_args!("  Result with {}: {}", score, members.join(" ")));
    }
}
