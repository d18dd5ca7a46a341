use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;

use crate::compare::{ComparisonResult, MatchKind};
use crate::git::CommitRecord;

/// A commit of the first range paired with its likely counterpart
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub source: Arc<CommitRecord>,
    pub destination: Arc<CommitRecord>,
    pub confidence: f64,
    pub strategy: &'static str,
}

/// Outcome of a branch comparison, split into four buckets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Same commit in both ranges
    pub identical: Vec<Arc<CommitRecord>>,
    /// Probably the same change, rewritten
    pub matched: Vec<MatchedPair>,
    pub only_in_a: Vec<Arc<CommitRecord>>,
    pub only_in_b: Vec<Arc<CommitRecord>>,
}

impl Report {
    /// Sort merged results into buckets, keeping their order
    pub fn classify(results: Vec<ComparisonResult>) -> Self {
        let mut report = Self::default();

        for result in results {
            match (result.kind, result.source, result.destination) {
                (MatchKind::Full, Some(source), _) => report.identical.push(source),
                (MatchKind::Partial, Some(source), Some(destination)) => {
                    report.matched.push(MatchedPair {
                        source,
                        destination,
                        confidence: result.confidence,
                        strategy: result.strategy.unwrap_or("unknown"),
                    });
                }
                (MatchKind::Fail, Some(source), _) => report.only_in_a.push(source),
                (MatchKind::Fail, None, Some(destination)) => report.only_in_b.push(destination),
                // Positive results always carry both commits
                _ => {}
            }
        }

        report
    }

    pub fn is_empty(&self) -> bool {
        self.identical.is_empty()
            && self.matched.is_empty()
            && self.only_in_a.is_empty()
            && self.only_in_b.is_empty()
    }

    /// Human readable report. Empty sections are left out.
    pub fn write_text<W: Write>(
        &self,
        out: &mut W,
        range_a: &str,
        range_b: &str,
        hash_len: usize,
    ) -> io::Result<()> {
        write_section(
            out,
            &format!("Commits in {} and {}:", range_a, range_b),
            &self.identical,
            |c| format!("- {}", c.short(hash_len)),
        )?;

        write_section(
            out,
            &format!("Commits matching between {} and {}:", range_a, range_b),
            &self.matched,
            |m| {
                format!(
                    "- {} and {} ({})",
                    m.source.short(hash_len),
                    m.destination.short(hash_len),
                    format!("{:.3}", m.confidence).yellow()
                )
            },
        )?;

        write_section(
            out,
            &format!("Commits only in {}:", range_a),
            &self.only_in_a,
            |c| format!("- {}", c.short(hash_len)),
        )?;

        write_section(
            out,
            &format!("Commits only in {}:", range_b),
            &self.only_in_b,
            |c| format!("- {}", c.short(hash_len)),
        )
    }

    pub fn to_json(&self, range_a: &str, range_b: &str) -> serde_json::Result<String> {
        let view = JsonReport {
            range_a,
            range_b,
            identical: self.identical.iter().map(|c| &**c).collect(),
            matched: self
                .matched
                .iter()
                .map(|m| JsonMatch {
                    source: &m.source,
                    destination: &m.destination,
                    confidence: m.confidence,
                    strategy: m.strategy,
                })
                .collect(),
            only_in_a: self.only_in_a.iter().map(|c| &**c).collect(),
            only_in_b: self.only_in_b.iter().map(|c| &**c).collect(),
        };

        serde_json::to_string_pretty(&view)
    }
}

fn write_section<W: Write, T>(
    out: &mut W,
    title: &str,
    items: &[T],
    line: impl Fn(&T) -> String,
) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }

    writeln!(out, "{}", title.bold())?;
    for item in items {
        writeln!(out, "{}", line(item))?;
    }
    writeln!(out)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    range_a: &'a str,
    range_b: &'a str,
    identical: Vec<&'a CommitRecord>,
    matched: Vec<JsonMatch<'a>>,
    only_in_a: Vec<&'a CommitRecord>,
    only_in_b: Vec<&'a CommitRecord>,
}

#[derive(Serialize)]
struct JsonMatch<'a> {
    source: &'a CommitRecord,
    destination: &'a CommitRecord,
    confidence: f64,
    strategy: &'a str,
}
