//! Commit records and revision-range walking

use chrono::{DateTime, TimeZone, Utc};
use git2::{ErrorCode, Oid, Repository, RevparseMode, Sort};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::DiffError;

/// Default number of hash characters shown in reports
pub const SHORT_HASH_LEN: usize = 12;

fn change_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?m)[ ]*change-id: (.[a-z0-9]+)").expect("change-id pattern is valid")
    })
}

/// An immutable snapshot of a commit, detached from the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub hash: String,
    pub summary: String,
    pub message: String,
    pub author: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
}

impl CommitRecord {
    /// Build a record from a hash and a full commit message.
    ///
    /// The summary is the first line of the message.
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let summary = message.lines().next().unwrap_or("").to_string();

        Self {
            hash: hash.into(),
            summary,
            message,
            author: String::new(),
            author_email: String::new(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn with_author(
        mut self,
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        self.author = name.into();
        self.author_email = email.into();
        self.timestamp = timestamp;
        self
    }

    /// Change-Id footer of the message, lowercased
    pub fn change_id(&self) -> Option<String> {
        let message = self.message.to_lowercase();
        change_id_regex()
            .captures(&message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
    }

    /// Abbreviated hash followed by the quoted summary
    pub fn short(&self, hash_len: usize) -> String {
        let end = self
            .hash
            .char_indices()
            .nth(hash_len)
            .map_or(self.hash.len(), |(i, _)| i);
        format!("{} \"{}\"", &self.hash[..end], self.summary)
    }
}

/// Anything that can list the commits of a revision range
pub trait CommitSource {
    fn commits(&self, range: &str) -> Result<Vec<CommitRecord>, DiffError>;
}

/// Commit source backed by a git repository
pub struct GitCommitSource {
    repo: Repository,
}

impl GitCommitSource {
    /// Open the repository containing `path`, searching parent directories
    pub fn open(path: &Path) -> Result<Self, DiffError> {
        let repo = Repository::discover(path).map_err(|source| DiffError::RepositoryNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self { repo })
    }

    /// Working directory of the repository, if it is not bare
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Resolve a range into the commit ids to include and to exclude
    fn resolve(&self, range: &str) -> Result<(Vec<Oid>, Vec<Oid>), git2::Error> {
        let spec = self.repo.revparse(range)?;
        let from = peel_to_oid(spec.from())?;
        let to = peel_to_oid(spec.to())?;
        let mode = spec.mode();

        if mode.contains(RevparseMode::MERGE_BASE) {
            // A...B: everything reachable from either side but not from both
            let (Some(a), Some(b)) = (from, to) else {
                return Err(git2::Error::from_str("symmetric range needs two ends"));
            };
            let bases = match self.repo.merge_bases(a, b) {
                Ok(bases) => bases.iter().copied().collect(),
                // Unrelated histories share nothing to hide
                Err(e) if e.code() == ErrorCode::NotFound => Vec::new(),
                Err(e) => return Err(e),
            };
            return Ok((vec![a, b], bases));
        }

        if mode.contains(RevparseMode::RANGE) {
            let include = to.map(|oid| vec![oid]).unwrap_or_default();
            let exclude = from.map(|oid| vec![oid]).unwrap_or_default();
            return Ok((include, exclude));
        }

        Ok((from.into_iter().collect(), Vec::new()))
    }

    fn walk(&self, include: &[Oid], exclude: &[Oid]) -> Result<Vec<CommitRecord>, git2::Error> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        for oid in include {
            revwalk.push(*oid)?;
        }
        for oid in exclude {
            revwalk.hide(*oid)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;

            let author = commit.author();
            let timestamp = Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

            commits.push(
                CommitRecord::new(
                    oid.to_string(),
                    String::from_utf8_lossy(commit.message_bytes()),
                )
                .with_author(
                    String::from_utf8_lossy(author.name_bytes()),
                    String::from_utf8_lossy(author.email_bytes()),
                    timestamp,
                ),
            );
        }

        Ok(commits)
    }
}

fn peel_to_oid(obj: Option<&git2::Object<'_>>) -> Result<Option<Oid>, git2::Error> {
    obj.map(|o| o.peel_to_commit().map(|c| c.id())).transpose()
}

impl CommitSource for GitCommitSource {
    /// List commits of `range`, newest first.
    ///
    /// Accepts `A..B`, `A...B` and single revisions.
    fn commits(&self, range: &str) -> Result<Vec<CommitRecord>, DiffError> {
        let (include, exclude) = self.resolve(range).map_err(|source| DiffError::RangeNotFound {
            range: range.to_string(),
            source,
        })?;

        self.walk(&include, &exclude).map_err(|source| DiffError::Git {
            range: range.to_string(),
            source,
        })
    }
}
