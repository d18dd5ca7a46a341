use branch_diff::{
    default_comparators, BranchMatcher, CommitSource, Config, DiffError, GitCommitSource,
    NullReporter,
};
use git2::{Oid, Repository, Signature, Time};
use std::sync::Arc;
use tempfile::tempdir;

/// Small helper that writes commits straight into the object database
struct TestRepo {
    repo: Repository,
    clock: i64,
}

impl TestRepo {
    fn init(path: &std::path::Path) -> Self {
        Self {
            repo: Repository::init(path).unwrap(),
            clock: 1_700_000_000,
        }
    }

    fn commit(&mut self, branch: &str, parent: Option<Oid>, file: &str, message: &str) -> Oid {
        let parents: Vec<Oid> = parent.into_iter().collect();
        self.commit_with_parents(branch, &parents, file, message)
    }

    /// Commit with any number of parents and point `branch` at it
    fn commit_with_parents(&mut self, branch: &str, parents: &[Oid], file: &str, message: &str) -> Oid {
        self.clock += 60;
        let sig = Signature::new("Tester", "tester@example.com", &Time::new(self.clock, 0)).unwrap();

        let blob = self.repo.blob(message.as_bytes()).unwrap();
        let mut builder = self.repo.treebuilder(None).unwrap();
        builder.insert(file, blob, 0o100644).unwrap();
        let tree = self.repo.find_tree(builder.write().unwrap()).unwrap();

        let parents: Vec<git2::Commit<'_>> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).unwrap())
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let oid = self
            .repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
        self.repo
            .reference(&format!("refs/heads/{}", branch), oid, true, message)
            .unwrap();
        oid
    }
}

/// base -> main: m1, m2, m3
///      -> feature: f1 (rebased m1, same Change-Id), f2 (m2 with a typo), f3
fn fixture() -> (tempfile::TempDir, TestRepo, Oid) {
    let dir = tempdir().unwrap();
    let mut repo = TestRepo::init(dir.path());

    let base = repo.commit("base", None, "README", "Initial commit");

    let m1 = repo.commit("main", Some(base), "a.txt", "Add parser\n\nChange-Id: I1111aaaa\n");
    let m2 = repo.commit("main", Some(m1), "b.txt", "Fix overflow in lexer");
    repo.commit("main", Some(m2), "c.txt", "Bump version to 2.0");

    let f1 = repo.commit(
        "feature",
        Some(base),
        "a2.txt",
        "Add the new parser\n\nChange-Id: I1111AAAA\n",
    );
    let f2 = repo.commit("feature", Some(f1), "b2.txt", "Fix overflow in lexr");
    repo.commit("feature", Some(f2), "d.txt", "Document command line flags");

    (dir, repo, base)
}

#[test]
fn test_range_walking() {
    let (dir, _repo, _base) = fixture();
    let source = GitCommitSource::open(dir.path()).unwrap();

    let main_only = source.commits("base..main").unwrap();
    let summaries: Vec<&str> = main_only.iter().map(|c| c.summary.as_str()).collect();
    assert_eq!(
        summaries,
        vec!["Bump version to 2.0", "Fix overflow in lexer", "Add parser"]
    );
    assert_eq!(main_only[0].author, "Tester");
    assert_eq!(main_only[0].author_email, "tester@example.com");

    let all_main = source.commits("main").unwrap();
    assert_eq!(all_main.len(), 4);

    let symmetric = source.commits("main...feature").unwrap();
    assert_eq!(symmetric.len(), 6);
}

#[test]
fn test_symmetric_range_hides_every_merge_base() {
    let dir = tempdir().unwrap();
    let mut repo = TestRepo::init(dir.path());

    // Criss-cross: x and y are both best common ancestors of left and right
    let root = repo.commit("root", None, "README", "root");
    let x = repo.commit("left", Some(root), "x.txt", "x");
    let y = repo.commit("right", Some(root), "y.txt", "y");
    let m1 = repo.commit_with_parents("left", &[x, y], "m1.txt", "m1");
    let m2 = repo.commit_with_parents("right", &[y, x], "m2.txt", "m2");
    repo.commit("left", Some(m1), "l2.txt", "l2");
    repo.commit("right", Some(m2), "r2.txt", "r2");

    let source = GitCommitSource::open(dir.path()).unwrap();
    let symmetric = source.commits("left...right").unwrap();
    let summaries: Vec<&str> = symmetric.iter().map(|c| c.summary.as_str()).collect();
    assert_eq!(summaries, vec!["r2", "l2", "m2", "m1"]);
}

#[test]
fn test_symmetric_range_of_unrelated_histories() {
    let dir = tempdir().unwrap();
    let mut repo = TestRepo::init(dir.path());

    let a1 = repo.commit("left", None, "a.txt", "left root");
    repo.commit("left", Some(a1), "a.txt", "left tip");
    repo.commit("right", None, "b.txt", "right root");

    let source = GitCommitSource::open(dir.path()).unwrap();
    let symmetric = source.commits("left...right").unwrap();
    let summaries: Vec<&str> = symmetric.iter().map(|c| c.summary.as_str()).collect();
    assert_eq!(summaries, vec!["right root", "left tip", "left root"]);
}

#[test]
fn test_unknown_range() {
    let (dir, _repo, _base) = fixture();
    let source = GitCommitSource::open(dir.path()).unwrap();

    let err = source.commits("base..does-not-exist").unwrap_err();
    assert!(matches!(err, DiffError::RangeNotFound { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_branch_diff_buckets() {
    let (dir, _repo, _base) = fixture();
    let source = GitCommitSource::open(dir.path()).unwrap();
    let config = Config::default();
    let matcher = BranchMatcher::new(default_comparators(&config.matching), Arc::new(NullReporter));

    let report = matcher.diff_ranges(&source, "base..main", "base..feature").unwrap();

    assert!(report.identical.is_empty());

    let mut matched: Vec<(&str, &str, &str)> = report
        .matched
        .iter()
        .map(|m| (m.source.summary.as_str(), m.destination.summary.as_str(), m.strategy))
        .collect();
    matched.sort_unstable();
    assert_eq!(
        matched,
        vec![
            ("Add parser", "Add the new parser", "change-id"),
            ("Fix overflow in lexer", "Fix overflow in lexr", "summary"),
        ]
    );

    let only_a: Vec<&str> = report.only_in_a.iter().map(|c| c.summary.as_str()).collect();
    assert_eq!(only_a, vec!["Bump version to 2.0"]);

    let only_b: Vec<&str> = report.only_in_b.iter().map(|c| c.summary.as_str()).collect();
    assert_eq!(only_b, vec!["Document command line flags"]);
}

#[test]
fn test_shared_history_is_identical() {
    let (dir, _repo, _base) = fixture();
    let source = GitCommitSource::open(dir.path()).unwrap();
    let matcher = BranchMatcher::new(
        default_comparators(&Config::default().matching),
        Arc::new(NullReporter),
    );

    // Both full ancestries contain the base commit
    let report = matcher.diff_ranges(&source, "main", "feature").unwrap();

    let identical: Vec<&str> = report.identical.iter().map(|c| c.summary.as_str()).collect();
    assert_eq!(identical, vec!["Initial commit"]);
    assert_eq!(report.matched.len(), 2);
}

#[test]
fn test_text_report() {
    colored::control::set_override(false);

    let (dir, _repo, _base) = fixture();
    let source = GitCommitSource::open(dir.path()).unwrap();
    let matcher = BranchMatcher::new(
        default_comparators(&Config::default().matching),
        Arc::new(NullReporter),
    );
    let report = matcher.diff_ranges(&source, "base..main", "base..feature").unwrap();

    let mut out = Vec::new();
    report.write_text(&mut out, "base..main", "base..feature", 12).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(!text.contains("Commits in base..main and base..feature:"));
    assert!(text.contains("Commits matching between base..main and base..feature:"));
    assert!(text.contains("Commits only in base..main:"));
    assert!(text.contains("Commits only in base..feature:"));
    assert!(text.contains("\"Document command line flags\""));
}
