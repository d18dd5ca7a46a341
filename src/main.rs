use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use branch_diff::{
    default_comparators, BranchMatcher, CommitRecord, CommitSource, Config, DiffError,
    GitCommitSource, Report, TerminalReporter, Verbosity,
};

#[derive(Parser)]
#[command(name = "branch-diff")]
#[command(about = "Compare the commits of two revision ranges")]
#[command(version)]
struct Cli {
    /// First revision range (e.g. main..feature)
    range_a: String,

    /// Second revision range
    range_b: String,

    /// Path to the repository (default: current directory)
    #[arg(short = 'C', long)]
    repo: Option<String>,

    /// Path to config file (default: branch-diff.toml in the repository)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase the verbosity (can be repeated twice)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Do not draw the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    if let Err(e) = run() {
        let code = e
            .downcast_ref::<DiffError>()
            .map_or(1, DiffError::exit_code);

        if matches!(e.downcast_ref::<DiffError>(), Some(DiffError::Cancelled)) {
            eprintln!("{}", "Cancelled".dimmed());
        } else {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let repo_path = match cli.repo.as_deref() {
        Some(raw) => {
            let expanded = shellexpand::full(raw)
                .with_context(|| format!("Could not expand repository path: {}", raw))?;
            PathBuf::from(expanded.as_ref())
        }
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let source = GitCommitSource::open(&repo_path)?;

    let config = Config::discover(cli.config.as_deref(), source.workdir())
        .context("Could not load configuration")?;

    // Both ranges must resolve before any comparison starts
    let commits_a = source.commits(&cli.range_a)?;
    let commits_b = source.commits(&cli.range_b)?;

    let reporter = Arc::new(TerminalReporter::new(
        Verbosity::from_occurrences(cli.verbose),
        config.output.progress && !cli.no_progress,
    ));
    let matcher = BranchMatcher::new(default_comparators(&config.matching), reporter);

    let report = compare_interruptible(matcher, commits_a, commits_b)?;

    match cli.format {
        OutputFormat::Text => {
            print_text(&report, &cli.range_a, &cli.range_b, config.output.hash_length)
        }
        OutputFormat::Json => {
            println!("{}", report.to_json(&cli.range_a, &cli.range_b)?);
            Ok(())
        }
    }
}

/// Run the matcher on a worker thread, aborting it on Ctrl+C
#[tokio::main]
async fn compare_interruptible(
    matcher: BranchMatcher,
    commits_a: Vec<CommitRecord>,
    commits_b: Vec<CommitRecord>,
) -> Result<Report> {
    let cancel: Arc<AtomicBool> = matcher.cancel_flag();
    let mut worker = tokio::task::spawn_blocking(move || matcher.diff(commits_a, commits_b));

    tokio::select! {
        joined = &mut worker => {
            Ok(joined.context("Comparison worker panicked")??)
        }
        _ = tokio::signal::ctrl_c() => {
            cancel.store(true, Ordering::SeqCst);
            // Let the worker observe the flag and tidy up its progress bar
            let _ = worker.await;
            Err(DiffError::Cancelled.into())
        }
    }
}

fn print_text(report: &Report, range_a: &str, range_b: &str, hash_len: usize) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report
        .write_text(&mut out, range_a, range_b, hash_len)
        .context("Failed to write report")
}
