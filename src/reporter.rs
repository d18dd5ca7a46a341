//! Reporting of comparison progress and traces
//!
//! The matcher never prints directly. It is handed a [`Reporter`] and
//! emits warnings, traces and progress through it.

use colored::Colorize;
use crossterm::tty::IsTty;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;

/// How much the reporter shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Warnings only
    #[default]
    Warn,
    /// One line per comparison
    Info,
    /// Every comparator's raw inputs and merge groups
    Debug,
}

impl Verbosity {
    /// Map a repeated `-v` flag count to a level
    pub fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Verbosity::Warn,
            1 => Verbosity::Info,
            _ => Verbosity::Debug,
        }
    }
}

/// Observer for a comparison run
pub trait Reporter: Send + Sync {
    fn verbosity(&self) -> Verbosity;

    /// Emit a message at `level`. Only called when the level is enabled.
    fn emit(&self, level: Verbosity, message: fmt::Arguments<'_>);

    fn enabled(&self, level: Verbosity) -> bool {
        level <= self.verbosity()
    }

    fn warn(&self, message: fmt::Arguments<'_>) {
        self.emit(Verbosity::Warn, message);
    }

    fn info(&self, message: fmt::Arguments<'_>) {
        if self.enabled(Verbosity::Info) {
            self.emit(Verbosity::Info, message);
        }
    }

    fn debug(&self, message: fmt::Arguments<'_>) {
        if self.enabled(Verbosity::Debug) {
            self.emit(Verbosity::Debug, message);
        }
    }

    fn progress_start(&self, _total: usize) {}

    fn progress_advance(&self) {}

    fn progress_finish(&self) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn verbosity(&self) -> Verbosity {
        Verbosity::Warn
    }

    fn emit(&self, _level: Verbosity, _message: fmt::Arguments<'_>) {}
}

/// Keeps messages and progress events in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    verbosity: Verbosity,
    lines: Mutex<Vec<(Verbosity, String)>>,
    progress: Mutex<ProgressEvents>,
}

/// Progress calls seen by a [`MemoryReporter`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProgressEvents {
    pub total: Option<usize>,
    pub advanced: usize,
    pub finished: bool,
}

impl MemoryReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            ..Self::default()
        }
    }

    pub fn lines(&self) -> Vec<(Verbosity, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn messages_at(&self, level: Verbosity) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn progress(&self) -> ProgressEvents {
        self.progress.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn emit(&self, level: Verbosity, message: fmt::Arguments<'_>) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }

    fn progress_start(&self, total: usize) {
        if let Ok(mut p) = self.progress.lock() {
            *p = ProgressEvents {
                total: Some(total),
                ..ProgressEvents::default()
            };
        }
    }

    fn progress_advance(&self) {
        if let Ok(mut p) = self.progress.lock() {
            p.advanced += 1;
        }
    }

    fn progress_finish(&self) {
        if let Ok(mut p) = self.progress.lock() {
            p.finished = true;
        }
    }
}

#[derive(Debug)]
struct ProgressBar {
    total: usize,
    current: usize,
}

impl ProgressBar {
    fn render(&self, width: usize) -> String {
        let label = "Comparing";
        let counter = format!("{}/{}", self.current, self.total);
        // label + space + brackets + space + counter
        let bar_width = width
            .saturating_sub(label.len() + counter.len() + 4)
            .clamp(10, 40);
        let filled = if self.total == 0 {
            bar_width
        } else {
            bar_width * self.current.min(self.total) / self.total
        };

        format!(
            "{} |{}{}| {}",
            label,
            "█".repeat(filled),
            " ".repeat(bar_width - filled),
            counter
        )
    }
}

/// Writes coloured traces and a progress bar to stderr
pub struct TerminalReporter {
    verbosity: Verbosity,
    show_progress: bool,
    progress: Mutex<Option<ProgressBar>>,
}

impl TerminalReporter {
    /// The progress bar is only drawn when `show_progress` is set and
    /// stderr is a terminal.
    pub fn new(verbosity: Verbosity, show_progress: bool) -> Self {
        Self {
            verbosity,
            show_progress: show_progress && std::io::stderr().is_tty(),
            progress: Mutex::new(None),
        }
    }

    fn draw(&self, bar: &ProgressBar) {
        let width = crossterm::terminal::size()
            .map(|(cols, _)| cols as usize)
            .unwrap_or(80);
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r\x1b[2K{}", bar.render(width));
        let _ = stderr.flush();
    }

    fn clear_line(&self) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r\x1b[2K");
        let _ = stderr.flush();
    }
}

impl Reporter for TerminalReporter {
    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn emit(&self, level: Verbosity, message: fmt::Arguments<'_>) {
        let guard = self.progress.lock().ok();
        let active = guard.as_deref().and_then(Option::as_ref);
        if active.is_some() {
            self.clear_line();
        }

        match level {
            Verbosity::Warn => eprintln!("{} {}", "⚠".yellow(), message),
            Verbosity::Info => eprintln!("{}", message),
            Verbosity::Debug => eprintln!("{}", message.to_string().dimmed()),
        }

        if let Some(bar) = active {
            self.draw(bar);
        }
    }

    fn progress_start(&self, total: usize) {
        if !self.show_progress {
            return;
        }
        if let Ok(mut progress) = self.progress.lock() {
            let bar = ProgressBar { total, current: 0 };
            self.draw(&bar);
            *progress = Some(bar);
        }
    }

    fn progress_advance(&self) {
        if let Ok(mut progress) = self.progress.lock() {
            if let Some(bar) = progress.as_mut() {
                bar.current += 1;
                self.draw(bar);
            }
        }
    }

    fn progress_finish(&self) {
        if let Ok(mut progress) = self.progress.lock() {
            if progress.take().is_some() {
                self.clear_line();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_occurrences() {
        assert_eq!(Verbosity::from_occurrences(0), Verbosity::Warn);
        assert_eq!(Verbosity::from_occurrences(1), Verbosity::Info);
        assert_eq!(Verbosity::from_occurrences(2), Verbosity::Debug);
        assert_eq!(Verbosity::from_occurrences(7), Verbosity::Debug);
    }

    #[test]
    fn test_memory_reporter_filters_by_level() {
        let reporter = MemoryReporter::new(Verbosity::Info);
        reporter.warn(format_args!("careful"));
        reporter.info(format_args!("checking {}", 1));
        reporter.debug(format_args!("hidden"));

        assert_eq!(
            reporter.lines(),
            vec![
                (Verbosity::Warn, "careful".to_string()),
                (Verbosity::Info, "checking 1".to_string()),
            ]
        );
    }

    #[test]
    fn test_progress_bar_render() {
        let bar = ProgressBar { total: 4, current: 2 };
        let line = bar.render(80);
        assert!(line.starts_with("Comparing |"));
        assert!(line.ends_with("| 2/4"));
        assert_eq!(line.matches('█').count(), 20);

        let empty = ProgressBar { total: 0, current: 0 };
        assert!(empty.render(20).ends_with("| 0/0"));
    }
}
