//! Collecting and pretty-printing diagnostics.
//!
//! Every diagnostic carries a 1-based source line number (0 if unknown).
//! Warnings never fail a run; errors accumulate across both passes and are
//! only consulted for the final exit status once assembly is done, so a
//! single invocation surfaces as many problems as possible.

use colored::Colorize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Severity of a single diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    /// 1-based source line, 0 if not tied to a specific line.
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    /// Plain `<level> on line <N>: <message>` rendering, used for the log
    /// file and for comparisons in tests.
    pub fn plain(&self) -> String {
        if self.line == 0 {
            format!("{}: {}", self.level.label(), self.message)
        } else {
            format!("{} on line {}: {}", self.level.label(), self.line, self.message)
        }
    }

    fn colorized(&self) -> String {
        let tag = match self.level {
            Level::Info => self.level.label().normal(),
            Level::Warning => self.level.label().yellow().bold(),
            Level::Error => self.level.label().red().bold(),
        };
        if self.line == 0 {
            format!("{}: {}", tag, self.message)
        } else {
            format!("{} on line {}: {}", tag, self.line, self.message)
        }
    }
}

/// Accumulates diagnostics for one `assemble()` run and decides overall
/// success. Always prints to stderr; optionally mirrors every line
/// (uncolored) to a log file as well.
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    log_file: Option<File>,
}

impl Diagnostics {
    /// Create a sink that only prints to stderr.
    pub fn new() -> Diagnostics {
        Diagnostics { entries: Vec::new(), log_file: None }
    }

    /// Create a sink that also mirrors every diagnostic to `path`.
    pub fn with_log_file(path: &Path) -> io::Result<Diagnostics> {
        let log_file = File::create(path)?;
        Ok(Diagnostics { entries: Vec::new(), log_file: Some(log_file) })
    }

    fn push(&mut self, level: Level, line: usize, message: String) {
        let diagnostic = Diagnostic { level, line, message };
        eprintln!("{}", diagnostic.colorized());
        if let Some(log_file) = self.log_file.as_mut() {
            let _ = writeln!(log_file, "{}", diagnostic.plain());
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, line: usize, message: impl Into<String>) {
        self.push(Level::Info, line, message.into());
    }

    pub fn warning(&mut self, line: usize, message: impl Into<String>) {
        self.push(Level::Warning, line, message.into());
    }

    pub fn error(&mut self, line: usize, message: impl Into<String>) {
        self.push(Level::Error, line, message.into());
    }

    /// Whether any error-level diagnostic has been recorded so far.
    pub fn had_errors(&self) -> bool {
        self.entries.iter().any(|d| d.level == Level::Error)
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|d| d.level == Level::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries.iter().filter(|d| d.level == Level::Warning).count()
    }

    /// All diagnostics recorded so far, in emission order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// `N error(s), M warning(s)` summary line, printed by the CLI front-end
    /// once both passes are done.
    pub fn summary(&self) -> String {
        format!(
            "{} error(s), {} warning(s)",
            self.error_count(),
            self.warning_count()
        )
    }
}

impl Default for Diagnostics {
    fn default() -> Diagnostics {
        Diagnostics::new()
    }
}
