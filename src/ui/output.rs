//! Output abstraction layer for consistent CLI output
//!
//! Provides automatic detection of output mode (interactive, CI, plain)
//! and centralized print functions that respect the current mode.

use std::io::{self, IsTerminal};

use colored::Colorize;

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Interactive terminal with colors and unicode
    Interactive,
    /// CI environment - plain text, no colors
    CI,
    /// Piped output - plain text, no colors
    Plain,
}

impl OutputMode {
    /// Detect the appropriate output mode based on environment
    pub fn detect() -> Self {
        if is_ci::cached() {
            return OutputMode::CI;
        }

        if io::stdout().is_terminal() {
            OutputMode::Interactive
        } else {
            OutputMode::Plain
        }
    }

    /// Whether colors should be used
    pub fn colors_enabled(&self) -> bool {
        matches!(self, OutputMode::Interactive)
    }

    /// Whether unicode symbols should be used
    pub fn unicode_enabled(&self) -> bool {
        matches!(self, OutputMode::Interactive)
    }

    /// Whether spinners should be shown
    pub fn progress_enabled(&self) -> bool {
        matches!(self, OutputMode::Interactive)
    }

    /// Whether prompts can be shown (stdin and stdout are both terminals)
    pub fn prompts_enabled(&self) -> bool {
        self.progress_enabled() && io::stdin().is_terminal()
    }
}

impl Default for OutputMode {
    fn default() -> Self {
        Self::detect()
    }
}

/// Centralized printer that respects output mode
#[derive(Debug, Clone)]
pub struct Printer {
    mode: OutputMode,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    /// Create a new printer with auto-detected mode
    pub fn new() -> Self {
        Self {
            mode: OutputMode::detect(),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn newline(&self) {
        println!();
    }

    pub fn separator(&self) {
        println!("{}", self.rule());
    }

    fn rule(&self) -> String {
        if self.mode.unicode_enabled() {
            "━".repeat(60)
        } else {
            "-".repeat(60)
        }
    }

    /// Print a header with emphasis
    pub fn header(&self, text: &str) {
        if self.mode.colors_enabled() {
            println!("{}", text.cyan().bold());
        } else {
            println!("{}", text);
        }
    }

    /// Print a section title
    pub fn section(&self, title: &str) {
        if self.mode.colors_enabled() {
            println!("{}", title.yellow());
        } else {
            println!("== {} ==", title);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.status_line("✓", "[OK]", message, Status::Success));
    }

    /// Print an error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.status_line("✗", "[ERROR]", message, Status::Error));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.status_line("⚠", "[WARN]", message, Status::Warning));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.status_line("ℹ", "[INFO]", message, Status::Info));
    }

    fn status_line(&self, symbol: &str, plain: &str, message: &str, status: Status) -> String {
        let symbol = if self.mode.unicode_enabled() {
            symbol
        } else {
            plain
        };
        if !self.mode.colors_enabled() {
            return format!("{} {}", symbol, message);
        }
        match status {
            Status::Success => format!("{} {}", symbol.green(), message.green()),
            Status::Error => format!("{} {}", symbol.red(), message.red()),
            Status::Warning => format!("{} {}", symbol.yellow(), message.yellow()),
            Status::Info => format!("{} {}", symbol.cyan(), message),
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.mode.colors_enabled() {
            println!("  {}: {}", key.cyan(), value);
        } else {
            println!("  {}: {}", key, value);
        }
    }

    /// Print a numbered list item, starting from 1
    pub fn numbered(&self, index: usize, message: &str) {
        let number = format!("{}.", index + 1);
        if self.mode.colors_enabled() {
            println!("  {} {}", number.cyan().bold(), message);
        } else {
            println!("  {} {}", number, message);
        }
    }

    /// Print a paragraph wrapped to the terminal column limit
    pub fn paragraph(&self, text: &str) {
        println!("{}", textwrap::fill(text, 80));
    }

    /// Print dimmed/secondary text
    pub fn dimmed(&self, message: &str) {
        if self.mode.colors_enabled() {
            println!("{}", message.dimmed());
        } else {
            println!("{}", message);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Status {
    Success,
    Error,
    Warning,
    Info,
}
