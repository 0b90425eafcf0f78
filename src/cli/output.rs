//! Styled terminal output
//!
//! Results go to stdout and nothing else does: status messages, warnings and
//! errors are written to stderr so the result line can be piped.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a result line on stdout
    pub fn result(&self, message: &str) {
        println!("{message}");
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        // Errors are always shown, even in quiet mode
        eprintln!("{} {}", style("✖").red().for_stderr(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow().for_stderr(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!(
                "{} {}",
                style("ℹ").dim().for_stderr(),
                style(message).dim().for_stderr()
            );
        }
    }

    /// Print a verbose key-value pair
    pub fn verbose_key_value(&self, key: &str, value: &str) {
        if self.verbose && !self.quiet {
            eprintln!(
                "  {:<12} {}",
                style(key).dim().for_stderr(),
                style(value).bold().for_stderr()
            );
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
