//! Stderr rendering of console notifications.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use provis_core::Notifier;

use crate::cli::ColorMode;
use crate::output::should_color;

/// Prints `✓ message` / `✗ message` lines on stderr.
///
/// Successes are suppressed by `--quiet`; failures always print.
#[derive(Debug, Clone, Copy)]
pub struct StderrNotifier {
    color: bool,
    quiet: bool,
}

impl StderrNotifier {
    pub fn new(mode: &ColorMode, quiet: bool) -> Self {
        Self {
            color: should_color(mode, &io::stderr()),
            quiet,
        }
    }
}

impl Notifier for StderrNotifier {
    fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut err = io::stderr().lock();
        if self.color {
            let _ = writeln!(err, "{} {message}", "✓".green());
        } else {
            let _ = writeln!(err, "✓ {message}");
        }
    }

    fn failure(&self, message: &str) {
        let mut err = io::stderr().lock();
        if self.color {
            let _ = writeln!(err, "{} {}", "✗".red().bold(), message.red());
        } else {
            let _ = writeln!(err, "✗ {message}");
        }
    }
}
