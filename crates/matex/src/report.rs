//! Diagnostics and the channels they are reported on.

use colored::Colorize;
use std::io::Write;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    fn color(&self) -> colored::Color {
        match self {
            Severity::Error => colored::Color::BrightRed,
            Severity::Warning => colored::Color::Yellow,
        }
    }
}

/// A line-numbered message about the source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: in line {}: {}",
            self.severity.label(),
            self.line,
            self.message
        )
    }
}

/// Destination for diagnostics raised by the compiler.
pub trait Reporter {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in memory.
impl Reporter for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Reporter that writes errors and warnings to two separate streams.
///
/// Each diagnostic is written as a single line of the form
/// `error: in line <n>: <message>` or `warning: in line <n>: <message>`.
pub struct StreamReporter<E, W> {
    errors: E,
    warnings: W,
    color: bool,
}

impl<E: Write, W: Write> StreamReporter<E, W> {
    pub fn new(errors: E, warnings: W) -> Self {
        StreamReporter {
            errors,
            warnings,
            color: false,
        }
    }

    /// Sets whether the `error` and `warning` labels are coloured.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Returns the underlying error and warning streams.
    pub fn into_inner(self) -> (E, W) {
        (self.errors, self.warnings)
    }
}

impl<E: Write, W: Write> Reporter for StreamReporter<E, W> {
    fn report(&mut self, diagnostic: Diagnostic) {
        let sink: &mut dyn Write = match diagnostic.severity {
            Severity::Error => &mut self.errors,
            Severity::Warning => &mut self.warnings,
        };
        let _ = if self.color {
            let severity = diagnostic.severity;
            writeln!(
                sink,
                "{}: in line {}: {}",
                severity.label().color(severity.color()).bold(),
                diagnostic.line,
                diagnostic.message
            )
        } else {
            writeln!(sink, "{diagnostic}")
        };
    }
}
