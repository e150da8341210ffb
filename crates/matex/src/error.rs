//! Errors raised while compiling MaTeX source.

use crate::directive::Directive;
use crate::report::{Diagnostic, Severity};
use crate::spellcheck;

/// Kind of error encountered when compiling MaTeX source.
///
/// Every kind is fatal: the first error aborts the compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source does not start with a `VERSION` line.
    ///
    /// The field holds the head keyword found instead,
    ///     or [`None`] if the source contains no directives at all.
    MissingVersion { found: Option<String> },

    /// The `VERSION` line names a version that is not supported.
    UnsupportedVersion(i64),

    /// A field that must be an integer is not one.
    MalformedInteger { field: &'static str, got: String },

    /// A parameter count is negative.
    NegativeParameterCount(i64),

    /// A keyword that the directive requires does not appear in the line.
    MissingKeyword {
        directive: &'static str,
        keyword: &'static str,
    },

    /// A `DEFAULT` value was given to a command or environment with no parameters.
    DefaultWithoutParameters { directive: &'static str },

    /// An embedded expression is opened with `%` but never closed.
    ///
    /// The column is the 0-based character index of the opening `%` in the tail.
    UnmatchedDelimiter { column: usize },

    /// An embedded expression could not be evaluated.
    InvalidExpression { expression: String, reason: String },

    /// The head keyword of a line is not a known directive.
    UnknownDirective { tag: String },

    /// A `FOR` block runs to the end of the source without an `END`.
    MissingEnd,

    /// `FOR` blocks are nested too deeply.
    NestingTooDeep { limit: usize },

    /// Reading or seeking the source failed.
    Io(String),
}

impl ErrorKind {
    pub fn message(&self) -> String {
        use ErrorKind::*;
        match self {
            MissingVersion { found: None } => "version not specified".into(),
            MissingVersion { found: Some(_) } => {
                "version not specified at the head of file".into()
            }
            UnsupportedVersion(version) => format!["unknown version {version}"],
            MalformedInteger { field, got } => {
                format!["{field} should be an integer (got \"{got}\" instead)"]
            }
            NegativeParameterCount(n) => {
                format!["parameter count should be non-negative (got {n} instead)"]
            }
            MissingKeyword { keyword, .. } => format!["`{keyword}` keyword expected"],
            DefaultWithoutParameters { directive } => {
                let noun = match *directive {
                    "ENV" => "an environment",
                    _ => "a command",
                };
                format!["cannot set default value for {noun} without parameters"]
            }
            UnmatchedDelimiter { column } => format!["unmatched `%` at column {column}"],
            InvalidExpression { expression, .. } => format!["invalid expression `{expression}`"],
            UnknownDirective { tag } => format!["unexpected tag `{tag}`"],
            MissingEnd => "`FOR` block is not closed by an `END`".into(),
            NestingTooDeep { limit } => {
                format!["`FOR` blocks are nested more than {limit} levels deep"]
            }
            Io(err) => format!["failed to read the source: {err}"],
        }
    }

    /// Short text attached to the source line in rich reports.
    pub fn label(&self) -> String {
        use ErrorKind::*;
        match self {
            MissingVersion { found: Some(found) } => {
                format!["this `{found}` directive appears before any `VERSION` line"]
            }
            MissingVersion { found: None } | Io(_) => "the source ends here".into(),
            UnsupportedVersion(_) => "the version is declared here".into(),
            MalformedInteger { .. } | NegativeParameterCount(_) => {
                "the number appears in this line".into()
            }
            MissingKeyword { directive, .. } => format!["this `{directive}` directive is incomplete"],
            DefaultWithoutParameters { .. } => "the default value is given here".into(),
            UnmatchedDelimiter { .. } => "the `%` is opened in this line".into(),
            InvalidExpression { reason, .. } => reason.clone(),
            UnknownDirective { .. } => "the tag appears here".into(),
            MissingEnd => "the source ends before the block is closed".into(),
            NestingTooDeep { .. } => "this block is nested too deeply".into(),
        }
    }

    pub fn notes(&self) -> Vec<String> {
        use ErrorKind::*;
        match self {
            MissingVersion { .. } => vec!["the first directive must be `VERSION 1`".into()],
            UnsupportedVersion(_) => vec!["the only supported version is 1".into()],
            MissingKeyword { directive, .. } => vec![format![
                "the `{directive}` directive has the form `{}`",
                Directive::usage(directive)
            ]],
            DefaultWithoutParameters { .. } => {
                vec!["give a nonzero parameter count with `OF` before `DEFAULT`".into()]
            }
            InvalidExpression { reason, .. } => vec![reason.clone()],
            UnknownDirective { tag } => {
                let mut notes = vec![];
                if let Some(suggestion) = spellcheck::closest_word(Directive::KEYWORDS, tag) {
                    notes.push(format!["did you mean `{suggestion}`?"]);
                }
                notes.push(format![
                    "the known directives are {}",
                    Directive::KEYWORDS.join(", ")
                ]);
                notes
            }
            MissingEnd => vec!["every `FOR` directive must be matched by an `END`".into()],
            MalformedInteger { .. }
            | NegativeParameterCount(_)
            | UnmatchedDelimiter { .. }
            | NestingTooDeep { .. }
            | Io(_) => vec![],
        }
    }
}

/// Error encountered when compiling MaTeX source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// 1-based line at which the error was raised.
    pub line: usize,
    /// Byte span of the offending line in the source.
    pub span: std::ops::Range<usize>,
    pub kind: ErrorKind,
}

impl Error {
    pub fn message(&self) -> String {
        self.kind.message()
    }

    pub fn notes(&self) -> Vec<String> {
        self.kind.notes()
    }

    /// Returns the diagnostic that the reporter prints for this error.
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            line: self.line,
            severity: Severity::Error,
            message: self.message(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "in line {}: {}", self.line, self.message())
    }
}

impl std::error::Error for Error {}

impl Error {
    #[cfg(feature = "ariadne")]
    pub fn ariadne_report<'a>(
        &self,
        file_name: &'a str,
    ) -> ariadne::Report<'static, (&'a str, std::ops::Range<usize>)> {
        let config = ariadne::Config::default().with_index_type(ariadne::IndexType::Byte);
        let mut report =
            ariadne::Report::build(ariadne::ReportKind::Error, (file_name, self.span.clone()))
                .with_config(config)
                .with_message(self.message())
                .with_label(
                    ariadne::Label::new((file_name, self.span.clone()))
                        .with_message(self.kind.label())
                        .with_color(ariadne::Color::BrightRed),
                );
        for note in self.notes() {
            report = report.with_note(note);
        }
        report.finish()
    }
}
