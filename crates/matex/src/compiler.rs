//! The MaTeX compiler.

use crate::directive::Directive;
use crate::error::{Error, ErrorKind};
use crate::expr;
use crate::reader::{Line, LineReader};
use crate::report::{Diagnostic, Reporter, Severity};
use crate::scope::Scope;
use std::io::{self, BufRead, BufReader, Read, Seek, Write};

/// Version of MaTeX named in the auto-generated header comment.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum nesting depth of `FOR` blocks.
pub const MAX_BLOCK_DEPTH: usize = 256;

/// Compiler from MaTeX source to a LaTeX style file.
///
/// A compiler accumulates the output of successful compiles in an internal buffer.
/// The buffer is written out by [`Compiler::finish`].
/// A failed compile clears the buffer, so nothing is written after a failure.
///
/// ```
/// # use matex::{Compiler, Diagnostic};
/// let source = "VERSION 1\nFOR x IN ab\nRAW %x%\nEND\n";
/// let mut compiler = Compiler::new(Vec::<Diagnostic>::new());
/// assert!(compiler.compile(std::io::Cursor::new(source), false));
/// let mut output = vec![];
/// compiler.finish(&mut output).unwrap();
/// assert_eq!(output, b"a\nb\n");
/// ```
pub struct Compiler<R> {
    reporter: R,
    globals: Scope<'static>,
    output: String,
}

impl<R: Reporter> Compiler<R> {
    /// Creates a compiler that sends its diagnostics to the provided reporter.
    pub fn new(reporter: R) -> Self {
        Compiler {
            reporter,
            globals: Scope::new(),
            output: String::new(),
        }
    }

    /// Binds a variable that is visible to every expression in every compile.
    pub fn define<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.globals.insert(name, value);
    }

    /// Compiles the source, reporting any error to the reporter.
    ///
    /// Returns whether the compile succeeded.
    pub fn compile<I: Read + Seek>(&mut self, input: I, autocomment: bool) -> bool {
        match self.try_compile(input, autocomment) {
            Ok(()) => true,
            Err(err) => {
                self.reporter.report(err.diagnostic());
                false
            }
        }
    }

    /// Compiles the source and returns the first error instead of reporting it.
    ///
    /// Warnings are still sent to the reporter.
    pub fn try_compile<I: Read + Seek>(&mut self, input: I, autocomment: bool) -> Result<(), Error> {
        let result = LineReader::new(BufReader::new(input))
            .map_err(|err| Error {
                line: 0,
                span: 0..0,
                kind: ErrorKind::Io(err.to_string()),
            })
            .and_then(|reader| {
                let mut session = Session {
                    reader,
                    span: 0..0,
                    output: String::new(),
                    reporter: &mut self.reporter,
                };
                session.compile(&self.globals, autocomment)?;
                Ok(session.output)
            });
        match result {
            Ok(output) => {
                self.output.push_str(&output);
                Ok(())
            }
            Err(err) => {
                self.output.clear();
                Err(err)
            }
        }
    }

    /// Writes the accumulated output and empties the buffer.
    pub fn finish<W: Write>(&mut self, mut output: W) -> io::Result<()> {
        let content = self.take_output();
        output.write_all(content.as_bytes())?;
        output.flush()
    }

    /// Returns the accumulated output and empties the buffer.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Returns the reporter that receives this compiler's diagnostics.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Consumes the compiler and returns its reporter.
    pub fn into_reporter(self) -> R {
        self.reporter
    }
}

/// How a run of the dispatch loop stopped.
#[derive(Debug, PartialEq, Eq)]
enum Stop {
    End,
    EndOfInput,
}

/// State of a single compile.
struct Session<'r, B, R> {
    reader: LineReader<B>,
    /// Span of the line read last.
    span: std::ops::Range<usize>,
    output: String,
    reporter: &'r mut R,
}

impl<'r, B: BufRead + Seek, R: Reporter> Session<'r, B, R> {
    fn error(&self, kind: ErrorKind) -> Error {
        Error {
            line: self.reader.current_line(),
            span: self.span.clone(),
            kind,
        }
    }

    fn warn(&mut self, message: String) {
        let diagnostic = Diagnostic {
            line: self.reader.current_line(),
            severity: Severity::Warning,
            message,
        };
        self.reporter.report(diagnostic);
    }

    fn read(&mut self) -> Result<Option<Line>, Error> {
        match self.reader.next_line() {
            Ok(Some(line)) => {
                self.span = line.span.clone();
                Ok(Some(line))
            }
            Ok(None) => Ok(None),
            Err(err) => Err(self.error(ErrorKind::Io(err.to_string()))),
        }
    }

    fn seek(&mut self, position: u64) -> Result<(), Error> {
        self.reader
            .seek(position)
            .map_err(|err| self.error(ErrorKind::Io(err.to_string())))
    }

    fn compile(&mut self, globals: &Scope, autocomment: bool) -> Result<(), Error> {
        self.version()?;
        if autocomment {
            self.output.push_str(&format![
                "% This file is automatically generated by MaTeX version {VERSION}. Do not edit it manually.\n\n"
            ]);
        }
        if self.run(globals)? == Stop::End {
            self.warn("unmatched `END`; the rest of the file is ignored".into());
        }
        Ok(())
    }

    fn version(&mut self) -> Result<(), Error> {
        let line = match self.read()? {
            None => return Err(self.error(ErrorKind::MissingVersion { found: None })),
            Some(line) => line,
        };
        if line.head != "VERSION" {
            return Err(self.error(ErrorKind::MissingVersion {
                found: Some(line.head),
            }));
        }
        let raw = line.tail.trim();
        let version: i64 = raw.parse().map_err(|_| {
            self.error(ErrorKind::MalformedInteger {
                field: "version",
                got: raw.into(),
            })
        })?;
        if version != 1 {
            return Err(self.error(ErrorKind::UnsupportedVersion(version)));
        }
        Ok(())
    }

    /// Dispatches lines until an `END` directive or the end of the input.
    fn run(&mut self, scope: &Scope) -> Result<Stop, Error> {
        while let Some(line) = self.read()? {
            let tail = expr::substitute(&line.tail, scope).map_err(|kind| self.error(kind))?;
            let directive = Directive::parse(&line.head, &tail).map_err(|kind| self.error(kind))?;
            match directive {
                Directive::End => return Ok(Stop::End),
                Directive::For { variable, values } => {
                    self.run_block(scope, &variable, &values)?;
                }
                directive => {
                    if let Some(fragment) = directive.fragment() {
                        self.output.push_str(&fragment);
                        self.output.push('\n');
                    }
                }
            }
        }
        Ok(Stop::EndOfInput)
    }

    /// Runs the body of a `FOR` block once for each character of the values.
    ///
    /// On return the reader is positioned after the block's `END`.
    fn run_block(&mut self, scope: &Scope, variable: &str, values: &str) -> Result<(), Error> {
        if scope.depth() >= MAX_BLOCK_DEPTH {
            return Err(self.error(ErrorKind::NestingTooDeep {
                limit: MAX_BLOCK_DEPTH,
            }));
        }
        if values.is_empty() {
            return self.skip_block();
        }
        let start = self.reader.tell();
        for value in values.chars() {
            self.seek(start)?;
            let mut inner = scope.child();
            inner.insert(variable, value.to_string());
            if self.run(&inner)? == Stop::EndOfInput {
                return Err(self.error(ErrorKind::MissingEnd));
            }
        }
        Ok(())
    }

    /// Consumes the lines of a block up to and including its `END` without running them.
    fn skip_block(&mut self) -> Result<(), Error> {
        let mut nested = 0_usize;
        loop {
            let line = match self.read()? {
                None => return Err(self.error(ErrorKind::MissingEnd)),
                Some(line) => line,
            };
            match line.head.as_str() {
                "FOR" => nested += 1,
                "END" if nested == 0 => return Ok(()),
                "END" => nested -= 1,
                _ => {}
            }
        }
    }
}
