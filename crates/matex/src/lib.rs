//! # MaTeX
//!
//! MaTeX is a small line-oriented language for writing LaTeX style files.
//! Each line of a MaTeX source is a directive that the compiler turns into
//!     one line of LaTeX, like a `\newcommand` or a `\usepackage`.
//! The language has `FOR` loops and embedded expressions,
//!     so families of similar macros can be generated from a single template.
//!
//! ```
//! let source = r#"
//! VERSION 1
//! PAC amsmath
//! ## Blackboard bold letters for the usual number sets.
//! FOR letter IN NZQRC
//! DEF \%letter%%letter% TO BE \mathbb{%letter%}
//! END
//! "#;
//! let got = matex::compile_str(source, false).unwrap();
//! assert_eq!(
//!     got,
//!     r"\usepackage{amsmath}
//! \def\NN{\mathbb{N}}
//! \def\ZZ{\mathbb{Z}}
//! \def\QQ{\mathbb{Q}}
//! \def\RR{\mathbb{R}}
//! \def\CC{\mathbb{C}}
//! ",
//! );
//! ```
//!
//! ## Language specification
//!
//! A source is read one line at a time.
//! Leading and trailing whitespace is ignored,
//!     as are blank lines and lines starting with `#`.
//! The first word of a line is its *head* and selects the directive.
//! Heads are case insensitive.
//! Everything after the first space is the *tail*.
//!
//! The first directive must be `VERSION 1`.
//!
//! ### Directives
//!
//! | Directive | Output
//! |-----------|-------
//! | `DEF <macro> TO BE <body>` | `\def<macro>{<body>}`
//! | `CMD <name> TO BE <body> [OF <n> [DEFAULT <d>]]` | `\newcommand{<name>}[<n>][<d>]{<body>}`
//! | `PAC <package> [OPTION <option>]` | `\usepackage[<option>]{<package>}`
//! | `ENV <name> PRE <pre> POST <post> [OF <n> [DEFAULT <d>]]` | `\newenvironment{<name>}[<n>][<d>]{<pre>}{<post>}`
//! | `THM <name> [COUNTER <c>] NAME <title> [UNDER <parent>] [STYLE <s>]` | `\theoremstyle{<s>}\newtheorem{<name>}[<c>]{<title>}[<parent>]`
//! | `RAW <text>` | `<text>`
//! | `COM <text>` | `% <text>`
//! | `FOR <variable> IN <characters>` | Runs the lines up to the matching `END` once per character.
//! | `END` | Closes a `FOR` block.
//!
//! Optional parts in brackets are omitted from the output when they are omitted from the directive,
//!     except that the parameter count of `CMD` and `ENV` defaults to 0.
//! Keywords like `TO BE` are case insensitive and must be surrounded by spaces.
//! See the [`directive`] module for how ambiguous lines are split.
//!
//! ### Expressions
//!
//! Before a line is parsed, every region of the tail between two `%` characters
//!     is evaluated as an expression and replaced by its value.
//! Variables are bound by `FOR` loops or defined up front with [`Compiler::define`].
//! The [`expr`] module describes the expression language.
//!
//! ```
//! let source = "VERSION 1\nFOR c IN abc\nCMD \\vec%upper(c)% TO BE \\mathbf{%c%}\nEND\n";
//! let got = matex::compile_str(source, false).unwrap();
//! assert_eq!(
//!     got,
//!     r"\newcommand{\vecA}[0]{\mathbf{a}}
//! \newcommand{\vecB}[0]{\mathbf{b}}
//! \newcommand{\vecC}[0]{\mathbf{c}}
//! ",
//! );
//! ```
//!
//! ### Errors
//!
//! Compilation stops at the first error and produces no output.
//!
//! ```
//! let err = matex::compile_str("VERSION 1\nDEF \\x IS y\n", false).unwrap_err();
//! assert_eq!(err.to_string(), "in line 2: `TO BE` keyword expected");
//! ```

pub mod directive;
pub mod error;
pub mod expr;
pub mod reader;
pub mod report;
pub mod scope;
pub mod spellcheck;

mod compiler;

pub use compiler::Compiler;
pub use compiler::MAX_BLOCK_DEPTH;
pub use compiler::VERSION;
pub use directive::Directive;
pub use error::Error;
pub use error::ErrorKind;
pub use report::Diagnostic;
pub use report::Reporter;
pub use report::Severity;
pub use report::StreamReporter;
pub use scope::Scope;

/// Compiles a source held in memory and returns the LaTeX output.
///
/// Warnings are discarded.
pub fn compile_str(source: &str, autocomment: bool) -> Result<String, Error> {
    let mut compiler = Compiler::new(Vec::<Diagnostic>::new());
    compiler.try_compile(std::io::Cursor::new(source), autocomment)?;
    Ok(compiler.take_output())
}
