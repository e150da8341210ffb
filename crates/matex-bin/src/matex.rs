use clap::Parser;
use matex::{Compiler, Diagnostic, Reporter, StreamReporter};
use std::io::IsTerminal;
use std::path::PathBuf;

fn main() {
    if let Err(err) = Cli::parse().run() {
        if !err.is_empty() {
            eprintln!("{}: {err}", error_label());
        }
        std::process::exit(1);
    }
}

/// MaTeX: compile MaTeX source into a LaTeX style file.
///
/// The output file is only written if the source compiles without errors.
#[derive(Debug, Parser)]
#[command(
    name = "matex",
    author = "The MaTeX Project",
    version,
    about,
    long_about,
    max_term_width(100)
)]
struct Cli {
    /// Path to the MaTeX source file.
    source: PathBuf,

    /// Path to write the LaTeX style file.
    #[arg(short = 'o', long, default_value = "a.sty")]
    output: PathBuf,

    /// Begin the output with a comment saying the file is generated.
    #[arg(short = 'c', long)]
    auto_comment: bool,

    /// Define a variable that is visible to every expression.
    ///
    /// May be given multiple times.
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_definition)]
    definitions: Vec<(String, String)>,

    /// How to print errors and warnings.
    #[arg(long, value_enum, default_value = "plain")]
    error_format: ErrorFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ErrorFormat {
    /// One line per diagnostic: `error: in line <n>: <message>`.
    Plain,
    /// Errors are shown with the offending source line and notes.
    Rich,
    /// One JSON object per diagnostic.
    Json,
}

impl Cli {
    fn run(self) -> Result<(), String> {
        let color = std::io::stderr().is_terminal();
        let ok = match self.error_format {
            ErrorFormat::Plain => {
                let reporter =
                    StreamReporter::new(std::io::stderr(), std::io::stderr()).with_color(color);
                self.compile(reporter)?
            }
            ErrorFormat::Json => self.compile(JsonReporter)?,
            ErrorFormat::Rich => self.compile_rich(color)?,
        };
        if ok {
            Ok(())
        } else {
            Err("".into())
        }
    }

    fn compiler<R: Reporter>(&self, reporter: R) -> Compiler<R> {
        let mut compiler = Compiler::new(reporter);
        for (name, value) in &self.definitions {
            compiler.define(name.as_str(), value.as_str());
        }
        compiler
    }

    fn compile<R: Reporter>(&self, reporter: R) -> Result<bool, String> {
        let file = match std::fs::File::open(&self.source) {
            Ok(file) => file,
            Err(err) => {
                return Err(format!(
                    "failed to open `{}`: {}",
                    self.source.display(),
                    err
                ))
            }
        };
        let mut compiler = self.compiler(reporter);
        if !compiler.compile(file, self.auto_comment) {
            return Ok(false);
        }
        self.write(compiler)?;
        Ok(true)
    }

    fn compile_rich(&self, color: bool) -> Result<bool, String> {
        let source = match std::fs::read_to_string(&self.source) {
            Ok(source) => source,
            Err(err) => {
                return Err(format!(
                    "failed to read `{}`: {}",
                    self.source.display(),
                    err
                ))
            }
        };
        let reporter = StreamReporter::new(std::io::sink(), std::io::stderr()).with_color(color);
        let mut compiler = self.compiler(reporter);
        let input = std::io::Cursor::new(source.as_bytes());
        if let Err(err) = compiler.try_compile(input, self.auto_comment) {
            let path = self.source.to_string_lossy();
            let cache: (&str, _) = (&path, ariadne::Source::from(source.clone()));
            if err.ariadne_report(&path).eprint(cache).is_err() {
                eprintln!("{}", err.diagnostic());
            }
            return Ok(false);
        }
        self.write(compiler)?;
        Ok(true)
    }

    fn write<R: Reporter>(&self, mut compiler: Compiler<R>) -> Result<(), String> {
        let result = std::fs::File::create(&self.output)
            .and_then(|file| compiler.finish(std::io::BufWriter::new(file)));
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(format!(
                "failed to write `{}`: {}",
                self.output.display(),
                err
            )),
        }
    }
}

fn parse_definition(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if is_identifier(name) => Ok((name.into(), value.into())),
        Some((name, _)) => Err(format!("`{name}` is not a valid variable name")),
        None => Err("expected a definition of the form NAME=VALUE".into()),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Reporter that prints each diagnostic to stderr as a line of JSON.
struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        match serde_json::to_string(&diagnostic) {
            Ok(line) => eprintln!("{line}"),
            Err(_) => eprintln!("{diagnostic}"),
        }
    }
}

fn error_label() -> String {
    use colored::Colorize;
    if std::io::stderr().is_terminal() {
        "error".bright_red().bold().to_string()
    } else {
        "error".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn definitions() {
        assert_eq!(
            parse_definition("author=Ada Lovelace"),
            Ok(("author".into(), "Ada Lovelace".into()))
        );
        assert_eq!(parse_definition("x="), Ok(("x".into(), "".into())));
        assert_eq!(parse_definition("a=b=c"), Ok(("a".into(), "b=c".into())));
        assert!(parse_definition("novalue").is_err());
        assert!(parse_definition("1x=2").is_err());
        assert!(parse_definition("=2").is_err());
    }
}
