//! Directives and their LaTeX rendering.
//!
//! A directive is parsed from the head keyword and the substituted tail of a line.
//! The fields of a directive are separated by keywords like `TO BE` or `OF`.
//! A keyword is matched case insensitively and only when surrounded by spaces,
//!     and the *first* occurrence in the tail always wins.
//! This means a field value that itself contains a keyword is split at that keyword;
//!     e.g. in `ENV e PRE a POST b POST c` the post field is `b POST c`,
//!     but in `CMD c TO BE one OF two` the body is `one` and `two` is the parameter count.

use crate::error::ErrorKind;

/// A parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `DEF <macro> TO BE <body>`
    Def { macro_name: String, body: String },
    /// `CMD <name> TO BE <body> [OF <n> [DEFAULT <default>]]`
    Cmd {
        name: String,
        body: String,
        parameters: Parameters,
    },
    /// `PAC <package> [OPTION <option>]`
    Pac {
        package: String,
        option: Option<String>,
    },
    /// `ENV <name> PRE <pre> POST <post> [OF <n> [DEFAULT <default>]]`
    Env {
        name: String,
        pre: String,
        post: String,
        parameters: Parameters,
    },
    /// `THM <name> [COUNTER <counter>] NAME <title> [UNDER <parent>] [STYLE <style>]`
    Thm {
        name: String,
        counter: Option<String>,
        title: String,
        under: Option<String>,
        style: Option<String>,
    },
    /// `RAW <text>`
    Raw(String),
    /// `COM <text>`
    Com(String),
    /// `FOR <variable> IN <values>`
    For { variable: String, values: String },
    /// `END`
    End,
}

/// Parameters of a command or environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    pub count: u32,
    /// Default value of the first parameter.
    pub default: Option<String>,
}

impl Directive {
    /// Head keywords of all directives.
    pub const KEYWORDS: &'static [&'static str] =
        &["DEF", "CMD", "PAC", "ENV", "THM", "RAW", "COM", "FOR", "END"];

    /// Returns the syntax of the directive with the provided head keyword.
    pub fn usage(keyword: &str) -> &'static str {
        match keyword {
            "DEF" => "DEF <macro> TO BE <body>",
            "CMD" => "CMD <name> TO BE <body> [OF <n> [DEFAULT <default>]]",
            "PAC" => "PAC <package> [OPTION <option>]",
            "ENV" => "ENV <name> PRE <pre> POST <post> [OF <n> [DEFAULT <default>]]",
            "THM" => "THM <name> [COUNTER <counter>] NAME <title> [UNDER <parent>] [STYLE <style>]",
            "RAW" => "RAW <text>",
            "COM" => "COM <text>",
            "FOR" => "FOR <variable> IN <characters>",
            "END" => "END",
            _ => "",
        }
    }

    /// Parses a directive from an uppercased head keyword and a substituted tail.
    pub fn parse(head: &str, tail: &str) -> Result<Directive, ErrorKind> {
        let fields = Fields::new(tail);
        let end = tail.len();
        let directive = match head {
            "DEF" => {
                let to_be = fields.require("DEF", "TO BE")?;
                Directive::Def {
                    macro_name: fields.get(0, to_be.start),
                    body: fields.get(to_be.end, end),
                }
            }
            "CMD" => {
                let to_be = fields.require("CMD", "TO BE")?;
                let (body_end, parameters) = fields.parameters("CMD")?;
                Directive::Cmd {
                    name: fields.get(0, to_be.start),
                    body: fields.get(to_be.end, body_end),
                    parameters,
                }
            }
            "PAC" => match fields.find("OPTION") {
                None => Directive::Pac {
                    package: tail.trim().into(),
                    option: None,
                },
                Some(option) => Directive::Pac {
                    package: fields.get(0, option.start),
                    option: Some(fields.get(option.end, end)),
                },
            },
            "ENV" => {
                let pre = fields.require("ENV", "PRE")?;
                let post = fields.require("ENV", "POST")?;
                let (post_end, parameters) = fields.parameters("ENV")?;
                Directive::Env {
                    name: fields.get(0, pre.start),
                    pre: fields.get(pre.end, post.start),
                    post: fields.get(post.end, post_end),
                    parameters,
                }
            }
            "THM" => {
                let title = fields.require("THM", "NAME")?;
                let counter = fields.find("COUNTER");
                let under = fields.find("UNDER");
                let style = fields.find("STYLE");
                let name_end = counter.map_or(title.start, |c| c.start);
                let title_end = under.or(style).map_or(end, |m| m.start);
                let under_end = style.map_or(end, |s| s.start);
                Directive::Thm {
                    name: fields.get(0, name_end),
                    counter: counter.map(|c| fields.get(c.end, title.start)),
                    title: fields.get(title.end, title_end),
                    under: under.map(|u| fields.get(u.end, under_end)),
                    style: style.map(|s| fields.get(s.end, end)),
                }
            }
            "RAW" => Directive::Raw(tail.trim().into()),
            "COM" => Directive::Com(tail.into()),
            "FOR" => {
                let values = fields.require("FOR", "IN")?;
                Directive::For {
                    variable: fields.get(0, values.start),
                    values: fields.get(values.end, end),
                }
            }
            "END" => Directive::End,
            _ => {
                return Err(ErrorKind::UnknownDirective { tag: head.into() });
            }
        };
        Ok(directive)
    }

    /// Returns the LaTeX emitted for this directive, without a trailing newline.
    ///
    /// `FOR` and `END` emit nothing themselves and return [`None`].
    pub fn fragment(&self) -> Option<String> {
        use Directive::*;
        let fragment = match self {
            Def { macro_name, body } => format![r"\def{macro_name}{{{body}}}"],
            Cmd {
                name,
                body,
                parameters: Parameters { count, default },
            } => match default {
                None => format![r"\newcommand{{{name}}}[{count}]{{{body}}}"],
                Some(default) => {
                    format![r"\newcommand{{{name}}}[{count}][{default}]{{{body}}}"]
                }
            },
            Pac { package, option } => match option {
                None => format![r"\usepackage{{{package}}}"],
                Some(option) => format![r"\usepackage[{option}]{{{package}}}"],
            },
            Env {
                name,
                pre,
                post,
                parameters: Parameters { count, default },
            } => match default {
                None => format![r"\newenvironment{{{name}}}[{count}]{{{pre}}}{{{post}}}"],
                Some(default) => format![
                    r"\newenvironment{{{name}}}[{count}][{default}]{{{pre}}}{{{post}}}"
                ],
            },
            Thm {
                name,
                counter,
                title,
                under,
                style,
            } => {
                let mut s = match style {
                    None => String::new(),
                    Some(style) => format![r"\theoremstyle{{{style}}}"],
                };
                s.push_str(&match (counter, under) {
                    (None, None) => format![r"\newtheorem{{{name}}}{{{title}}}"],
                    (None, Some(under)) => format![r"\newtheorem{{{name}}}{{{title}}}[{under}]"],
                    (Some(counter), None) => {
                        format![r"\newtheorem{{{name}}}[{counter}]{{{title}}}"]
                    }
                    (Some(counter), Some(under)) => {
                        format![r"\newtheorem{{{name}}}[{counter}]{{{title}}}[{under}]"]
                    }
                });
                s
            }
            Raw(text) => text.clone(),
            Com(text) => format!["% {text}"],
            For { .. } | End => return None,
        };
        Some(fragment)
    }
}

/// Location of a keyword within a tail.
#[derive(Debug, Clone, Copy)]
struct Marker {
    start: usize,
    end: usize,
}

/// Keyword-delimited fields of a tail.
struct Fields<'a> {
    tail: &'a str,
    /// The tail with ASCII letters uppercased; byte offsets agree with the tail.
    folded: String,
}

impl<'a> Fields<'a> {
    fn new(tail: &'a str) -> Self {
        Fields {
            tail,
            folded: tail.to_ascii_uppercase(),
        }
    }

    fn find(&self, keyword: &'static str) -> Option<Marker> {
        let padded = format![" {keyword} "];
        self.folded.find(&padded).map(|start| Marker {
            start,
            end: start + padded.len(),
        })
    }

    fn require(&self, directive: &'static str, keyword: &'static str) -> Result<Marker, ErrorKind> {
        self.find(keyword)
            .ok_or(ErrorKind::MissingKeyword { directive, keyword })
    }

    /// Returns the trimmed text between two offsets, or an empty string if the
    ///     keywords delimiting the field appear in the wrong order.
    fn get(&self, start: usize, end: usize) -> String {
        if end < start {
            return String::new();
        }
        self.tail[start..end].trim().into()
    }

    /// Parses the optional `OF <n> [DEFAULT <default>]` suffix.
    ///
    /// Also returns where the field before the suffix ends.
    fn parameters(&self, directive: &'static str) -> Result<(usize, Parameters), ErrorKind> {
        let end = self.tail.len();
        match (self.find("OF"), self.find("DEFAULT")) {
            (None, None) => Ok((end, Parameters::default())),
            (None, Some(_)) => Err(ErrorKind::DefaultWithoutParameters { directive }),
            (Some(of), None) => Ok((
                of.start,
                Parameters {
                    count: parameter_count(&self.get(of.end, end))?,
                    default: None,
                },
            )),
            (Some(of), Some(default)) => {
                let count = parameter_count(&self.get(of.end, default.start))?;
                if count == 0 {
                    return Err(ErrorKind::DefaultWithoutParameters { directive });
                }
                Ok((
                    of.start,
                    Parameters {
                        count,
                        default: Some(self.get(default.end, end)),
                    },
                ))
            }
        }
    }
}

fn parameter_count(raw: &str) -> Result<u32, ErrorKind> {
    let malformed = || ErrorKind::MalformedInteger {
        field: "parameter count",
        got: raw.into(),
    };
    let n: i64 = raw.parse().map_err(|_| malformed())?;
    if n < 0 {
        return Err(ErrorKind::NegativeParameterCount(n));
    }
    u32::try_from(n).map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! fragment_tests {
        ( $( ($name: ident, $head: expr, $tail: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let directive = Directive::parse($head, $tail).unwrap();
                let want: Option<&str> = $want;
                assert_eq!(directive.fragment().as_deref(), want);
            }
            )+
        };
    }

    fragment_tests!(
        (def, "DEF", r"\foo TO BE bar", Some(r"\def\foo{bar}")),
        (def_case_insensitive, "DEF", r"\foo to be  bar ", Some(r"\def\foo{bar}")),
        (def_with_arguments, "DEF", r"\pair#1#2 TO BE (#1, #2)", Some(r"\def\pair#1#2{(#1, #2)}")),
        (cmd, "CMD", r"\hi TO BE Hi", Some(r"\newcommand{\hi}[0]{Hi}")),
        (cmd_parameters, "CMD", r"\hi TO BE Hi #1 OF 1", Some(r"\newcommand{\hi}[1]{Hi #1}")),
        (
            cmd_default,
            "CMD",
            "greet TO BE Hello OF 1 DEFAULT World",
            Some(r"\newcommand{greet}[1][World]{Hello}")
        ),
        (cmd_body_containing_of, "CMD", "c TO BE one OF 2", Some(r"\newcommand{c}[2]{one}")),
        (pac, "PAC", " amsmath ", Some(r"\usepackage{amsmath}")),
        (pac_option, "PAC", "geometry option margin=1in", Some(r"\usepackage[margin=1in]{geometry}")),
        (
            env,
            "ENV",
            r"box PRE \begin{center} POST \end{center}",
            Some(r"\newenvironment{box}[0]{\begin{center}}{\end{center}}")
        ),
        (
            env_parameters,
            "ENV",
            r"box PRE \begin{#1} POST \end{#1} OF 1",
            Some(r"\newenvironment{box}[1]{\begin{#1}}{\end{#1}}")
        ),
        (
            env_default,
            "ENV",
            r"box PRE [#1] POST . OF 1 DEFAULT center",
            Some(r"\newenvironment{box}[1][center]{[#1]}{.}")
        ),
        (env_post_containing_post, "ENV", "e PRE a POST b POST c", Some(r"\newenvironment{e}[0]{a}{b POST c}")),
        (thm, "THM", "thm NAME Theorem", Some(r"\newtheorem{thm}{Theorem}")),
        (thm_under, "THM", "thm NAME Theorem UNDER section", Some(r"\newtheorem{thm}{Theorem}[section]")),
        (thm_counter, "THM", "lem COUNTER thm NAME Lemma", Some(r"\newtheorem{lem}[thm]{Lemma}")),
        (
            thm_counter_under,
            "THM",
            "lem COUNTER thm NAME Lemma UNDER section",
            Some(r"\newtheorem{lem}[thm]{Lemma}[section]")
        ),
        (
            thm_style,
            "THM",
            "def NAME Definition STYLE definition",
            Some(r"\theoremstyle{definition}\newtheorem{def}{Definition}")
        ),
        (
            thm_everything,
            "THM",
            "lem COUNTER thm NAME Lemma UNDER section STYLE plain",
            Some(r"\theoremstyle{plain}\newtheorem{lem}[thm]{Lemma}[section]")
        ),
        (thm_title_with_spaces, "THM", "cj NAME Main  Conjecture", Some(r"\newtheorem{cj}{Main  Conjecture}")),
        (raw, "RAW", r"  \makeatletter  ", Some(r"\makeatletter")),
        (com, "COM", "generated macros", Some("% generated macros")),
        (for_directive, "FOR", "x IN abc", None),
        (end, "END", "", None),
    );

    #[test]
    fn for_fields() {
        assert_eq!(
            Directive::parse("FOR", " i in  123 "),
            Ok(Directive::For {
                variable: "i".into(),
                values: "123".into()
            })
        );
    }

    macro_rules! error_tests {
        ( $( ($name: ident, $head: expr, $tail: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let got = Directive::parse($head, $tail);
                assert_eq!(got, Err($want));
            }
            )+
        };
    }

    error_tests!(
        (
            def_missing_to_be,
            "DEF",
            r"\foo bar",
            ErrorKind::MissingKeyword { directive: "DEF", keyword: "TO BE" }
        ),
        (
            cmd_missing_to_be,
            "CMD",
            r"\foo IS bar",
            ErrorKind::MissingKeyword { directive: "CMD", keyword: "TO BE" }
        ),
        (
            env_missing_pre,
            "ENV",
            "box POST b",
            ErrorKind::MissingKeyword { directive: "ENV", keyword: "PRE" }
        ),
        (
            env_missing_post,
            "ENV",
            "box PRE a",
            ErrorKind::MissingKeyword { directive: "ENV", keyword: "POST" }
        ),
        (
            thm_missing_name,
            "THM",
            "thm COUNTER x",
            ErrorKind::MissingKeyword { directive: "THM", keyword: "NAME" }
        ),
        (
            for_missing_in,
            "FOR",
            "x abc",
            ErrorKind::MissingKeyword { directive: "FOR", keyword: "IN" }
        ),
        (
            cmd_malformed_count,
            "CMD",
            "c TO BE x OF two",
            ErrorKind::MalformedInteger { field: "parameter count", got: "two".into() }
        ),
        (
            cmd_negative_count,
            "CMD",
            "c TO BE x OF -1",
            ErrorKind::NegativeParameterCount(-1)
        ),
        (
            cmd_default_without_of,
            "CMD",
            "c TO BE x DEFAULT y",
            ErrorKind::DefaultWithoutParameters { directive: "CMD" }
        ),
        (
            cmd_default_with_zero_parameters,
            "CMD",
            "c TO BE x OF 0 DEFAULT y",
            ErrorKind::DefaultWithoutParameters { directive: "CMD" }
        ),
        (
            env_default_without_of,
            "ENV",
            "e PRE a POST b DEFAULT y",
            ErrorKind::DefaultWithoutParameters { directive: "ENV" }
        ),
        (
            env_malformed_count,
            "ENV",
            "e PRE a POST b OF 1.5",
            ErrorKind::MalformedInteger { field: "parameter count", got: "1.5".into() }
        ),
        (
            unknown,
            "DEFINE",
            "x",
            ErrorKind::UnknownDirective { tag: "DEFINE".into() }
        ),
        (
            version_after_header,
            "VERSION",
            "1",
            ErrorKind::UnknownDirective { tag: "VERSION".into() }
        ),
    );

    #[test]
    fn every_keyword_has_usage() {
        for keyword in Directive::KEYWORDS {
            assert!(Directive::usage(keyword).starts_with(*keyword));
        }
    }
}
