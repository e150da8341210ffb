//! Embedded expressions.
//!
//! A directive tail may contain expressions delimited by `%` characters.
//! Before a directive is parsed, [`substitute`] evaluates each expression
//!     and splices the result into the tail:
//!
//! ```
//! # use matex::{expr, Scope};
//! let mut scope = Scope::new();
//! scope.insert("name", "World");
//! assert_eq!(
//!     expr::substitute("\\hello TO BE Hello %name + '!'% %1+1%", &scope),
//!     Ok("\\hello TO BE Hello World! 2".to_string()),
//! );
//! ```
//!
//! ## Expression language
//!
//! Expressions are evaluated by a small interpreter that cannot
//!     change the variable environment or anything outside it.
//!
//! | Syntax | Meaning
//! |--------|--------
//! | `12`, `1.5` | Integer and float literals.
//! | `"text"`, `'text'` | String literals. There are no escape sequences.
//! | `name` | Value of a variable. Variables always hold strings.
//! | `a + b` | Sum of two numbers, or concatenation of two strings.
//! | `a - b` | Difference of two numbers.
//! | `a * b` | Product of two numbers, or a string repeated an integer number of times.
//! | `a / b` | Quotient of two numbers. The result is always a float.
//! | `-a` | Negation of a number.
//! | `f(a, ...)` | Call of a built-in function.
//!
//! The built-in functions are:
//!
//! - `emphasize_case(s)` (alias `upperlower`): see [`emphasize_case`].
//! - `upper(s)`, `lower(s)`: case conversion.
//! - `len(s)`: number of characters in a string.
//! - `str(x)`: string representation of any value.

use crate::error::ErrorKind;
use crate::scope::Scope;

/// Maximum nesting of parentheses and unary minus signs in one expression.
pub const MAX_NESTING: usize = 64;

/// Maximum length in bytes of a string produced by an expression.
pub const MAX_STRING_LEN: usize = 1 << 20;

/// Value of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

/// Replaces every `%...%` region of the tail with the value of the expression inside it.
pub fn substitute(tail: &str, scope: &Scope) -> Result<String, ErrorKind> {
    let mut result = String::with_capacity(tail.len());
    let mut rest = tail;
    let mut column = 0;
    while let Some(open) = rest.find('%') {
        result.push_str(&rest[..open]);
        column += rest[..open].chars().count();
        let after = &rest[open + 1..];
        let close = match after.find('%') {
            None => return Err(ErrorKind::UnmatchedDelimiter { column }),
            Some(close) => close,
        };
        let expression = &after[..close];
        match evaluate(expression, scope) {
            Ok(value) => result.push_str(&value.to_string()),
            Err(reason) => {
                return Err(ErrorKind::InvalidExpression {
                    expression: expression.into(),
                    reason,
                })
            }
        }
        column += expression.chars().count() + 2;
        rest = &after[close + 1..];
    }
    result.push_str(rest);
    Ok(result)
}

/// Evaluates a single expression.
///
/// On failure the error describes what went wrong.
pub fn evaluate(expression: &str, scope: &Scope) -> Result<Value, String> {
    let tokens = lex(expression)?;
    let mut parser = Parser {
        tokens,
        next: 0,
        depth: 0,
        scope,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(token) => Err(format!["unexpected {token} after the end of the expression"]),
    }
}

/// Renders text in uppercase, setting originally lowercase runs in a smaller size.
///
/// This simulates small caps.
/// Uppercase characters are set at normal size and lowercase characters
///     are uppercased and set with `\footnotesize`.
/// Size switches are only emitted when the size actually changes,
///     and spaces never change the size.
/// The result always ends by restoring `\normalsize`.
///
/// ```
/// # use matex::expr::emphasize_case;
/// assert_eq!(
///     emphasize_case("Hello World"),
///     r"H\footnotesize ELLO \normalsize W\footnotesize ORLD\normalsize ",
/// );
/// ```
pub fn emphasize_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 2);
    let mut reduced = false;
    for c in text.chars() {
        if c == ' ' {
            result.push(c);
            continue;
        }
        let upper: String = c.to_uppercase().collect();
        let is_upper = upper.chars().eq(std::iter::once(c));
        let is_lower = c.to_lowercase().eq(std::iter::once(c));
        if is_upper && reduced {
            result.push_str(r"\normalsize ");
            reduced = false;
        } else if is_lower && !reduced {
            result.push_str(r"\footnotesize ");
            reduced = true;
        }
        result.push_str(&upper);
    }
    result.push_str(r"\normalsize ");
    result
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Integer(i64),
    Float(f64),
    String(String),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    OpenParen,
    CloseParen,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Integer(i) => write!(f, "number `{i}`"),
            Token::Float(x) => write!(f, "number `{x}`"),
            Token::String(s) => write!(f, "string `{s:?}`"),
            Token::Name(name) => write!(f, "name `{name}`"),
            Token::Plus => write!(f, "`+`"),
            Token::Minus => write!(f, "`-`"),
            Token::Star => write!(f, "`*`"),
            Token::Slash => write!(f, "`/`"),
            Token::OpenParen => write!(f, "`(`"),
            Token::CloseParen => write!(f, "`)`"),
            Token::Comma => write!(f, "`,`"),
        }
    }
}

fn lex(expression: &str) -> Result<Vec<Token>, String> {
    let mut tokens = vec![];
    let mut chars = expression.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            ',' => Token::Comma,
            '"' | '\'' => {
                let mut s = String::new();
                loop {
                    match chars.next() {
                        None => return Err(format!["string starting at offset {i} is not closed"]),
                        Some((_, d)) if d == c => break,
                        Some((_, d)) => s.push(d),
                    }
                }
                Token::String(s)
            }
            '0'..='9' => {
                let mut end = i + 1;
                let mut is_float = false;
                while let Some(&(j, d)) = chars.peek() {
                    if d.is_ascii_digit() || (d == '.' && !is_float) {
                        is_float |= d == '.';
                        end = j + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &expression[i..end];
                if is_float {
                    match literal.parse::<f64>() {
                        Ok(x) => Token::Float(x),
                        Err(_) => return Err(format!["invalid number `{literal}`"]),
                    }
                } else {
                    match literal.parse::<i64>() {
                        Ok(n) => Token::Integer(n),
                        Err(_) => return Err(format!["integer `{literal}` is too large"]),
                    }
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::from(c);
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Name(name)
            }
            c => return Err(format!["unexpected character `{c}`"]),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

struct Parser<'s, 'a> {
    tokens: Vec<Token>,
    next: usize,
    depth: usize,
    scope: &'s Scope<'a>,
}

impl<'s, 'a> Parser<'s, 'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.next)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.next).cloned();
        if token.is_some() {
            self.next += 1;
        }
        token
    }

    fn expect(&mut self, want: Token) -> Result<(), String> {
        match self.consume() {
            Some(got) if got == want => Ok(()),
            Some(got) => Err(format!["expected {want}, found {got}"]),
            None => Err(format!["expected {want}, found the end of the expression"]),
        }
    }

    fn nest(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(format!["expression is nested more than {MAX_NESTING} levels deep"]);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Value, String> {
        let mut value = self.product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => add,
                Some(Token::Minus) => subtract,
                _ => return Ok(value),
            };
            self.consume();
            let rhs = self.product()?;
            value = op(value, rhs)?;
        }
    }

    fn product(&mut self) -> Result<Value, String> {
        let mut value = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => multiply,
                Some(Token::Slash) => divide,
                _ => return Ok(value),
            };
            self.consume();
            let rhs = self.unary()?;
            value = op(value, rhs)?;
        }
    }

    fn unary(&mut self) -> Result<Value, String> {
        if self.peek() != Some(&Token::Minus) {
            return self.primary();
        }
        self.consume();
        self.nest()?;
        let value = match self.unary()? {
            Value::Integer(i) => Value::Integer(
                i.checked_neg()
                    .ok_or_else(|| "integer overflow".to_string())?,
            ),
            Value::Float(x) => Value::Float(-x),
            Value::String(_) => return Err("cannot negate a string".into()),
        };
        self.depth -= 1;
        Ok(value)
    }

    fn primary(&mut self) -> Result<Value, String> {
        match self.consume() {
            None => Err("expected a value, found the end of the expression".into()),
            Some(Token::Integer(i)) => Ok(Value::Integer(i)),
            Some(Token::Float(x)) => Ok(Value::Float(x)),
            Some(Token::String(s)) => Ok(Value::String(s)),
            Some(Token::OpenParen) => {
                self.nest()?;
                let value = self.expr()?;
                self.expect(Token::CloseParen)?;
                self.depth -= 1;
                Ok(value)
            }
            Some(Token::Name(name)) => {
                if self.peek() == Some(&Token::OpenParen) {
                    self.consume();
                    let args = self.args()?;
                    return call(&name, args);
                }
                match self.scope.get(&name) {
                    Some(value) => Ok(Value::String(value.into())),
                    None if BUILTINS.contains(&name.as_str()) => {
                        Err(format!["`{name}` is a function and must be called"])
                    }
                    None => Err(format!["name `{name}` is not defined"]),
                }
            }
            Some(token) => Err(format!["expected a value, found {token}"]),
        }
    }

    fn args(&mut self) -> Result<Vec<Value>, String> {
        let mut args = vec![];
        if self.peek() == Some(&Token::CloseParen) {
            self.consume();
            return Ok(args);
        }
        self.nest()?;
        loop {
            args.push(self.expr()?);
            match self.consume() {
                Some(Token::Comma) => continue,
                Some(Token::CloseParen) => break,
                Some(token) => return Err(format!["expected `,` or `)`, found {token}"]),
                None => return Err("function call is not closed".into()),
            }
        }
        self.depth -= 1;
        Ok(args)
    }
}

const BUILTINS: &[&str] = &["emphasize_case", "upperlower", "upper", "lower", "len", "str"];

fn call(name: &str, args: Vec<Value>) -> Result<Value, String> {
    if !BUILTINS.contains(&name) {
        return Err(format!["no function named `{name}`"]);
    }
    let [arg]: [Value; 1] = match args.try_into() {
        Ok(args) => args,
        Err(args) => {
            return Err(format![
                "`{name}` takes 1 argument but {} were given",
                args.len()
            ])
        }
    };
    if name == "str" {
        return Ok(Value::String(arg.to_string()));
    }
    let s = match arg {
        Value::String(s) => s,
        other => {
            return Err(format![
                "`{name}` expects a string, found {}",
                other.type_name()
            ])
        }
    };
    let value = match name {
        "emphasize_case" | "upperlower" => Value::String(emphasize_case(&s)),
        "upper" => Value::String(s.to_uppercase()),
        "lower" => Value::String(s.to_lowercase()),
        _ => Value::Integer(s.chars().count() as i64),
    };
    check_len(value)
}

fn check_len(value: Value) -> Result<Value, String> {
    match &value {
        Value::String(s) if s.len() > MAX_STRING_LEN => Err(format![
            "string result is longer than {MAX_STRING_LEN} bytes"
        ]),
        _ => Ok(value),
    }
}

fn type_error(op: &str, lhs: &Value, rhs: &Value) -> String {
    format![
        "cannot {op} {} and {}",
        lhs.type_name(),
        rhs.type_name()
    ]
}

fn add(lhs: Value, rhs: Value) -> Result<Value, String> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(b)
            .map(Value::Integer)
            .ok_or_else(|| "integer overflow".into()),
        (Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            check_len(Value::String(a))
        }
        (lhs, rhs) => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Err(type_error("add", &lhs, &rhs)),
        },
    }
}

fn subtract(lhs: Value, rhs: Value) -> Result<Value, String> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_sub(b)
            .map(Value::Integer)
            .ok_or_else(|| "integer overflow".into()),
        (lhs, rhs) => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(a - b)),
            _ => Err(type_error("subtract", &lhs, &rhs)),
        },
    }
}

fn multiply(lhs: Value, rhs: Value) -> Result<Value, String> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_mul(b)
            .map(Value::Integer)
            .ok_or_else(|| "integer overflow".into()),
        (Value::String(s), Value::Integer(n)) | (Value::Integer(n), Value::String(s)) => {
            let n = usize::try_from(n).unwrap_or(0);
            if s.len().saturating_mul(n) > MAX_STRING_LEN {
                return Err(format![
                    "string result is longer than {MAX_STRING_LEN} bytes"
                ]);
            }
            Ok(Value::String(s.repeat(n)))
        }
        (lhs, rhs) => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(a * b)),
            _ => Err(type_error("multiply", &lhs, &rhs)),
        },
    }
}

fn divide(lhs: Value, rhs: Value) -> Result<Value, String> {
    match (lhs.as_float(), rhs.as_float()) {
        (Some(_), Some(b)) if b == 0.0 => Err("division by zero".into()),
        (Some(a), Some(b)) => Ok(Value::Float(a / b)),
        _ => Err(type_error("divide", &lhs, &rhs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope<'static> {
        [("x", "a"), ("name", "Lemma"), ("n", "3")]
            .into_iter()
            .collect()
    }

    macro_rules! evaluate_tests {
        ( $( ($name: ident, $input: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let got = evaluate($input, &scope());
                assert_eq!(got, Ok($want));
            }
            )+
        };
    }

    evaluate_tests!(
        (integer, "42", Value::Integer(42)),
        (sum, "1+1", Value::Integer(2)),
        (precedence, "1 + 2 * 3", Value::Integer(7)),
        (parentheses, "(1 + 2) * 3", Value::Integer(9)),
        (left_associative, "10 - 3 - 2", Value::Integer(5)),
        (negation, "-(2 - 5)", Value::Integer(3)),
        (division_is_float, "1 / 2", Value::Float(0.5)),
        (mixed_sum, "1 + 0.5", Value::Float(1.5)),
        (variable, "x", Value::String("a".into())),
        (concatenation, "x + 'b' + \"c\"", Value::String("abc".into())),
        (repetition, "'ab' * 3", Value::String("ababab".into())),
        (negative_repetition, "'ab' * -1", Value::String("".into())),
        (variables_are_strings, "n + n", Value::String("33".into())),
        (str_of_number, "str(2 * 3) + x", Value::String("6a".into())),
        (length, "len(name)", Value::Integer(5)),
        (upper, "upper(name)", Value::String("LEMMA".into())),
        (lower, "lower(name)", Value::String("lemma".into())),
        (
            emphasize,
            "emphasize_case(name)",
            Value::String(r"L\footnotesize EMMA\normalsize ".into())
        ),
        (
            emphasize_alias,
            "upperlower('ab')",
            Value::String(r"\footnotesize AB\normalsize ".into())
        ),
    );

    macro_rules! evaluate_failure_tests {
        ( $( ($name: ident, $input: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let got = evaluate($input, &scope());
                println!["got: {got:?}"];
                assert!(got.is_err());
            }
            )+
        };
    }

    evaluate_failure_tests!(
        (empty, ""),
        (undefined_variable, "y"),
        (unknown_function, "exec('rm')"),
        (trailing_tokens, "1 2"),
        (unclosed_paren, "(1 + 2"),
        (unclosed_string, "'abc"),
        (string_plus_number, "x + 1"),
        (negate_string, "-x"),
        (division_by_zero, "1 / 0"),
        (overflow, "9223372036854775807 + 1"),
        (literal_too_large, "99999999999999999999"),
        (wrong_arity, "upper(x, x)"),
        (wrong_type, "upper(1)"),
        (uncalled_builtin, "upper"),
        (huge_string, "'a' * 2000000"),
        (unexpected_character, "1 $ 2"),
    );

    #[test]
    fn deep_nesting_is_rejected() {
        let source = format!["{}1{}", "(".repeat(100), ")".repeat(100)];
        assert!(evaluate(&source, &scope()).is_err());
        let source = format!["{}1{}", "(".repeat(10), ")".repeat(10)];
        assert_eq!(evaluate(&source, &scope()), Ok(Value::Integer(1)));
    }

    #[test]
    fn float_display() {
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Integer(-3).to_string(), "-3");
    }

    #[test]
    fn substitute_splices_values() {
        assert_eq!(
            substitute("a%1+1%b%x%", &scope()),
            Ok("a2ba".to_string())
        );
        assert_eq!(substitute("no expressions", &scope()), Ok("no expressions".to_string()));
    }

    #[test]
    fn substitute_backslash_percent_is_not_special() {
        assert_eq!(substitute(r"a\%x%b", &scope()), Ok(r"a\ab".to_string()));
    }

    #[test]
    fn substitute_unmatched_delimiter_column() {
        assert_eq!(
            substitute("ab %1% cd % ef", &scope()),
            Err(ErrorKind::UnmatchedDelimiter { column: 10 })
        );
        assert_eq!(
            substitute("é%", &scope()),
            Err(ErrorKind::UnmatchedDelimiter { column: 1 })
        );
    }

    #[test]
    fn substitute_invalid_expression() {
        let got = substitute("a %1 +% b", &scope());
        assert!(matches!(
            got,
            Err(ErrorKind::InvalidExpression { expression, .. }) if expression == "1 +"
        ));
    }

    macro_rules! emphasize_case_tests {
        ( $( ($name: ident, $input: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                assert_eq!(emphasize_case($input), $want);
            }
            )+
        };
    }

    emphasize_case_tests!(
        (emphasize_empty, "", r"\normalsize "),
        (emphasize_all_upper, "ABC", r"ABC\normalsize "),
        (emphasize_all_lower, "abc", r"\footnotesize ABC\normalsize "),
        (
            emphasize_words,
            "Hello World",
            r"H\footnotesize ELLO \normalsize W\footnotesize ORLD\normalsize "
        ),
        (
            emphasize_space_keeps_size,
            "ab cd",
            r"\footnotesize AB CD\normalsize "
        ),
        (emphasize_digit_after_upper, "A1", r"A\footnotesize 1\normalsize "),
        (emphasize_digit_after_lower, "a1", r"\footnotesize A\normalsize 1\normalsize "),
        (emphasize_sharp_s, "ß", r"\footnotesize SS\normalsize "),
    );
}
