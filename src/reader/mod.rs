//! Support for reading R programs from character streams.

use std::io::ErrorKind;

use crate::data::{Ptr, Storage};

mod parse;
mod token;

pub use parse::Parser;
pub use token::{Token, TokenKind, Tokenizer};

/// Parse the characters as an R program: a pairlist of its top-level
/// expressions, or `nil` if there are none.
pub fn parse_program<'a>(
    store: &'a Storage,
    input: impl Iterator<Item = char>,
) -> ReadResult<Ptr<'a>> {
    let mut parser = Parser::new(store, input)?;
    let program = parser.parse_program()?;
    let stats = store.current_stats();
    tracing::debug!(
        nodes = stats.nodes,
        data_bytes = stats.data_bytes,
        "parsed {} expressions",
        program.len()
    );
    Ok(program)
}

/// Parse the string as an R program.
pub fn parse_str<'a>(store: &'a Storage, input: &str) -> ReadResult<Ptr<'a>> {
    parse_program(store, input.chars())
}

/// What the parser was looking for when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    Expression,
    /// An operator, or the end of the expression.
    Operator,
    Description(&'static str),
}

impl std::fmt::Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{kind}"),
            Expected::Expression => f.write_str("expression"),
            Expected::Operator => f.write_str("operator or end of expression"),
            Expected::Description(s) => f.write_str(s),
        }
    }
}

/// Error type if a read does not complete.
///
/// A reader may experience a true tokenizing/parsing error, e.g. "f())", that no
/// additional input can fix. This is distinct from a reader that gets an
/// unexpected end-of-input, e.g. "f((": it may be that more input will fix
/// the issue. [`ReadErr::is_incomplete`] reports the distinction, so an
/// interactive host can prompt for more input instead of reporting an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadErr {
    #[error("lexical error at line {line}, column {column}: {message}")]
    Lexical {
        message: String,
        line: usize,
        column: usize,
        /// The error was raised by running out of input.
        at_end: bool,
    },
    #[error("syntax error at line {line}, column {column}: expected {expected}, found {found}")]
    Syntax {
        expected: Expected,
        found: TokenKind,
        line: usize,
        column: usize,
    },
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ReadErr>,
    },
}

impl ReadErr {
    /// Whether more input might have fixed the error.
    pub fn is_incomplete(&self) -> bool {
        match self {
            ReadErr::Lexical { at_end, .. } => *at_end,
            ReadErr::Syntax { found, .. } => *found == TokenKind::EndOfInput,
            ReadErr::Context { source, .. } => source.is_incomplete(),
        }
    }

    /// Add additional context to an error.
    pub fn annotate(self, more: impl AsRef<str>) -> Self {
        ReadErr::Context {
            context: more.as_ref().to_owned(),
            source: Box::new(self),
        }
    }

    /// Line and column where the error was found.
    pub fn position(&self) -> (usize, usize) {
        match self {
            ReadErr::Lexical { line, column, .. } | ReadErr::Syntax { line, column, .. } => {
                (*line, *column)
            }
            ReadErr::Context { source, .. } => source.position(),
        }
    }
}

/// The main result type for this module:
/// a T (token, expression, etc), or an error.
pub type ReadResult<T> = Result<T, ReadErr>;

impl From<ReadErr> for std::io::Error {
    fn from(value: ReadErr) -> Self {
        let kind = if value.is_incomplete() {
            ErrorKind::UnexpectedEof
        } else {
            ErrorKind::InvalidInput
        };
        std::io::Error::new(kind, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(input: &str) -> Vec<String> {
        let store = Storage::default();
        let program = parse_str(&store, input).unwrap();
        program.iter().map(|cell| cell.head.sexpr().to_string()).collect()
    }

    #[test]
    fn empty_program() -> ReadResult<()> {
        let store = Storage::default();
        assert!(parse_str(&store, "")?.is_nil());
        assert!(parse_str(&store, "\n\n  # just a comment\n;\n")?.is_nil());
        Ok(())
    }

    #[test]
    fn statements() {
        assert_eq!(
            read("x <- 1\ny <- x + 2; print(y)\n"),
            vec!["(<- x 1)", "(<- y (+ x 2))", "(print y)"]
        );
    }

    #[test]
    fn statements_need_separators() {
        let store = Storage::default();
        match parse_str(&store, "x y") {
            Err(ReadErr::Syntax {
                expected: Expected::Operator,
                found: TokenKind::Symbol,
                line: 1,
                column: 3,
            }) => (),
            v => panic!("unexpected result: {v:?}"),
        }
    }

    #[test]
    fn incomplete_input() {
        let store = Storage::default();
        for input in ["f(1,", "x <- ", "{ a", "\"abc", "if (a) b else", "`abc"] {
            let err = parse_str(&store, input).unwrap_err();
            assert!(err.is_incomplete(), "{input}: {err}");
        }
        for input in ["f(1))", "x <<= 2", "\"\\q\"", "1 +* 2"] {
            let err = parse_str(&store, input).unwrap_err();
            assert!(!err.is_incomplete(), "{input}: {err}");
        }
    }

    #[test]
    fn error_messages() {
        let store = Storage::default();
        let err = parse_str(&store, "f(1))").unwrap_err();
        assert_eq!(
            err.to_string(),
            "syntax error at line 1, column 5: expected operator or end of expression, found ')'"
        );
        let err = err.annotate("<stdin>");
        assert_eq!(err.position(), (1, 5));
        assert!(err.to_string().starts_with("<stdin>: syntax error"));

        let err = parse_str(&store, "x <- 'abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "lexical error at line 1, column 6: unterminated string constant"
        );
        let io: std::io::Error = err.into();
        assert_eq!(io.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn parse_again_after_error() {
        let store = Storage::default();
        parse_str(&store, "(((").unwrap_err();
        let program = parse_str(&store, "a").unwrap();
        assert_eq!(program.len(), 1);
    }
}
