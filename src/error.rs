// Compile-time errors with source spans.

use std::fmt;

use thiserror::Error;

// A [begin, end) byte-offset range into the original input text,
// suitable for caret-printing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Span {
        Span { begin, end }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Semantic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Lexical => "lexical",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Semantic => "semantic",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} error: {msg}")]
pub struct FilterError {
    pub kind: ErrorKind,
    pub msg: String,
    pub span: Option<Span>,
}

impl FilterError {
    // Lexical errors point at the cursor position.
    pub fn lexical(pos: usize, msg: impl Into<String>) -> FilterError {
        FilterError {
            kind: ErrorKind::Lexical,
            msg: msg.into(),
            span: Some(Span::new(pos, pos + 1)),
        }
    }

    pub fn syntax(span: Span, msg: impl Into<String>) -> FilterError {
        FilterError {
            kind: ErrorKind::Syntax,
            msg: msg.into(),
            span: Some(span),
        }
    }

    pub fn semantic(span: Span, msg: impl Into<String>) -> FilterError {
        FilterError {
            kind: ErrorKind::Semantic,
            msg: msg.into(),
            span: Some(span),
        }
    }
}
