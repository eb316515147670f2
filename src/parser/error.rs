// ABOUTME: Parse error type for template syntax problems
// ABOUTME: Carries the source position so messages can point at the offending action

use thiserror::Error;

use super::ast::Span;

/// Error produced while lexing or parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::new(format!("expected {expected}, found {found}"), span)
    }

    pub fn unexpected_eof(expected: &str, span: Span) -> Self {
        Self::new(format!("unexpected end of template, expected {expected}"), span)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
