// ABOUTME: Error types for template rendering and population
// ABOUTME: PopulateError keeps the original template text so callers can fall back to it

use thiserror::Error;

use crate::parser::{ParseError, Span};

/// Failure raised inside a helper function or method, without a source position.
/// The executor attaches the position of the call before surfacing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FuncError(pub String);

impl FuncError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failure while executing a parsed template against a context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render error at line {line}, column {column}: {message}")]
pub struct RenderError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl RenderError {
    pub(crate) fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub(crate) fn from_func(err: FuncError, span: Span) -> Self {
        Self::new(err.0, span)
    }
}

/// Any failure produced while turning a template into output text.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// A panic caught at the engine boundary.
    #[error("internal template engine failure: {0}")]
    Internal(String),
}

/// A failed population: the underlying error plus the original template text
/// the caller should fall back to.
#[derive(Debug, Clone, Error)]
#[error("failed to populate template: {cause}")]
pub struct PopulateError {
    template: String,
    #[source]
    cause: TemplateError,
}

impl PopulateError {
    pub(crate) fn new(template: impl Into<String>, cause: TemplateError) -> Self {
        Self {
            template: template.into(),
            cause,
        }
    }

    /// The original template text, unmodified.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Consume the error and take back the original template text.
    pub fn into_template(self) -> String {
        self.template
    }

    /// The underlying parse or render failure.
    pub fn cause(&self) -> &TemplateError {
        &self.cause
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
