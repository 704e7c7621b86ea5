//! Expression parse errors.

use super::span::{render_diagnostic, Span};
use thiserror::Error;

/// Error raised while lexing or parsing an expression.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {}..{}", span.start, span.end)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Source span where the error occurred.
    pub span: Span,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Add a hint to the error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Format the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        render_diagnostic(source, self.span, &self.message, self.hint.as_deref())
    }
}
