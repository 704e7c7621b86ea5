//! Template errors.

use ormap_core::exp::render_diagnostic;
use ormap_core::Span;
use thiserror::Error;

/// Error raised while parsing or evaluating a SQL template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    /// Malformed template text.
    #[error("{message} at {}..{}", span.start, span.end)]
    Parse {
        message: String,
        span: Span,
        hint: Option<String>,
    },

    /// `#name(...)` with a name the processor doesn't know.
    #[error("unknown directive '#{name}' at {}..{}", span.start, span.end)]
    UnknownDirective { name: String, span: Span },

    /// Directive argument of the wrong kind or count.
    #[error("invalid argument for '#{directive}': {message}")]
    InvalidArgument { directive: String, message: String },

    /// Positional parameters that don't match the template's variables.
    #[error("template expects {expected} positional parameter(s), got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    /// Failure while rendering with concrete parameter values.
    #[error("template evaluation failed: {0}")]
    Evaluation(String),
}

impl TemplateError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        TemplateError::Parse {
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Attach a hint to a parse error. Other errors are returned unchanged.
    pub fn with_hint(self, text: impl Into<String>) -> Self {
        match self {
            TemplateError::Parse { message, span, .. } => TemplateError::Parse {
                message,
                span,
                hint: Some(text.into()),
            },
            other => other,
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(directive: impl Into<String>, message: impl Into<String>) -> Self {
        TemplateError::InvalidArgument {
            directive: directive.into(),
            message: message.into(),
        }
    }

    /// Source span of the error, when it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            TemplateError::Parse { span, .. } | TemplateError::UnknownDirective { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// Format the error with a caret under the offending template text.
    pub fn format_with_source(&self, source: &str) -> String {
        match self {
            TemplateError::Parse {
                message,
                span,
                hint,
            } => render_diagnostic(source, *span, message, hint.as_deref()),
            TemplateError::UnknownDirective { name, span } => render_diagnostic(
                source,
                *span,
                &format!("unknown directive '#{}'", name),
                Some("supported: #bind, #bindEqual, #bindNotEqual, #bindObjectEqual, #bindObjectNotEqual, #result, #chain, #chunk"),
            ),
            other => format!("error: {}\n", other),
        }
    }
}

/// Result type alias for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_source() {
        let source = "SELECT * FROM A WHERE #bnd($x)";
        let err = TemplateError::UnknownDirective {
            name: "bnd".into(),
            span: Span::new(22, 27),
        };
        let out = err.format_with_source(source);
        assert!(out.contains("line 1:23"));
        assert!(out.contains("hint: supported"));
    }

    #[test]
    fn test_hint_only_on_parse_errors() {
        let err = TemplateError::Evaluation("boom".into()).with_hint("ignored");
        assert_eq!(err, TemplateError::Evaluation("boom".into()));
        assert!(err.span().is_none());
    }
}
