use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::span::Span;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("lex error at {span}: {message}")]
    LexError { span: Span, message: String },
    #[error("parse error at {span}: {message}")]
    ParseError { span: Span, message: String },
    #[error("{} semantic error(s), first: {}", .0.len(), first_message(.0))]
    SemanticError(Vec<Diagnostic>),
    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn lex(span: Span, message: impl Into<String>) -> Self {
        CoreError::LexError {
            span,
            message: message.into(),
        }
    }

    pub(crate) fn parse(span: Span, message: impl Into<String>) -> Self {
        CoreError::ParseError {
            span,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        CoreError::Internal(message.into())
    }

    /// Flattens the error into the diagnostic list handed to tools.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            CoreError::LexError { span, message } => {
                vec![Diagnostic::error(message.clone(), *span).with_code("E0001")]
            }
            CoreError::ParseError { span, message } => {
                vec![Diagnostic::error(message.clone(), *span).with_code("E0101")]
            }
            CoreError::SemanticError(diagnostics) => diagnostics.clone(),
            CoreError::Internal(message) => vec![Diagnostic::internal(message.clone())],
        }
    }

    /// Returns true for errors caused by the compiler itself rather than
    /// the program being compiled.
    pub fn is_internal(&self) -> bool {
        matches!(self, CoreError::Internal(_))
    }
}

fn first_message(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    #[test]
    fn lex_errors_flatten_to_one_positioned_diagnostic() {
        let err = CoreError::lex(Span::new(2, 5), "unexpected character '@'");
        let diags = err.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].span, Span::new(2, 5));
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(err.to_string(), "lex error at 2:5: unexpected character '@'");
    }

    #[test]
    fn semantic_errors_keep_every_diagnostic() {
        let err = CoreError::SemanticError(vec![
            Diagnostic::error("first", Span::new(1, 1)),
            Diagnostic::error("second", Span::new(4, 2)),
        ]);
        assert_eq!(err.diagnostics().len(), 2);
        assert!(err.to_string().starts_with("2 semantic error(s)"));
        assert!(!err.is_internal());
    }

    #[test]
    fn internal_errors_are_flagged() {
        let err = CoreError::internal("missing symbol #4");
        assert!(err.is_internal());
        assert_eq!(err.diagnostics()[0].severity, Severity::Internal);
    }
}
