//! User-facing diagnostics.
//!
//! Every error the pipeline reports to a user is flattened into a list of
//! `Diagnostic` values carrying a severity, a message and the line/column
//! of the offending source construct.

use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A problem in the compiled program.
    Error,
    /// A broken compiler invariant; never caused by valid or invalid input
    /// alone.
    Internal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Internal => f.write_str("internal error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// Stable short code, e.g. `E0001`.
    pub code: Option<&'static str>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            span,
            code: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Internal,
            message: message.into(),
            span: Span::start(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_position_severity_and_code() {
        let diag = Diagnostic::error("use of undeclared identifier 'x'", Span::new(3, 7))
            .with_code("E0201");
        assert_eq!(
            diag.to_string(),
            "3:7: error[E0201]: use of undeclared identifier 'x'"
        );
        assert_eq!(diag.line(), 3);
        assert_eq!(diag.column(), 7);
    }

    #[test]
    fn internal_diagnostics_are_distinct_from_errors() {
        let diag = Diagnostic::internal("label table corrupted");
        assert_eq!(diag.severity, Severity::Internal);
        assert!(diag.to_string().contains("internal error"));
    }
}
