//! Diagnostic reporting with source locations
//!
//! Every failure the reader or the evaluator can raise is a [`LispError`]. Errors
//! carry the span of the offending form so front ends can render them with miette.

use crate::common::Span;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Source file for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }

    /// Attach this file to an error so the report shows the offending line
    pub fn report(&self, error: LispError) -> miette::Report {
        miette::Report::new(error).with_source_code(self.to_named_source())
    }
}

/// Convert our Span to miette's SourceSpan
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// Interpreter diagnostic
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum LispError {
    // === Syntax Errors ===
    #[error("invalid syntax: unclosed `(`")]
    #[diagnostic(code(syntax::unclosed_paren))]
    UnclosedParen {
        #[label("this parenthesis is never closed")]
        span: SourceSpan,
    },

    #[error("invalid syntax: unexpected `)`")]
    #[diagnostic(code(syntax::unexpected_close_paren))]
    UnexpectedCloseParen {
        #[label("no matching `(`")]
        span: SourceSpan,
    },

    #[error("invalid syntax: {message}")]
    #[diagnostic(code(syntax::invalid))]
    Syntax {
        message: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("invalid id: {name}")]
    #[diagnostic(
        code(syntax::invalid_id),
        help("identifiers start with a lowercase letter followed by lowercase letters or `-`")
    )]
    InvalidIdentifier {
        name: String,
        #[label("not a valid identifier")]
        span: SourceSpan,
    },

    // === Call Errors ===
    #[error("`{function}` expects {expected}, got {found}")]
    #[diagnostic(code(eval::arity))]
    Arity {
        function: String,
        expected: String,
        found: usize,
        #[label("wrong number of arguments")]
        span: SourceSpan,
    },

    #[error("`{function}` expects argument {position} with type {expected}, but got {found}")]
    #[diagnostic(code(eval::type_mismatch))]
    Type {
        function: String,
        position: usize,
        expected: String,
        found: String,
        #[label("expected `{expected}`")]
        span: SourceSpan,
    },

    #[error("undefined variable: {name}")]
    #[diagnostic(
        code(eval::undefined_var),
        help("did you mean to declare it with `define`?")
    )]
    UndefinedVariable {
        name: String,
        #[label("not found in this scope")]
        span: SourceSpan,
    },

    #[error("undefined function: {name}")]
    #[diagnostic(code(eval::undefined_fn))]
    UndefinedFunction {
        name: String,
        #[label("not found in this scope")]
        span: SourceSpan,
    },

    #[error("expected a function, but got {found}")]
    #[diagnostic(code(eval::not_callable))]
    NotCallable {
        found: String,
        #[label("called here")]
        span: SourceSpan,
    },

    #[error("missing function")]
    #[diagnostic(code(eval::missing_fn))]
    MissingFunction {
        #[label("empty form")]
        span: SourceSpan,
    },

    #[error("calling an incomplete function: {name}")]
    #[diagnostic(
        code(eval::incomplete_fn),
        help("a name can only refer to itself from inside a `fun` body")
    )]
    IncompleteFunction {
        name: String,
        #[label("`{name}` is still being defined")]
        span: SourceSpan,
    },

    // === Arithmetic Errors ===
    #[error("division by zero in `{function}`")]
    #[diagnostic(code(eval::division_by_zero))]
    DivisionByZero {
        function: String,
        #[label("divisor is zero")]
        span: SourceSpan,
    },

    #[error("integer overflow in `{function}`")]
    #[diagnostic(code(eval::overflow))]
    Overflow {
        function: String,
        #[label("result does not fit in 64 bits")]
        span: SourceSpan,
    },

    #[error("recursion limit of {limit} exceeded")]
    #[diagnostic(code(eval::recursion_limit))]
    RecursionLimit {
        limit: usize,
        #[label("evaluation nested too deeply here")]
        span: SourceSpan,
    },
}

impl LispError {
    /// Whether this error is reported as `invalid syntax`
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            LispError::UnclosedParen { .. }
                | LispError::UnexpectedCloseParen { .. }
                | LispError::Syntax { .. }
        )
    }

    /// Source span of the failing form
    pub fn span(&self) -> SourceSpan {
        match self {
            LispError::UnclosedParen { span }
            | LispError::UnexpectedCloseParen { span }
            | LispError::Syntax { span, .. }
            | LispError::InvalidIdentifier { span, .. }
            | LispError::Arity { span, .. }
            | LispError::Type { span, .. }
            | LispError::UndefinedVariable { span, .. }
            | LispError::UndefinedFunction { span, .. }
            | LispError::NotCallable { span, .. }
            | LispError::MissingFunction { span }
            | LispError::IncompleteFunction { span, .. }
            | LispError::DivisionByZero { span, .. }
            | LispError::Overflow { span, .. }
            | LispError::RecursionLimit { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_conversion() {
        let span: SourceSpan = Span::new(4, 9).into();
        assert_eq!(span.offset(), 4);
        assert_eq!(span.len(), 5);
    }

    #[test]
    fn test_report_attaches_source() {
        let file = SourceFile::new("test.lisp", "(+ 1 #t)");
        let error = LispError::Type {
            function: "+".into(),
            position: 2,
            expected: "int".into(),
            found: "bool".into(),
            span: Span::new(5, 7).into(),
        };
        let report = file.report(error);
        assert_eq!(
            report.to_string(),
            "`+` expects argument 2 with type int, but got bool"
        );
    }

    #[test]
    fn test_syntax_classification() {
        let span: SourceSpan = Span::new(0, 1).into();
        assert!(LispError::UnclosedParen { span }.is_syntax_error());
        assert!(!LispError::MissingFunction { span }.is_syntax_error());
    }
}
