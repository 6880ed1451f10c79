//! Parse error representation. Kept distinct from [`crate::diagnostics::Diagnostic`]
//! so grammar functions can return `Result<_, ParseError>` ergonomically;
//! [`ParseError::into_diagnostic`] is the single conversion site, mirroring
//! the teacher's `TypeCheckError -> Diagnostic`-style boundary
//! (`crates/why_lib/src/typechecker/error.rs`).

use crate::diagnostics::{Diagnostic, Severity};
use crate::span::{SourceMap, Span};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub code: &'static str,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn new(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn into_diagnostic(self, sources: &SourceMap) -> Diagnostic {
        let mut diag = Diagnostic::new(Severity::Error, self.code, self.span, self.message, sources);
        for note in self.notes {
            diag = diag.with_note(note);
        }
        diag
    }
}
