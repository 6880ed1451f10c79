//! Shared diagnostic sink used by every phase (lexer through IR generator).
//!
//! The list is append-only and ordering matches traversal order, which in
//! turn matches source order — this is what makes golden-output testing of
//! diagnostics deterministic (`spec.md` §5/§8 "Determinism").

use serde::{Deserialize, Serialize};

use crate::span::{SourceMap, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    /// Internal compiler error: an invariant was violated, almost always during
    /// IR generation where the analyzer should have already ruled it out.
    Ice,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Ice => "ice",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable, serializable diagnostic record. Field names and order match
/// `spec.md` §6's schema (`{severity, code, file, line, col, length, message,
/// notes[]}`) verbatim and must not be renamed without a corresponding note
/// in `DESIGN.md` — downstream tools depend on this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub file: String,
    pub line: u32,
    pub col: u32,
    pub length: u32,
    pub message: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: &'static str,
        span: Span,
        message: impl Into<String>,
        sources: &SourceMap,
    ) -> Self {
        let lc = sources.line_col(span.file, span.offset);
        Diagnostic {
            severity,
            code,
            file: sources.path(span.file).to_string(),
            line: lc.line,
            col: lc.column,
            length: span.length,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Per-translation-unit diagnostic accumulator. Passed explicitly as part of
/// the `CompileContext`; never global (`spec.md` §9 "Global state").
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| matches!(d.severity, Severity::Error | Severity::Ice))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FileId;

    #[test]
    fn has_errors_ignores_warnings() {
        let mut sources = SourceMap::new();
        let file = sources.add_file("a.ast", "package p;");
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(
            Severity::Warning,
            "W0001",
            Span::new(file, 0, 1),
            "unused import",
            &sources,
        ));

        assert!(!diags.has_errors());

        diags.push(Diagnostic::new(
            Severity::Error,
            "E0001",
            Span::new(FileId(0), 0, 1),
            "boom",
            &sources,
        ));

        assert!(diags.has_errors());
    }

    #[test]
    fn schema_serializes_with_stable_field_names() {
        let mut sources = SourceMap::new();
        let file = sources.add_file("a.ast", "x");
        let diag = Diagnostic::new(Severity::Error, "E0001", Span::new(file, 0, 1), "oops", &sources);

        let json = serde_json::to_value(&diag).unwrap();
        for field in ["severity", "code", "file", "line", "col", "length", "message", "notes"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }
}
