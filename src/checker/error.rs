//! Closed taxonomy of resolution/type/safety errors (`spec.md` §7
//! "Resolution errors", "Type errors", "Safety errors"), each converting to
//! exactly one [`Diagnostic`] — grounded in the teacher's
//! `typechecker::error::TypeCheckError` enum + `Display` (`crates/why_lib/
//! src/typechecker/error.rs`), generalized to Asthra's error set.

use crate::diagnostics::{Diagnostic, Severity};
use crate::span::{SourceMap, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum SemanticError {
    UnknownName {
        name: String,
        span: Span,
    },
    DuplicateDeclaration {
        name: String,
        span: Span,
        first_span: Span,
    },
    VisibilityViolation {
        name: String,
        span: Span,
    },
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },
    NonExhaustiveMatch {
        missing: Vec<String>,
        span: Span,
    },
    WrongArgumentCount {
        expected: usize,
        found: usize,
        span: Span,
    },
    NotCallable {
        span: Span,
    },
    AssignmentToImmutable {
        name: String,
        span: Span,
    },
    NonBooleanCondition {
        span: Span,
    },
    ArrayLengthMismatch {
        declared: u64,
        found: usize,
        span: Span,
    },
    MissingExplicitUnitReturn {
        span: Span,
    },
    FfiCallOutsideUnsafe {
        name: String,
        span: Span,
    },
    RawPointerDerefOutsideUnsafe {
        span: Span,
    },
    MissingOwnershipAnnotation {
        param: String,
        span: Span,
    },
    MutableBorrowOfImmutable {
        span: Span,
    },
    UnknownField {
        field: String,
        span: Span,
    },
    UnknownVariant {
        name: String,
        span: Span,
    },
}

impl SemanticError {
    fn code(&self) -> &'static str {
        match self {
            SemanticError::UnknownName { .. } => "E-SEMA-UNKNOWN-NAME",
            SemanticError::DuplicateDeclaration { .. } => "E-SEMA-DUPLICATE-DECLARATION",
            SemanticError::VisibilityViolation { .. } => "E-SEMA-VISIBILITY-VIOLATION",
            SemanticError::TypeMismatch { .. } => "E-SEMA-TYPE-MISMATCH",
            SemanticError::NonExhaustiveMatch { .. } => "E-SEMA-NON-EXHAUSTIVE-MATCH",
            SemanticError::WrongArgumentCount { .. } => "E-SEMA-WRONG-ARGUMENT-COUNT",
            SemanticError::NotCallable { .. } => "E-SEMA-NOT-CALLABLE",
            SemanticError::AssignmentToImmutable { .. } => "E-SEMA-ASSIGN-TO-IMMUTABLE",
            SemanticError::NonBooleanCondition { .. } => "E-SEMA-NON-BOOLEAN-CONDITION",
            SemanticError::ArrayLengthMismatch { .. } => "E-SEMA-ARRAY-LENGTH-MISMATCH",
            SemanticError::MissingExplicitUnitReturn { .. } => "E-SEMA-MISSING-UNIT-RETURN",
            SemanticError::FfiCallOutsideUnsafe { .. } => "E-SEMA-FFI-OUTSIDE-UNSAFE",
            SemanticError::RawPointerDerefOutsideUnsafe { .. } => "E-SEMA-DEREF-OUTSIDE-UNSAFE",
            SemanticError::MissingOwnershipAnnotation { .. } => "E-SEMA-MISSING-OWNERSHIP",
            SemanticError::MutableBorrowOfImmutable { .. } => "E-SEMA-MUTABLE-BORROW-OF-IMMUTABLE",
            SemanticError::UnknownField { .. } => "E-SEMA-UNKNOWN-FIELD",
            SemanticError::UnknownVariant { .. } => "E-SEMA-UNKNOWN-VARIANT",
        }
    }

    fn span(&self) -> Span {
        match *self {
            SemanticError::UnknownName { span, .. }
            | SemanticError::DuplicateDeclaration { span, .. }
            | SemanticError::VisibilityViolation { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::NonExhaustiveMatch { span, .. }
            | SemanticError::WrongArgumentCount { span, .. }
            | SemanticError::NotCallable { span }
            | SemanticError::AssignmentToImmutable { span, .. }
            | SemanticError::NonBooleanCondition { span }
            | SemanticError::ArrayLengthMismatch { span, .. }
            | SemanticError::MissingExplicitUnitReturn { span }
            | SemanticError::FfiCallOutsideUnsafe { span, .. }
            | SemanticError::RawPointerDerefOutsideUnsafe { span }
            | SemanticError::MissingOwnershipAnnotation { span, .. }
            | SemanticError::MutableBorrowOfImmutable { span }
            | SemanticError::UnknownField { span, .. }
            | SemanticError::UnknownVariant { span, .. } => span,
        }
    }

    fn message(&self) -> String {
        match self {
            SemanticError::UnknownName { name, .. } => format!("unknown name '{name}'"),
            SemanticError::DuplicateDeclaration { name, .. } => format!("'{name}' is already declared in this scope"),
            SemanticError::VisibilityViolation { name, .. } => format!("'{name}' is private and not visible here"),
            SemanticError::TypeMismatch { expected, found, .. } => {
                format!("expected type '{expected}', found '{found}'")
            }
            SemanticError::NonExhaustiveMatch { missing, .. } => {
                format!("non-exhaustive match: missing variant {}", missing.join(", "))
            }
            SemanticError::WrongArgumentCount { expected, found, .. } => {
                format!("expected {expected} argument(s), found {found}")
            }
            SemanticError::NotCallable { .. } => "called expression is not a function".to_string(),
            SemanticError::AssignmentToImmutable { name, .. } => format!("cannot assign to immutable binding '{name}'"),
            SemanticError::NonBooleanCondition { .. } => "condition must have type 'bool'".to_string(),
            SemanticError::ArrayLengthMismatch { declared, found, .. } => {
                format!("array literal has {found} element(s), declared length is {declared}")
            }
            SemanticError::MissingExplicitUnitReturn { .. } => {
                "a function returning 'void' must end with 'return ();'".to_string()
            }
            SemanticError::FfiCallOutsideUnsafe { name, .. } => {
                format!("call to extern function '{name}' requires an unsafe block")
            }
            SemanticError::RawPointerDerefOutsideUnsafe { .. } => "dereferencing a raw pointer requires an unsafe block".to_string(),
            SemanticError::MissingOwnershipAnnotation { param, .. } => {
                format!("extern parameter '{param}' requires an ownership annotation")
            }
            SemanticError::MutableBorrowOfImmutable { .. } => "cannot take a mutable reference to an immutable binding".to_string(),
            SemanticError::UnknownField { field, .. } => format!("unknown field '{field}'"),
            SemanticError::UnknownVariant { name, .. } => format!("unknown enum variant '{name}'"),
        }
    }

    pub fn into_diagnostic(self, sources: &SourceMap) -> Diagnostic {
        let code = self.code();
        let span = self.span();
        let message = self.message();
        let mut diag = Diagnostic::new(Severity::Error, code, span, message, sources);
        if let SemanticError::DuplicateDeclaration { first_span, .. } = self {
            diag = diag.with_note(format!("first declared at {}", sources.line_col(first_span.file, first_span.offset)));
        }
        diag
    }
}
