//! Patterns, used in `match` arms (and nowhere else — Asthra has no
//! `if let`/`while let` sugar; `spec.md` §3 "Patterns (in match/if-let):
//! enum-variant constructor, identifier binding, wildcard").

use crate::ast::Spanned;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `Name.Variant` or `Name.Variant(bindings...)`, e.g. `E.A`, `Option.Some(x)`.
    Variant {
        enum_name: String,
        variant: String,
        bindings: Vec<Pattern>,
        span: Span,
    },
    Binding { name: String, span: Span },
    Wildcard { span: Span },
}

impl Spanned for Pattern {
    fn span(&self) -> Span {
        match self {
            Pattern::Variant { span, .. } => *span,
            Pattern::Binding { span, .. } => *span,
            Pattern::Wildcard { span } => *span,
        }
    }
}
