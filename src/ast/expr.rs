//! Expressions (`spec.md` §3 "Expressions") and the block/match-arm helper
//! structs they're built from. Every variant carries an `info: T` slot —
//! `()` until the semantic analyzer resolves it to a [`crate::types::Type`]
//! (`spec.md` §3 "Expressions carry a mutable type slot").

use crate::ast::{Pattern, Spanned, Statement, TypeExpr};
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Deref,
    Ref { mutable: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Comparisons do not associate (`spec.md` §4.2 "chained comparisons are
    /// a syntax error") — the precedence-climbing parser consults this to
    /// refuse `a < b < c` instead of silently left-associating it.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::And)
    }
}

/// A `{ ... }` block. `tail` is the trailing expression with no semicolon,
/// if any — this is exactly `spec.md` §4.3 "A block's type is the type of
/// its final expression, or `unit` if the block ends with a statement":
/// `tail.is_none()` means the block ends with a statement, full stop, rather
/// than requiring the checker to inspect whether the last `Statement::Expr`
/// happened to be semicolon-terminated.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<T> {
    pub statements: Vec<Statement<T>>,
    pub tail: Option<Box<Expression<T>>>,
    pub info: T,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm<T> {
    pub pattern: Pattern,
    pub body: Expression<T>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression<T> {
    IntLiteral { value: u64, info: T, span: Span },
    FloatLiteral { value: f64, info: T, span: Span },
    BoolLiteral { value: bool, info: T, span: Span },
    StringLiteral { value: String, info: T, span: Span },
    CharLiteral { value: char, info: T, span: Span },
    /// The unit value `()`, written explicitly (e.g. `return ();`).
    UnitLiteral { info: T, span: Span },
    Ident { name: String, info: T, span: Span },
    Field {
        base: Box<Expression<T>>,
        field: String,
        info: T,
        span: Span,
    },
    Index {
        base: Box<Expression<T>>,
        index: Box<Expression<T>>,
        info: T,
        span: Span,
    },
    Call {
        callee: Box<Expression<T>>,
        args: Vec<Expression<T>>,
        info: T,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression<T>>,
        info: T,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression<T>>,
        rhs: Box<Expression<T>>,
        info: T,
        span: Span,
    },
    Cast {
        expr: Box<Expression<T>>,
        target: TypeExpr,
        info: T,
        span: Span,
    },
    Block(Block<T>),
    If {
        condition: Box<Expression<T>>,
        then_branch: Block<T>,
        else_branch: Option<Box<Expression<T>>>,
        info: T,
        span: Span,
    },
    Match {
        scrutinee: Box<Expression<T>>,
        arms: Vec<MatchArm<T>>,
        info: T,
        span: Span,
    },
    Spawn {
        call: Box<Expression<T>>,
        info: T,
        span: Span,
    },
    Await {
        expr: Box<Expression<T>>,
        info: T,
        span: Span,
    },
    /// `unsafe { ... }` — the only place FFI calls and raw-pointer derefs are
    /// permitted (`spec.md` §4.3 "FFI and unsafe").
    Unsafe(Block<T>),
}

impl<T> Expression<T>
where
    T: Clone,
{
    pub fn get_info(&self) -> T {
        match self {
            Expression::IntLiteral { info, .. }
            | Expression::FloatLiteral { info, .. }
            | Expression::BoolLiteral { info, .. }
            | Expression::StringLiteral { info, .. }
            | Expression::CharLiteral { info, .. }
            | Expression::UnitLiteral { info, .. }
            | Expression::Ident { info, .. }
            | Expression::Field { info, .. }
            | Expression::Index { info, .. }
            | Expression::Call { info, .. }
            | Expression::Unary { info, .. }
            | Expression::Binary { info, .. }
            | Expression::Cast { info, .. }
            | Expression::If { info, .. }
            | Expression::Match { info, .. }
            | Expression::Spawn { info, .. }
            | Expression::Await { info, .. } => info.clone(),
            Expression::Block(b) | Expression::Unsafe(b) => b.info.clone(),
        }
    }
}

impl<T> Spanned for Expression<T>
where
    T: Clone,
{
    fn span(&self) -> Span {
        match self {
            Expression::IntLiteral { span, .. }
            | Expression::FloatLiteral { span, .. }
            | Expression::BoolLiteral { span, .. }
            | Expression::StringLiteral { span, .. }
            | Expression::CharLiteral { span, .. }
            | Expression::UnitLiteral { span, .. }
            | Expression::Ident { span, .. }
            | Expression::Field { span, .. }
            | Expression::Index { span, .. }
            | Expression::Call { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Cast { span, .. }
            | Expression::If { span, .. }
            | Expression::Match { span, .. }
            | Expression::Spawn { span, .. }
            | Expression::Await { span, .. } => *span,
            Expression::Block(b) | Expression::Unsafe(b) => b.span,
        }
    }
}
