//! Declarations: package, import, function, extern function, struct, enum,
//! type alias (`spec.md` §3 "Declarations"). Every declaration carries an
//! explicit visibility.

use crate::ast::{Block, Spanned, TypeExpr};
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Pub,
    Priv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageDecl {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: String,
    pub span: Span,
}

/// A function parameter. `none` (the literal no-parameters marker, `spec.md`
/// §4.3 "the `none` parameter marker types as `unit`") is represented as an
/// empty `params` vector on the owning function, not as a sentinel param.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// FFI ownership annotation required on `extern "C"` pointer/slice
/// parameters (`spec.md` §4.3 "FFI and unsafe").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipAnnotation {
    TransferFull,
    TransferNone,
    Borrow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternParam {
    pub param: Param,
    pub ownership: Option<OwnershipAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl<T> {
    pub visibility: Visibility,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeExpr,
    pub body: Block<T>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternFunctionDecl {
    pub visibility: Visibility,
    pub name: String,
    /// The calling-convention string from `extern "C"`; always `"C"` in
    /// practice but kept textual since the grammar admits any string literal.
    pub abi: String,
    pub params: Vec<ExternParam>,
    pub return_type: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub visibility: Visibility,
    pub name: String,
    pub fields: Vec<(String, TypeExpr)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: String,
    pub payload: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub visibility: Visibility,
    pub name: String,
    pub variants: Vec<EnumVariant>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
    pub visibility: Visibility,
    pub name: String,
    pub target: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration<T> {
    Function(FunctionDecl<T>),
    ExternFunction(ExternFunctionDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    TypeAlias(TypeAliasDecl),
}

impl<T> Declaration<T> {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Function(f) => &f.name,
            Declaration::ExternFunction(f) => &f.name,
            Declaration::Struct(s) => &s.name,
            Declaration::Enum(e) => &e.name,
            Declaration::TypeAlias(a) => &a.name,
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Declaration::Function(f) => f.visibility,
            Declaration::ExternFunction(f) => f.visibility,
            Declaration::Struct(s) => s.visibility,
            Declaration::Enum(e) => e.visibility,
            Declaration::TypeAlias(a) => a.visibility,
        }
    }
}

impl<T> Spanned for Declaration<T> {
    fn span(&self) -> Span {
        match self {
            Declaration::Function(f) => f.span,
            Declaration::ExternFunction(f) => f.span,
            Declaration::Struct(s) => s.span,
            Declaration::Enum(e) => e.span,
            Declaration::TypeAlias(a) => a.span,
        }
    }
}
