//! Symbols (`spec.md` §3 "Symbol"): name, kind, visibility, defining span,
//! plus the extra payload functions/structs/enums need (signature, field
//! list, variant list) — all addressed from elsewhere only by [`SymbolId`]
//! (`crate::types::SymbolId`), never by name, once resolution is done.

use crate::ast::Visibility;
use crate::span::Span;
use crate::types::{SymbolId, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Variable,
    Type,
    Constant,
    Module,
}

#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub params: Vec<TypeId>,
    pub ret: TypeId,
}

#[derive(Debug, Clone)]
pub struct StructInfo {
    pub fields: Vec<(String, TypeId)>,
}

impl StructInfo {
    pub fn field_type(&self, name: &str) -> Option<TypeId> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }
}

#[derive(Debug, Clone)]
pub struct EnumInfo {
    pub variants: Vec<(String, Option<TypeId>)>,
}

impl EnumInfo {
    pub fn variant(&self, name: &str) -> Option<&(String, Option<TypeId>)> {
        self.variants.iter().find(|(n, _)| n == name)
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub visibility: Visibility,
    pub span: Span,
    /// For `Variable`: the resolved type of the binding. For `Function`: the
    /// `Type::Function` type. For `Type` (struct/enum/alias): the resolved
    /// nominal/aliased type. Defaults to `TypeId` of `Type::Error` until pass
    /// 1b fills it in.
    pub type_id: TypeId,
    /// Only meaningful for `Variable` symbols (`let mut` bindings and, unlike
    /// `let`, never function parameters — params are immutable bindings,
    /// `spec.md` §4.3 has no parameter-mutability construct).
    pub mutable: bool,
    /// Set for `Function` symbols backed by an `extern "C"` declaration —
    /// calling one outside an `unsafe` block is a safety error (`spec.md`
    /// §4.3 "FFI and unsafe").
    pub is_extern: bool,
    pub signature: Option<FunctionSignature>,
    pub struct_info: Option<StructInfo>,
    pub enum_info: Option<EnumInfo>,
}

impl Symbol {
    pub fn placeholder(name: impl Into<String>, kind: SymbolKind, visibility: Visibility, span: Span, error_type: TypeId) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility,
            span,
            type_id: error_type,
            mutable: false,
            is_extern: false,
            signature: None,
            struct_info: None,
            enum_info: None,
        }
    }
}

/// Owns every symbol in a translation unit, addressed by [`SymbolId`]
/// (`spec.md` §3 "Symbols live for the translation unit").
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }
}
