//! Two-pass semantic analyzer (`spec.md` §4.3): pass 1 hoists every
//! top-level declaration into the module scope with a placeholder type and
//! catches duplicate names; pass 1b resolves every declaration's syntactic
//! signature now that every name exists (so structs/enums/functions may
//! reference each other regardless of source order); pass 2 walks each
//! declaration's body depth-first doing name resolution, bidirectional type
//! checking, exhaustiveness, and the FFI/unsafe safety checks. Grounded in
//! the teacher's two-pass `Typechecker::check` plus `extract_exports`
//! pre-pass (`src/typechecker/mod.rs`), generalized from Y's single-scope
//! walk to Asthra's module-then-function nesting.

pub mod error;
pub mod scope;
pub mod symbol;

use crate::ast::{
    Block, Declaration, Expression, ExternFunctionDecl, ExternParam, FunctionDecl, MatchArm,
    Module, Pattern, Spanned, Statement, TypeExpr, UnaryOp, Visibility,
};
use crate::checker::error::SemanticError;
use crate::checker::scope::{ScopeId, ScopeTree};
use crate::checker::symbol::{EnumInfo, FunctionSignature, Symbol, SymbolKind, SymbolTable, StructInfo};
use crate::diagnostics::Diagnostics;
use crate::span::{SourceMap, Span};
use crate::types::{SymbolId, Type, TypeId, TypeInterner};

/// Output of semantic analysis: the AST with every expression's `info` slot
/// resolved to a [`TypeId`], plus the symbol table it was checked against.
/// `spec.md` §2's "Typed AST + Symbol Table" artifact.
pub struct Analysis {
    pub module: Module<TypeId>,
    pub symbols: SymbolTable,
}

/// Entry point the pipeline calls after parsing (`spec.md` §4.3). Diagnostics
/// accumulate in `diags`; an error-severity diagnostic anywhere blocks IR
/// generation (checked by the caller via `diags.has_errors()`), but analysis
/// itself never aborts early — every declaration is still visited so as many
/// diagnostics as possible surface per run (`spec.md` §7).
pub fn check_module(
    module: Module<()>,
    interner: &mut TypeInterner,
    sources: &SourceMap,
    diags: &mut Diagnostics,
) -> Analysis {
    let mut analyzer = Analyzer::new(interner, sources, diags);
    analyzer.run(module)
}

struct Analyzer<'a> {
    interner: &'a mut TypeInterner,
    sources: &'a SourceMap,
    diags: &'a mut Diagnostics,
    symbols: SymbolTable,
    scopes: ScopeTree,
    module_scope: ScopeId,
    /// Return type of the function currently being checked in pass 2.
    current_return: TypeId,
    /// Whether the walker is currently inside an `unsafe { ... }` block
    /// (`spec.md` §4.3 "FFI and unsafe").
    in_unsafe: bool,
}

impl<'a> Analyzer<'a> {
    fn new(interner: &'a mut TypeInterner, sources: &'a SourceMap, diags: &'a mut Diagnostics) -> Self {
        let (scopes, module_scope) = ScopeTree::new();
        let current_return = interner.well_known.unit;
        Self {
            interner,
            sources,
            diags,
            symbols: SymbolTable::new(),
            scopes,
            module_scope,
            current_return,
            in_unsafe: false,
        }
    }

    fn error(&mut self, err: SemanticError) {
        self.diags.push(err.into_diagnostic(self.sources));
    }

    fn run(&mut self, module: Module<()>) -> Analysis {
        let error_type = self.interner.well_known.error;

        // Pass 1: hoist every top-level name with a placeholder type.
        let mut item_symbols = Vec::with_capacity(module.items.len());
        for item in &module.items {
            let kind = match item {
                Declaration::Function(_) | Declaration::ExternFunction(_) => SymbolKind::Function,
                Declaration::Struct(_) | Declaration::Enum(_) | Declaration::TypeAlias(_) => SymbolKind::Type,
            };
            let symbol = Symbol::placeholder(item.name(), kind, item.visibility(), item.span(), error_type);
            let id = self.symbols.insert(symbol);
            if let Err(existing) = self.scopes.declare(self.module_scope, item.name(), id) {
                let first_span = self.symbols.get(existing).span;
                self.error(SemanticError::DuplicateDeclaration {
                    name: item.name().to_string(),
                    span: item.span(),
                    first_span,
                });
            }
            item_symbols.push(id);
        }

        // Pass 1b: resolve every declaration's syntactic signature now that
        // every name in the module is known, so order of declaration within
        // the file does not matter.
        for (item, &id) in module.items.iter().zip(&item_symbols) {
            self.resolve_signature(item, id);
        }

        // Pass 2: depth-first check of each declaration's body.
        let items = module
            .items
            .into_iter()
            .zip(item_symbols)
            .map(|(item, id)| self.check_declaration(item, id))
            .collect();

        Analysis {
            module: Module::new(module.package, module.imports, items),
            symbols: std::mem::take(&mut self.symbols),
        }
    }

    // ---- type resolution -------------------------------------------------

    /// Resolves a syntactic [`TypeExpr`] to a semantic [`TypeId`], reporting
    /// an [`SemanticError::UnknownName`] for any name that is neither a
    /// primitive nor a declared struct/enum/alias.
    fn resolve_type_expr(&mut self, ty: &TypeExpr) -> TypeId {
        match ty {
            TypeExpr::Named { name, span } => self.resolve_named_type(name, *span),
            TypeExpr::Pointer { pointee, mutable, .. } => {
                let pointee = self.resolve_type_expr(pointee);
                self.interner.intern(Type::Pointer { pointee, mutable: *mutable })
            }
            TypeExpr::Slice { element, mutable, .. } => {
                let element = self.resolve_type_expr(element);
                self.interner.intern(Type::Slice { element, mutable: *mutable })
            }
            TypeExpr::Array { element, length, .. } => {
                let element = self.resolve_type_expr(element);
                self.interner.intern(Type::Array { element, length: *length })
            }
            TypeExpr::Function { params, return_type, .. } => {
                let params = params.iter().map(|p| self.resolve_type_expr(p)).collect();
                let ret = self.resolve_type_expr(return_type);
                self.interner.intern(Type::Function { params, ret })
            }
            TypeExpr::Generic { name, args, span } => self.resolve_generic_type(name, args, *span),
        }
    }

    fn resolve_named_type(&mut self, name: &str, span: Span) -> TypeId {
        if let Some(id) = self.interner.by_name(name) {
            return id;
        }
        if let Some(sym_id) = self.scopes.resolve(self.module_scope, name) {
            if self.symbols.get(sym_id).kind == SymbolKind::Type {
                return self.symbols.get(sym_id).type_id;
            }
        }
        self.error(SemanticError::UnknownName { name: name.to_string(), span });
        self.interner.well_known.error
    }

    fn resolve_generic_type(&mut self, name: &str, args: &[TypeExpr], span: Span) -> TypeId {
        match (name, args.len()) {
            ("Result", 2) => {
                let ok = self.resolve_type_expr(&args[0]);
                let err = self.resolve_type_expr(&args[1]);
                self.interner.intern(Type::Result { ok, err })
            }
            ("Option", 1) => {
                let some = self.resolve_type_expr(&args[0]);
                self.interner.intern(Type::Option { some })
            }
            _ => {
                self.error(SemanticError::UnknownName { name: name.to_string(), span });
                self.interner.well_known.error
            }
        }
    }

    /// `void` written as a function's return type is sugar for "this
    /// function returns `unit` and must end with an explicit `return ();`"
    /// (`spec.md` §8 scenario 1 renders such a signature as `() -> unit` in
    /// the IR). True `Type::Void` — no value at all — is reserved for
    /// `extern "C"` declarations at the FFI boundary. Recorded as a decided
    /// open question in `DESIGN.md`.
    fn resolve_function_return_type(&mut self, ty: &TypeExpr) -> (TypeId, bool) {
        if let TypeExpr::Named { name, .. } = ty {
            if name == "void" {
                return (self.interner.well_known.unit, true);
            }
        }
        (self.resolve_type_expr(ty), false)
    }

    fn describe_type(&self, id: TypeId) -> String {
        match self.interner.resolve(id) {
            Type::I8 => "i8".into(),
            Type::I16 => "i16".into(),
            Type::I32 => "i32".into(),
            Type::I64 => "i64".into(),
            Type::U8 => "u8".into(),
            Type::U16 => "u16".into(),
            Type::U32 => "u32".into(),
            Type::U64 => "u64".into(),
            Type::F32 => "f32".into(),
            Type::F64 => "f64".into(),
            Type::Bool => "bool".into(),
            Type::Char => "char".into(),
            Type::Str => "string".into(),
            Type::Void => "void".into(),
            Type::Unit => "unit".into(),
            Type::Never => "never".into(),
            Type::Error => "<error>".into(),
            Type::Pointer { pointee, mutable } => {
                format!("*{}{}", if *mutable { "mut " } else { "" }, self.describe_type(*pointee))
            }
            Type::Slice { element, mutable } => {
                format!("[]{}{}", if *mutable { "mut " } else { "" }, self.describe_type(*element))
            }
            Type::Array { element, length } => format!("[{}]{}", length, self.describe_type(*element)),
            Type::Struct(sym) | Type::Enum(sym) => self.symbols.get(*sym).name.clone(),
            Type::Function { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| self.describe_type(*p)).collect();
                format!("fn({}) -> {}", params.join(", "), self.describe_type(*ret))
            }
            Type::Result { ok, err } => format!("Result<{}, {}>", self.describe_type(*ok), self.describe_type(*err)),
            Type::Option { some } => format!("Option<{}>", self.describe_type(*some)),
        }
    }

    fn mismatch(&mut self, expected: TypeId, found: TypeId, span: Span) {
        if matches!(self.interner.resolve(found), Type::Error) || matches!(self.interner.resolve(expected), Type::Error) {
            return;
        }
        self.error(SemanticError::TypeMismatch {
            expected: self.describe_type(expected),
            found: self.describe_type(found),
            span,
        });
    }

    // ---- pass 1b: signatures ----------------------------------------------

    fn resolve_signature(&mut self, item: &Declaration<()>, id: SymbolId) {
        match item {
            Declaration::Function(f) => {
                let params = f.params.iter().map(|p| self.resolve_type_expr(&p.ty)).collect::<Vec<_>>();
                let (ret, _) = self.resolve_function_return_type(&f.return_type);
                let function_ty = self.interner.intern(Type::Function { params: params.clone(), ret });
                let symbol = self.symbols.get_mut(id);
                symbol.type_id = function_ty;
                symbol.signature = Some(FunctionSignature { params, ret });
            }
            Declaration::ExternFunction(f) => {
                self.check_extern_ownership(f);
                let params = f
                    .params
                    .iter()
                    .map(|p| self.resolve_type_expr(&p.param.ty))
                    .collect::<Vec<_>>();
                let ret = self.resolve_type_expr(&f.return_type);
                let function_ty = self.interner.intern(Type::Function { params: params.clone(), ret });
                let symbol = self.symbols.get_mut(id);
                symbol.type_id = function_ty;
                symbol.signature = Some(FunctionSignature { params, ret });
                symbol.is_extern = true;
            }
            Declaration::Struct(s) => {
                let fields = s
                    .fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), self.resolve_type_expr(ty)))
                    .collect::<Vec<_>>();
                let symbol = self.symbols.get_mut(id);
                symbol.type_id = self.interner.intern(Type::Struct(id));
                symbol.struct_info = Some(StructInfo { fields });
            }
            Declaration::Enum(e) => {
                let variants = e
                    .variants
                    .iter()
                    .map(|v| (v.name.clone(), v.payload.as_ref().map(|t| self.resolve_type_expr(t))))
                    .collect::<Vec<_>>();
                let symbol = self.symbols.get_mut(id);
                symbol.type_id = self.interner.intern(Type::Enum(id));
                symbol.enum_info = Some(EnumInfo { variants });
            }
            Declaration::TypeAlias(a) => {
                let target = self.resolve_type_expr(&a.target);
                self.symbols.get_mut(id).type_id = target;
            }
        }
    }

    /// `extern "C"` pointer/slice parameters require an ownership annotation
    /// (`spec.md` §4.3 "FFI and unsafe").
    fn check_extern_ownership(&mut self, f: &ExternFunctionDecl) {
        for ExternParam { param, ownership } in &f.params {
            let needs_annotation = matches!(param.ty, TypeExpr::Pointer { .. } | TypeExpr::Slice { .. });
            if needs_annotation && ownership.is_none() {
                self.error(SemanticError::MissingOwnershipAnnotation {
                    param: param.name.clone(),
                    span: param.span,
                });
            }
        }
    }

    // ---- pass 2: declarations ---------------------------------------------

    fn check_declaration(&mut self, item: Declaration<()>, id: SymbolId) -> Declaration<TypeId> {
        match item {
            Declaration::Function(f) => Declaration::Function(self.check_function(f, id)),
            Declaration::ExternFunction(f) => Declaration::ExternFunction(f),
            Declaration::Struct(s) => Declaration::Struct(s),
            Declaration::Enum(e) => Declaration::Enum(e),
            Declaration::TypeAlias(a) => Declaration::TypeAlias(a),
        }
    }

    fn check_function(&mut self, f: FunctionDecl<()>, id: SymbolId) -> FunctionDecl<TypeId> {
        let fn_scope = self.scopes.child_of(self.module_scope);
        for param in &f.params {
            let ty = self.resolve_type_expr(&param.ty);
            let symbol = Symbol {
                mutable: false,
                ..Symbol::placeholder(param.name.clone(), SymbolKind::Variable, Visibility::Priv, param.span, ty)
            };
            let param_id = self.symbols.insert(symbol);
            if let Err(existing) = self.scopes.declare(fn_scope, &param.name, param_id) {
                let first_span = self.symbols.get(existing).span;
                self.error(SemanticError::DuplicateDeclaration {
                    name: param.name.clone(),
                    span: param.span,
                    first_span,
                });
            }
        }

        let (ret, is_void_sugar) = self.resolve_function_return_type(&f.return_type);
        self.current_return = ret;

        let last_is_return = matches!(f.body.statements.last(), Some(Statement::Return { .. }));
        let last_is_unit_return = matches!(
            f.body.statements.last(),
            Some(Statement::Return { value: Some(Expression::UnitLiteral { .. }), .. })
        );
        let body_span = f.body.span;
        let body = self.check_block(f.body, fn_scope, Some(ret));

        if is_void_sugar {
            if !last_is_unit_return {
                self.error(SemanticError::MissingExplicitUnitReturn { span: body_span });
            }
        } else if body.tail.is_none() && !last_is_return {
            self.mismatch(ret, self.interner.well_known.unit, body_span);
        } else if let Some(tail) = &body.tail {
            let found = tail.get_info();
            if !self.interner.is_assignable(found, ret) {
                self.mismatch(ret, found, tail.span());
            }
        }

        let _ = id;
        FunctionDecl {
            visibility: f.visibility,
            name: f.name,
            params: f.params,
            return_type: f.return_type,
            body,
            span: f.span,
        }
    }

    // ---- pass 2: statements & expressions ---------------------------------

    fn check_block(&mut self, block: Block<()>, scope: ScopeId, expected: Option<TypeId>) -> Block<TypeId> {
        let inner = self.scopes.child_of(scope);
        let statements = block
            .statements
            .into_iter()
            .map(|s| self.check_statement(s, inner))
            .collect();
        let tail = block.tail.map(|e| Box::new(self.check_expr(*e, inner, expected)));
        let info = tail
            .as_ref()
            .map(|e| e.get_info())
            .unwrap_or(self.interner.well_known.unit);
        Block {
            statements,
            tail,
            info,
            span: block.span,
        }
    }

    fn check_statement(&mut self, stmt: Statement<()>, scope: ScopeId) -> Statement<TypeId> {
        match stmt {
            Statement::Let { name, mutable, ty, initializer, span } => {
                let ty_id = self.resolve_type_expr(&ty);
                let initializer = initializer.map(|e| {
                    let checked = self.check_expr(e, scope, Some(ty_id));
                    let found = checked.get_info();
                    if !self.interner.is_assignable(found, ty_id) {
                        self.mismatch(ty_id, found, checked.span());
                    }
                    checked
                });
                let symbol = Symbol {
                    mutable,
                    ..Symbol::placeholder(name.clone(), SymbolKind::Variable, Visibility::Priv, span, ty_id)
                };
                let sym_id = self.symbols.insert(symbol);
                if let Err(existing) = self.scopes.declare(scope, &name, sym_id) {
                    let first_span = self.symbols.get(existing).span;
                    self.error(SemanticError::DuplicateDeclaration { name: name.clone(), span, first_span });
                }
                Statement::Let { name, mutable, ty, initializer, span }
            }
            Statement::Assign { target, value, span } => {
                let target = self.check_expr(target, scope, None);
                let value = self.check_expr(value, scope, Some(target.get_info()));
                if let Expression::Ident { name, span: ident_span, .. } = &target {
                    if let Some(sym_id) = self.scopes.resolve(scope, name) {
                        if !self.symbols.get(sym_id).mutable {
                            self.error(SemanticError::AssignmentToImmutable { name: name.clone(), span: *ident_span });
                        }
                    }
                }
                let found = value.get_info();
                if !self.interner.is_assignable(found, target.get_info()) {
                    self.mismatch(target.get_info(), found, value.span());
                }
                Statement::Assign { target, value, span }
            }
            Statement::Expr(e) => Statement::Expr(self.check_expr(e, scope, None)),
            Statement::Return { value, span } => {
                let expected = self.current_return;
                let value = value.map(|e| {
                    let checked = self.check_expr(e, scope, Some(expected));
                    let found = checked.get_info();
                    if !self.interner.is_assignable(found, expected) {
                        self.mismatch(expected, found, checked.span());
                    }
                    checked
                });
                if value.is_none() && !matches!(self.interner.resolve(expected), Type::Unit) {
                    self.mismatch(expected, self.interner.well_known.unit, span);
                }
                Statement::Return { value, span }
            }
        }
    }

    fn check_expr(&mut self, expr: Expression<()>, scope: ScopeId, expected: Option<TypeId>) -> Expression<TypeId> {
        match expr {
            Expression::IntLiteral { value, span, .. } => {
                let info = match expected {
                    Some(t) if self.interner.resolve(t).is_integer() => t,
                    _ => self.interner.well_known.i32,
                };
                Expression::IntLiteral { value, info, span }
            }
            Expression::FloatLiteral { value, span, .. } => {
                let info = match expected {
                    Some(t) if self.interner.resolve(t).is_float() => t,
                    _ => self.interner.well_known.f64,
                };
                Expression::FloatLiteral { value, info, span }
            }
            Expression::BoolLiteral { value, span, .. } => {
                Expression::BoolLiteral { value, info: self.interner.well_known.bool, span }
            }
            Expression::StringLiteral { value, span, .. } => {
                Expression::StringLiteral { value, info: self.interner.well_known.string, span }
            }
            Expression::CharLiteral { value, span, .. } => {
                let info = self.interner.intern(Type::Char);
                Expression::CharLiteral { value, info, span }
            }
            Expression::UnitLiteral { span, .. } => {
                Expression::UnitLiteral { info: self.interner.well_known.unit, span }
            }
            Expression::Ident { name, span, .. } => {
                let info = match self.scopes.resolve(scope, &name) {
                    Some(id) => self.symbols.get(id).type_id,
                    None => {
                        self.error(SemanticError::UnknownName { name: name.clone(), span });
                        self.interner.well_known.error
                    }
                };
                Expression::Ident { name, info, span }
            }
            Expression::Field { base, field, span, .. } => self.check_field(*base, field, span, scope),
            Expression::Index { base, index, span, .. } => self.check_index(*base, *index, span, scope),
            Expression::Call { callee, args, span, .. } => self.check_call(*callee, args, span, scope),
            Expression::Unary { op, operand, span, .. } => self.check_unary(op, *operand, span, scope, expected),
            Expression::Binary { op, lhs, rhs, span, .. } => self.check_binary(op, *lhs, *rhs, span, scope),
            Expression::Cast { expr, target, span, .. } => {
                let expr = Box::new(self.check_expr(*expr, scope, None));
                let info = self.resolve_type_expr(&target);
                Expression::Cast { expr, target, info, span }
            }
            Expression::Block(b) => Expression::Block(self.check_block(b, scope, expected)),
            Expression::If { condition, then_branch, else_branch, span, .. } => {
                self.check_if(*condition, then_branch, else_branch, span, scope, expected)
            }
            Expression::Match { scrutinee, arms, span, .. } => {
                self.check_match(*scrutinee, arms, span, scope, expected)
            }
            Expression::Spawn { call, span, .. } => {
                // spec.md §3 lists `spawn`/`await` as expression-node
                // categories without defining a task/future type in the
                // type model (`spec.md` §9's "Non-goals" excludes
                // implementing the runtime); pragmatically a `spawn` carries
                // the type its call would otherwise return, not a wrapped
                // handle type. Recorded in `DESIGN.md`.
                let call = Box::new(self.check_expr(*call, scope, None));
                let info = call.get_info();
                Expression::Spawn { call, info, span }
            }
            Expression::Await { expr, span, .. } => {
                let expr = Box::new(self.check_expr(*expr, scope, None));
                let info = expr.get_info();
                Expression::Await { expr, info, span }
            }
            Expression::Unsafe(b) => {
                let was_unsafe = self.in_unsafe;
                self.in_unsafe = true;
                let block = self.check_block(b, scope, expected);
                self.in_unsafe = was_unsafe;
                Expression::Unsafe(block)
            }
        }
    }

    fn check_field(&mut self, base: Expression<()>, field: String, span: Span, scope: ScopeId) -> Expression<TypeId> {
        let base = Box::new(self.check_expr(base, scope, None));
        let base_ty = base.get_info();
        let info = match self.interner.resolve(base_ty).clone() {
            Type::Struct(sym) => {
                let struct_info = self.symbols.get(sym).struct_info.clone();
                match struct_info.and_then(|s| s.field_type(&field)) {
                    Some(ty) => ty,
                    None => {
                        self.error(SemanticError::UnknownField { field: field.clone(), span });
                        self.interner.well_known.error
                    }
                }
            }
            Type::Error => self.interner.well_known.error,
            _ => {
                self.error(SemanticError::UnknownField { field: field.clone(), span });
                self.interner.well_known.error
            }
        };
        Expression::Field { base, field, info, span }
    }

    fn check_index(&mut self, base: Expression<()>, index: Expression<()>, span: Span, scope: ScopeId) -> Expression<TypeId> {
        let base = Box::new(self.check_expr(base, scope, None));
        let index = Box::new(self.check_expr(index, scope, Some(self.interner.well_known.i32)));
        if !self.interner.resolve(index.get_info()).is_integer() {
            self.mismatch(self.interner.well_known.i32, index.get_info(), index.span());
        }
        let base_ty = base.get_info();
        let info = match self.interner.resolve(base_ty).clone() {
            Type::Array { element, .. } | Type::Slice { element, .. } => element,
            Type::Error => self.interner.well_known.error,
            _ => {
                let found = base_ty;
                let expected = self.interner.well_known.error;
                self.mismatch(expected, found, base.span());
                self.interner.well_known.error
            }
        };
        Expression::Index { base, index, info, span }
    }

    fn check_call(&mut self, callee: Expression<()>, args: Vec<Expression<()>>, span: Span, scope: ScopeId) -> Expression<TypeId> {
        let callee_name = if let Expression::Ident { name, .. } = &callee { Some(name.clone()) } else { None };
        let callee = Box::new(self.check_expr(callee, scope, None));
        let callee_ty = callee.get_info();

        if let Some(name) = &callee_name {
            if let Some(sym_id) = self.scopes.resolve(scope, name) {
                if self.symbols.get(sym_id).is_extern && !self.in_unsafe {
                    self.error(SemanticError::FfiCallOutsideUnsafe { name: name.clone(), span });
                }
            }
        }

        let (params, ret) = match self.interner.resolve(callee_ty).clone() {
            Type::Function { params, ret } => (params, ret),
            Type::Error => (vec![], self.interner.well_known.error),
            _ => {
                self.error(SemanticError::NotCallable { span });
                (vec![], self.interner.well_known.error)
            }
        };

        if params.len() != args.len() && !matches!(self.interner.resolve(callee_ty), Type::Error) {
            self.error(SemanticError::WrongArgumentCount { expected: params.len(), found: args.len(), span });
        }

        let args = args
            .into_iter()
            .enumerate()
            .map(|(i, arg)| {
                let expected = params.get(i).copied();
                let checked = self.check_expr(arg, scope, expected);
                if let Some(expected) = expected {
                    let found = checked.get_info();
                    if !self.interner.is_assignable(found, expected) {
                        self.mismatch(expected, found, checked.span());
                    }
                }
                checked
            })
            .collect();

        Expression::Call { callee, args, info: ret, span }
    }

    fn check_unary(
        &mut self,
        op: UnaryOp,
        operand: Expression<()>,
        span: Span,
        scope: ScopeId,
        expected: Option<TypeId>,
    ) -> Expression<TypeId> {
        match op {
            UnaryOp::Neg => {
                let operand = Box::new(self.check_expr(operand, scope, expected));
                let info = operand.get_info();
                if !self.interner.resolve(info).is_numeric() && !matches!(self.interner.resolve(info), Type::Error) {
                    self.mismatch(self.interner.well_known.i32, info, operand.span());
                }
                Expression::Unary { op, operand, info, span }
            }
            UnaryOp::Not => {
                let operand = Box::new(self.check_expr(operand, scope, Some(self.interner.well_known.bool)));
                if operand.get_info() != self.interner.well_known.bool {
                    self.error(SemanticError::NonBooleanCondition { span: operand.span() });
                }
                Expression::Unary { op, operand, info: self.interner.well_known.bool, span }
            }
            UnaryOp::Deref => {
                if !self.in_unsafe {
                    self.error(SemanticError::RawPointerDerefOutsideUnsafe { span });
                }
                let operand = Box::new(self.check_expr(operand, scope, None));
                let info = match self.interner.resolve(operand.get_info()).clone() {
                    Type::Pointer { pointee, .. } => pointee,
                    Type::Error => self.interner.well_known.error,
                    _ => {
                        let found = operand.get_info();
                        self.mismatch(self.interner.well_known.error, found, operand.span());
                        self.interner.well_known.error
                    }
                };
                Expression::Unary { op, operand, info, span }
            }
            UnaryOp::Ref { mutable } => {
                if mutable {
                    if let Expression::Ident { name, .. } = &operand {
                        if let Some(sym_id) = self.scopes.resolve(scope, name) {
                            if !self.symbols.get(sym_id).mutable {
                                self.error(SemanticError::MutableBorrowOfImmutable { span });
                            }
                        }
                    }
                }
                let operand = Box::new(self.check_expr(operand, scope, None));
                let pointee = operand.get_info();
                let info = self.interner.intern(Type::Pointer { pointee, mutable });
                Expression::Unary { op, operand, info, span }
            }
        }
    }

    fn check_binary(
        &mut self,
        op: crate::ast::BinaryOp,
        lhs: Expression<()>,
        rhs: Expression<()>,
        span: Span,
        scope: ScopeId,
    ) -> Expression<TypeId> {
        use crate::ast::BinaryOp::*;

        if op.is_short_circuit() {
            let lhs = Box::new(self.check_expr(lhs, scope, Some(self.interner.well_known.bool)));
            let rhs = Box::new(self.check_expr(rhs, scope, Some(self.interner.well_known.bool)));
            if lhs.get_info() != self.interner.well_known.bool {
                self.error(SemanticError::NonBooleanCondition { span: lhs.span() });
            }
            if rhs.get_info() != self.interner.well_known.bool {
                self.error(SemanticError::NonBooleanCondition { span: rhs.span() });
            }
            return Expression::Binary { op, lhs, rhs, info: self.interner.well_known.bool, span };
        }

        let lhs = Box::new(self.check_expr(lhs, scope, None));
        let lhs_ty = lhs.get_info();
        let rhs = Box::new(self.check_expr(rhs, scope, Some(lhs_ty)));
        let rhs_ty = rhs.get_info();
        if !self.interner.is_assignable(rhs_ty, lhs_ty) && !self.interner.is_assignable(lhs_ty, rhs_ty) {
            self.mismatch(lhs_ty, rhs_ty, rhs.span());
        }

        let info = if op.is_comparison() {
            self.interner.well_known.bool
        } else {
            match op {
                BitOr | BitXor | BitAnd | Shl | Shr | Add | Sub | Mul | Div | Rem => lhs_ty,
                _ => unreachable!("short-circuit and comparison handled above"),
            }
        };
        Expression::Binary { op, lhs, rhs, info, span }
    }

    fn check_if(
        &mut self,
        condition: Expression<()>,
        then_branch: Block<()>,
        else_branch: Option<Box<Expression<()>>>,
        span: Span,
        scope: ScopeId,
        expected: Option<TypeId>,
    ) -> Expression<TypeId> {
        let condition = Box::new(self.check_expr(condition, scope, Some(self.interner.well_known.bool)));
        if condition.get_info() != self.interner.well_known.bool {
            self.error(SemanticError::NonBooleanCondition { span: condition.span() });
        }

        let then_branch = self.check_block(then_branch, scope, expected);
        let then_ty = then_branch.info;

        let info = match else_branch {
            Some(else_expr) => {
                let else_expr = Box::new(self.check_expr(*else_expr, scope, expected));
                let else_ty = else_expr.get_info();
                let info = self.join_types(then_ty, else_ty, span);
                return Expression::If {
                    condition,
                    then_branch,
                    else_branch: Some(else_expr),
                    info,
                    span,
                };
            }
            None => self.join_types(then_ty, self.interner.well_known.unit, span),
        };

        Expression::If { condition, then_branch, else_branch: None, info, span }
    }

    /// Combines the types of two expression-oriented arms (`if`/`match`):
    /// identical types unify trivially, a `never` arm defers to the other,
    /// otherwise it's a type mismatch (`spec.md` §4.3 "all arms yielding the
    /// same type (or one arm may be `never`)").
    fn join_types(&mut self, a: TypeId, b: TypeId, span: Span) -> TypeId {
        if a == b {
            return a;
        }
        if matches!(self.interner.resolve(a), Type::Never) {
            return b;
        }
        if matches!(self.interner.resolve(b), Type::Never) {
            return a;
        }
        if matches!(self.interner.resolve(a), Type::Error) || matches!(self.interner.resolve(b), Type::Error) {
            return self.interner.well_known.error;
        }
        self.mismatch(a, b, span);
        a
    }

    fn check_match(
        &mut self,
        scrutinee: Expression<()>,
        arms: Vec<MatchArm<()>>,
        span: Span,
        scope: ScopeId,
        expected: Option<TypeId>,
    ) -> Expression<TypeId> {
        let scrutinee = Box::new(self.check_expr(scrutinee, scope, None));
        let scrutinee_ty = scrutinee.get_info();
        let enum_sym = match self.interner.resolve(scrutinee_ty).clone() {
            Type::Enum(sym) => Some(sym),
            Type::Error => None,
            _ => {
                self.error(SemanticError::NotCallable { span: scrutinee.span() });
                None
            }
        };

        let mut covered = std::collections::HashSet::new();
        let mut has_catch_all = false;
        let mut result_ty: Option<TypeId> = None;
        let mut checked_arms = Vec::with_capacity(arms.len());

        for arm in arms {
            let arm_scope = self.scopes.child_of(scope);
            match &arm.pattern {
                Pattern::Variant { variant, bindings, .. } => {
                    covered.insert(variant.clone());
                    if let Some(enum_sym) = enum_sym {
                        let payload = self
                            .symbols
                            .get(enum_sym)
                            .enum_info
                            .clone()
                            .and_then(|e| e.variant(variant).cloned())
                            .and_then(|(_, payload)| payload);
                        if let (Some(binding), Some(payload_ty)) = (bindings.first(), payload) {
                            if let Pattern::Binding { name, span } = binding {
                                let sym = Symbol::placeholder(name.clone(), SymbolKind::Variable, Visibility::Priv, *span, payload_ty);
                                let id = self.symbols.insert(sym);
                                let _ = self.scopes.declare(arm_scope, name, id);
                            }
                        }
                    }
                }
                Pattern::Binding { name, span } => {
                    has_catch_all = true;
                    let sym = Symbol::placeholder(name.clone(), SymbolKind::Variable, Visibility::Priv, *span, scrutinee_ty);
                    let id = self.symbols.insert(sym);
                    let _ = self.scopes.declare(arm_scope, name, id);
                }
                Pattern::Wildcard { .. } => has_catch_all = true,
            }

            let body = self.check_expr(arm.body, arm_scope, expected);
            let body_ty = body.get_info();
            result_ty = Some(match result_ty {
                None => body_ty,
                Some(prev) => self.join_types(prev, body_ty, arm.span),
            });
            checked_arms.push(MatchArm { pattern: arm.pattern, body, span: arm.span });
        }

        if let Some(enum_sym) = enum_sym {
            if !has_catch_all {
                let variants = self.symbols.get(enum_sym).enum_info.clone().map(|e| e.variants).unwrap_or_default();
                let missing: Vec<String> = variants
                    .into_iter()
                    .map(|(name, _)| name)
                    .filter(|name| !covered.contains(name))
                    .collect();
                if !missing.is_empty() {
                    self.error(SemanticError::NonExhaustiveMatch { missing, span });
                }
            }
        }

        let info = result_ty.unwrap_or(self.interner.well_known.error);
        Expression::Match { scrutinee, arms: checked_arms, info, span }
    }
}
