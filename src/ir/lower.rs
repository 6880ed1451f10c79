//! Lowers a checked [`crate::checker::Analysis`] to an [`super::Module`]
//! (`spec.md` §4.4). Grounded in the teacher's `codegen` builder shape (a
//! context carrying a scope stack, walking the typed tree once, emitting
//! instructions into a "current block") but targeting our own IR structs
//! instead of `inkwell`'s LLVM bindings (`DESIGN.md`).
//!
//! Local bindings are resolved back to the [`SymbolId`] the analyzer created
//! for them by their defining span: every `let`, parameter, and pattern
//! binding's span is unique within a translation unit, so a `Span -> SymbolId`
//! index built once up front gives IR generation the exact resolved type and
//! mutability the checker computed, without re-deriving it from syntax.

use std::collections::{HashMap, HashSet};

use crate::ast::{self, Block, Declaration, Expression, MatchArm, Pattern, Statement, UnaryOp};
use crate::checker::symbol::{FunctionSignature, SymbolKind};
use crate::checker::Analysis;
use crate::span::Span;
use crate::types::{SymbolId, Type, TypeId, TypeInterner};

use super::{
    BasicBlock, BinOp, BlockId, Callee, Constant, DataLayout, Function, IceError,
    Instruction, Linkage, Module as IrModule, Terminator, UnOp, ValueId,
};

/// Resolves binding spans to the symbols the analyzer created for them, and
/// top-level names to their declaration symbols — both read-only once
/// analysis has finished (`spec.md` §5 "single-writer discipline").
struct ModuleCtx<'a> {
    interner: &'a TypeInterner,
    analysis: &'a Analysis,
    by_span: HashMap<Span, SymbolId>,
    functions: HashMap<String, SymbolId>,
    /// Names declared `extern` — these keep their bare name through lowering
    /// since it is the real FFI symbol the linker must find, not a name this
    /// crate is free to qualify (`spec.md` §8 scenario 1 only qualifies
    /// ordinary package functions).
    externs: HashSet<String>,
    package: String,
}

impl<'a> ModuleCtx<'a> {
    fn new(analysis: &'a Analysis, interner: &'a TypeInterner) -> Self {
        let mut by_span = HashMap::new();
        let mut functions = HashMap::new();
        for (id, sym) in analysis.symbols.iter() {
            if sym.kind == SymbolKind::Variable {
                by_span.insert(sym.span, id);
            }
            if sym.kind == SymbolKind::Function {
                functions.insert(sym.name.clone(), id);
            }
        }
        let externs = analysis
            .module
            .items
            .iter()
            .filter_map(|item| match item {
                Declaration::ExternFunction(f) => Some(f.name.clone()),
                _ => None,
            })
            .collect();
        Self {
            interner,
            analysis,
            by_span,
            functions,
            externs,
            package: analysis.module.package.name.clone(),
        }
    }

    /// Qualifies `name` with the package name (`spec.md` §8 scenario 1's
    /// `p::main`), unless it names an `extern` declaration, whose symbol must
    /// stay exactly as written for the linker to resolve it.
    fn qualified_name(&self, name: &str) -> String {
        if self.externs.contains(name) {
            name.to_string()
        } else {
            format!("{}::{}", self.package, name)
        }
    }

    fn binding_type(&self, span: Span) -> TypeId {
        self.by_span
            .get(&span)
            .map(|id| self.analysis.symbols.get(*id).type_id)
            .unwrap_or(self.interner.well_known.error)
    }

    fn binding_mutable(&self, span: Span) -> bool {
        self.by_span
            .get(&span)
            .map(|id| self.analysis.symbols.get(*id).mutable)
            .unwrap_or(false)
    }

    fn function_signature(&self, name: &str) -> Option<&FunctionSignature> {
        let id = *self.functions.get(name)?;
        self.analysis.symbols.get(id).signature.as_ref()
    }
}

/// Where a local name's current value lives: a plain SSA value (immutable
/// bindings, never reassigned — the checker already rejects `Assign` to
/// them) or a stack slot that must be `Load`ed/`Store`d (`mut` bindings, and
/// any binding declared without an initializer).
#[derive(Clone, Copy)]
enum VarSlot {
    Value(ValueId, TypeId),
    Slot(ValueId, TypeId),
}

struct Env {
    scopes: Vec<HashMap<String, VarSlot>>,
}

impl Env {
    fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str, slot: VarSlot) {
        self.scopes.last_mut().unwrap().insert(name.to_string(), slot);
    }

    fn lookup(&self, name: &str) -> Option<VarSlot> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }
}

/// Builds one function's blocks. `current` indexes the block instructions
/// are currently appended to; once a block's terminator is set, further
/// `push`es into it are dropped (dead code after `return`/`unreachable` in
/// the source — the checker does not reject this, so IR generation must
/// tolerate it rather than emit instructions after a terminator).
struct FunctionBuilder {
    next_value: u32,
    blocks: Vec<BasicBlock>,
    current: usize,
}

impl FunctionBuilder {
    fn new() -> Self {
        let blocks = vec![BasicBlock::new(BlockId(0), "entry")];
        Self {
            next_value: 0,
            blocks,
            current: 0,
        }
    }

    fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    fn new_block(&mut self, label: impl Into<String>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id, label));
        id
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current = block.0 as usize;
    }

    fn is_terminated(&self) -> bool {
        self.blocks[self.current].terminator.is_some()
    }

    fn push(&mut self, inst: Instruction) {
        if self.is_terminated() {
            return;
        }
        self.blocks[self.current].instructions.push(inst);
    }

    fn terminate(&mut self, term: Terminator) {
        if self.is_terminated() {
            return;
        }
        self.blocks[self.current].terminator = Some(term);
    }

    fn emit_const(&mut self, ty: TypeId, value: Constant, span: Span) -> ValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Const { dst, ty, value, span });
        dst
    }

    fn emit_alloca(&mut self, ty: TypeId, span: Span) -> ValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Alloca { dst, ty, span });
        dst
    }

    fn emit_load(&mut self, ptr: ValueId, ty: TypeId, span: Span) -> ValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Load { dst, ptr, ty, span });
        dst
    }

    fn emit_store(&mut self, ptr: ValueId, value: ValueId, span: Span) {
        self.push(Instruction::Store { ptr, value, span });
    }
}

/// Lowers every function/extern declaration in `analysis.module` into an
/// [`IrModule`]. Struct/enum/type-alias declarations contribute no IR
/// directly — they are metadata the type system already consumed.
/// Internal-invariant violations (an unresolved name that somehow reached
/// this phase, an enum with no matching symbol) abort this declaration's
/// lowering and are returned as [`IceError`]s rather than panics, mirroring
/// the "accumulate, never throw" discipline the other three phases use.
pub fn lower_module(analysis: &Analysis, interner: &TypeInterner) -> (IrModule, Vec<IceError>) {
    let ctx = ModuleCtx::new(analysis, interner);
    let mut module = IrModule {
        functions: Vec::new(),
        declarations: Vec::new(),
        globals: Vec::new(),
        layout: DataLayout::default(),
    };
    let mut errors = Vec::new();

    for item in &analysis.module.items {
        match item {
            Declaration::Function(f) => match lower_function(&ctx, f) {
                Ok(func) => module.functions.push(func),
                Err(e) => errors.push(e),
            },
            Declaration::ExternFunction(f) => {
                module.declarations.push(lower_extern(&ctx, f));
            }
            Declaration::Struct(_) | Declaration::Enum(_) | Declaration::TypeAlias(_) => {}
        }
    }

    (module, errors)
}

fn linkage_of(vis: ast::Visibility) -> Linkage {
    match vis {
        ast::Visibility::Pub => Linkage::Public,
        ast::Visibility::Priv => Linkage::Internal,
    }
}

fn lower_extern(ctx: &ModuleCtx, f: &ast::ExternFunctionDecl) -> Function {
    let sig = ctx.function_signature(&f.name);
    let params = f
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let ty = sig.map(|s| s.params[i]).unwrap_or(ctx.interner.well_known.error);
            (p.param.name.clone(), ty)
        })
        .collect();
    let return_type = sig.map(|s| s.ret).unwrap_or(ctx.interner.well_known.error);
    Function {
        name: f.name.clone(),
        linkage: Linkage::External,
        params,
        return_type,
        abi: Some(f.abi.clone()),
        blocks: Vec::new(),
        span: f.span,
    }
}

fn lower_function(ctx: &ModuleCtx, f: &ast::FunctionDecl<TypeId>) -> Result<Function, IceError> {
    let sig = ctx
        .function_signature(&f.name)
        .ok_or_else(|| IceError::new(format!("no resolved signature for function `{}`", f.name), f.span))?
        .clone();

    let mut b = FunctionBuilder::new();
    let mut env = Env::new();
    for (i, param) in f.params.iter().enumerate() {
        let ty = *sig.params.get(i).unwrap_or(&ctx.interner.well_known.error);
        let value = ValueId(i as u32);
        env.declare(&param.name, VarSlot::Value(value, ty));
    }
    b.next_value = f.params.len() as u32;

    let result = lower_block(ctx, &mut b, &mut env, &f.body)?;
    if !b.is_terminated() {
        let span = f.body.span;
        match result {
            Some(v) => b.terminate(Terminator::Ret { value: Some(v), span }),
            None => b.terminate(Terminator::Ret { value: None, span }),
        }
    }

    Ok(Function {
        name: ctx.qualified_name(&f.name),
        linkage: linkage_of(f.visibility),
        params: f
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), *sig.params.get(i).unwrap_or(&ctx.interner.well_known.error)))
            .collect(),
        return_type: sig.ret,
        abi: None,
        blocks: b.blocks,
        span: f.span,
    })
}

/// Lowers a block's statements then its tail expression. Returns `None` when
/// the block yields no value: it ends with a statement (unit-typed, by
/// `spec.md` §4.3) or it diverged (a nested branch already set a
/// terminator, e.g. via `return`).
fn lower_block(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    block: &Block<TypeId>,
) -> Result<Option<ValueId>, IceError> {
    env.push();
    for stmt in &block.statements {
        lower_statement(ctx, b, env, stmt)?;
        if b.is_terminated() {
            env.pop();
            return Ok(None);
        }
    }
    let result = match &block.tail {
        Some(tail) => Some(lower_expr(ctx, b, env, tail)?),
        None => None,
    };
    env.pop();
    if b.is_terminated() {
        return Ok(None);
    }
    Ok(result)
}

fn lower_statement(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    stmt: &Statement<TypeId>,
) -> Result<(), IceError> {
    match stmt {
        Statement::Let { name, span, initializer, .. } => {
            let ty = ctx.binding_type(*span);
            let mutable = ctx.binding_mutable(*span);
            let init = match initializer {
                Some(expr) => Some(lower_expr(ctx, b, env, expr)?),
                None => None,
            };
            if mutable || init.is_none() {
                let ptr = b.emit_alloca(ty, *span);
                if let Some(v) = init {
                    b.emit_store(ptr, v, *span);
                }
                env.declare(name, VarSlot::Slot(ptr, ty));
            } else {
                env.declare(name, VarSlot::Value(init.unwrap(), ty));
            }
            Ok(())
        }
        Statement::Assign { target, value, span } => {
            let v = lower_expr(ctx, b, env, value)?;
            store_to_lvalue(ctx, b, env, target, v, *span)
        }
        Statement::Expr(expr) => {
            lower_expr(ctx, b, env, expr)?;
            Ok(())
        }
        Statement::Return { value, span } => {
            let v = match value {
                Some(expr) => Some(lower_expr(ctx, b, env, expr)?),
                None => None,
            };
            b.terminate(Terminator::Ret { value: v, span: *span });
            Ok(())
        }
    }
}

/// `target = value`. Only `Ident` and `Field`/`Index` lvalues are legal
/// assignment targets (the checker already rejected anything else); each
/// resolves to a pointer the value is `Store`d through.
fn store_to_lvalue(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    target: &Expression<TypeId>,
    value: ValueId,
    span: Span,
) -> Result<(), IceError> {
    match target {
        Expression::Ident { name, .. } => match env.lookup(name) {
            Some(VarSlot::Slot(ptr, _)) => {
                b.emit_store(ptr, value, span);
                Ok(())
            }
            Some(VarSlot::Value(_, _)) => {
                Err(IceError::new(format!("assignment to non-mutable binding `{name}` reached IR generation"), span))
            }
            None => Err(IceError::new(format!("unresolved assignment target `{name}`"), span)),
        },
        Expression::Field { .. } | Expression::Index { .. } => {
            let ptr = lower_lvalue_address(ctx, b, env, target)?;
            b.emit_store(ptr, value, span);
            Ok(())
        }
        _ => Err(IceError::new("unsupported assignment target reached IR generation", span)),
    }
}

/// Computes the address of a `Field`/`Index`/`Ident` lvalue without loading
/// through it, for `Assign` targets and `&expr`.
fn lower_lvalue_address(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    expr: &Expression<TypeId>,
) -> Result<ValueId, IceError> {
    match expr {
        Expression::Ident { name, span, .. } => match env.lookup(name) {
            Some(VarSlot::Slot(ptr, _)) => Ok(ptr),
            Some(VarSlot::Value(v, ty)) => {
                let ptr = b.emit_alloca(ty, *span);
                b.emit_store(ptr, v, *span);
                Ok(ptr)
            }
            None => Err(IceError::new(format!("unresolved identifier `{name}`"), *span)),
        },
        Expression::Field { base, field, info, span } => {
            let base_ptr = lower_lvalue_address(ctx, b, env, base)?;
            let index_ty = ctx.interner.well_known.i64;
            let field_index = struct_field_index(ctx, base.get_info(), field, *span)?;
            let idx = b.emit_const(index_ty, Constant::Int(field_index), *span);
            let dst = b.fresh_value();
            b.push(Instruction::GetElementPtr { dst, base: base_ptr, index: idx, ty: *info, span: *span });
            Ok(dst)
        }
        Expression::Index { base, index, info, span } => {
            let base_ptr = lower_lvalue_address(ctx, b, env, base)?;
            let idx = lower_expr(ctx, b, env, index)?;
            emit_bounds_check(ctx, b, base_ptr, idx, *span);
            let dst = b.fresh_value();
            b.push(Instruction::GetElementPtr { dst, base: base_ptr, index: idx, ty: *info, span: *span });
            Ok(dst)
        }
        _ => Err(IceError::new("expression is not addressable", expr.span_of())),
    }
}

/// `spec.md` §4.4 "array/slice index lowers to a `GetElementPtr` plus an
/// implicit bounds-check trap". Modeled as an `Intrinsic` with no dedicated
/// opcode, per `ir/mod.rs`'s documented catch-all.
fn emit_bounds_check(ctx: &ModuleCtx, b: &mut FunctionBuilder, base: ValueId, index: ValueId, span: Span) {
    b.push(Instruction::Intrinsic {
        dst: None,
        name: "bounds.check".to_string(),
        args: vec![base, index],
        ty: ctx.interner.well_known.unit,
        span,
    });
}

fn struct_field_index(ctx: &ModuleCtx, struct_ty: TypeId, field: &str, span: Span) -> Result<u64, IceError> {
    let sym = match ctx.interner.resolve(struct_ty) {
        Type::Struct(sym) => *sym,
        _ => return Err(IceError::new(format!("field access on non-struct type while lowering `.{field}`"), span)),
    };
    let info = ctx
        .analysis
        .symbols
        .get(sym)
        .struct_info
        .as_ref()
        .ok_or_else(|| IceError::new("struct symbol missing field layout", span))?;
    info.fields
        .iter()
        .position(|(name, _)| name == field)
        .map(|i| i as u64)
        .ok_or_else(|| IceError::new(format!("unknown field `{field}` reached IR generation"), span))
}

fn lower_expr(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    expr: &Expression<TypeId>,
) -> Result<ValueId, IceError> {
    match expr {
        Expression::IntLiteral { value, info, span } => Ok(b.emit_const(*info, Constant::Int(*value), *span)),
        Expression::FloatLiteral { value, info, span } => Ok(b.emit_const(*info, Constant::Float(*value), *span)),
        Expression::BoolLiteral { value, info, span } => Ok(b.emit_const(*info, Constant::Bool(*value), *span)),
        Expression::StringLiteral { value, info, span } => Ok(b.emit_const(*info, Constant::Str(value.clone()), *span)),
        Expression::CharLiteral { value, info, span } => Ok(b.emit_const(*info, Constant::Char(*value), *span)),
        Expression::UnitLiteral { info, span } => Ok(b.emit_const(*info, Constant::Unit, *span)),
        Expression::Ident { name, info, span } => match env.lookup(name) {
            Some(VarSlot::Value(v, _)) => Ok(v),
            Some(VarSlot::Slot(ptr, ty)) => Ok(b.emit_load(ptr, ty, *span)),
            // Reaching IR generation with an unresolved name means the checker
            // already recorded an error and typed it `Type::Error`; emit a
            // poison value of that recorded type instead of aborting the unit.
            None => Ok(b.emit_const(*info, Constant::Unit, *span)),
        },
        Expression::Field { base, field, info, span } => {
            let base_ptr = lower_lvalue_address(ctx, b, env, base)?;
            let index_ty = ctx.interner.well_known.i64;
            let field_index = struct_field_index(ctx, base.get_info(), field, *span)?;
            let idx = b.emit_const(index_ty, Constant::Int(field_index), *span);
            let addr = b.fresh_value();
            b.push(Instruction::GetElementPtr { dst: addr, base: base_ptr, index: idx, ty: *info, span: *span });
            Ok(b.emit_load(addr, *info, *span))
        }
        Expression::Index { base, index, info, span } => {
            let base_ptr = lower_lvalue_address(ctx, b, env, base)?;
            let idx = lower_expr(ctx, b, env, index)?;
            emit_bounds_check(ctx, b, base_ptr, idx, *span);
            let addr = b.fresh_value();
            b.push(Instruction::GetElementPtr { dst: addr, base: base_ptr, index: idx, ty: *info, span: *span });
            Ok(b.emit_load(addr, *info, *span))
        }
        Expression::Call { callee, args, info, span } => lower_call(ctx, b, env, callee, args, *info, *span),
        Expression::Unary { op, operand, info, span } => lower_unary(ctx, b, env, *op, operand, *info, *span),
        Expression::Binary { op, lhs, rhs, info, span } => lower_binary(ctx, b, env, *op, lhs, rhs, *info, *span),
        Expression::Cast { expr: inner, info, span, .. } => {
            let v = lower_expr(ctx, b, env, inner)?;
            let dst = b.fresh_value();
            b.push(Instruction::Cast { dst, operand: v, ty: *info, span: *span });
            Ok(dst)
        }
        Expression::Block(block) => {
            let result = lower_block(ctx, b, env, block)?;
            Ok(result.unwrap_or_else(|| b.emit_const(block.info, Constant::Unit, block.span)))
        }
        Expression::Unsafe(block) => {
            let result = lower_block(ctx, b, env, block)?;
            Ok(result.unwrap_or_else(|| b.emit_const(block.info, Constant::Unit, block.span)))
        }
        Expression::If { condition, then_branch, else_branch, info, span } => {
            lower_if(ctx, b, env, condition, then_branch, else_branch.as_deref(), *info, *span)
        }
        Expression::Match { scrutinee, arms, info, span } => lower_match(ctx, b, env, scrutinee, arms, *info, *span),
        Expression::Spawn { call, span, .. } => {
            // Concurrency is an external runtime concern (`spec.md` §5); the IR
            // records the call site itself and lets the backend lower the
            // task-spawn primitive.
            let v = lower_expr(ctx, b, env, call)?;
            let dst = b.fresh_value();
            b.push(Instruction::Intrinsic { dst: Some(dst), name: "spawn".to_string(), args: vec![v], ty: ctx.interner.well_known.unit, span: *span });
            Ok(dst)
        }
        Expression::Await { expr: inner, info, span } => {
            let v = lower_expr(ctx, b, env, inner)?;
            let dst = b.fresh_value();
            b.push(Instruction::Intrinsic { dst: Some(dst), name: "await".to_string(), args: vec![v], ty: *info, span: *span });
            Ok(dst)
        }
    }
}

fn lower_call(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    callee: &Expression<TypeId>,
    args: &[Expression<TypeId>],
    ty: TypeId,
    span: Span,
) -> Result<ValueId, IceError> {
    let arg_values = args
        .iter()
        .map(|a| lower_expr(ctx, b, env, a))
        .collect::<Result<Vec<_>, _>>()?;

    let callee_ref = match callee {
        Expression::Ident { name, .. } if ctx.functions.contains_key(name) => {
            Callee::Direct(ctx.qualified_name(name))
        }
        other => Callee::Indirect(lower_expr(ctx, b, env, other)?),
    };

    let dst = b.fresh_value();
    b.push(Instruction::Call { dst: Some(dst), callee: callee_ref, args: arg_values, ty, span });
    Ok(dst)
}

fn lower_unary(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    op: UnaryOp,
    operand: &Expression<TypeId>,
    ty: TypeId,
    span: Span,
) -> Result<ValueId, IceError> {
    match op {
        UnaryOp::Neg => {
            let v = lower_expr(ctx, b, env, operand)?;
            let dst = b.fresh_value();
            b.push(Instruction::UnOp { dst, op: UnOp::Neg, operand: v, ty, span });
            Ok(dst)
        }
        UnaryOp::Not => {
            let v = lower_expr(ctx, b, env, operand)?;
            let dst = b.fresh_value();
            b.push(Instruction::UnOp { dst, op: UnOp::Not, operand: v, ty, span });
            Ok(dst)
        }
        UnaryOp::Deref => {
            let ptr = lower_expr(ctx, b, env, operand)?;
            Ok(b.emit_load(ptr, ty, span))
        }
        UnaryOp::Ref { .. } => lower_lvalue_address(ctx, b, env, operand),
    }
}

fn lower_binary(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    op: ast::BinaryOp,
    lhs: &Expression<TypeId>,
    rhs: &Expression<TypeId>,
    ty: TypeId,
    span: Span,
) -> Result<ValueId, IceError> {
    if op.is_short_circuit() {
        return lower_short_circuit(ctx, b, env, op, lhs, rhs, ty, span);
    }
    let l = lower_expr(ctx, b, env, lhs)?;
    let r = lower_expr(ctx, b, env, rhs)?;
    let binop = map_binop(op);
    let dst = b.fresh_value();
    b.push(Instruction::BinOp { dst, op: binop, lhs: l, rhs: r, ty, span });
    Ok(dst)
}

fn map_binop(op: ast::BinaryOp) -> BinOp {
    use ast::BinaryOp as A;
    match op {
        A::Eq => BinOp::Eq,
        A::Ne => BinOp::Ne,
        A::Lt => BinOp::Lt,
        A::Le => BinOp::Le,
        A::Gt => BinOp::Gt,
        A::Ge => BinOp::Ge,
        A::BitOr => BinOp::BitOr,
        A::BitXor => BinOp::BitXor,
        A::BitAnd => BinOp::BitAnd,
        A::Shl => BinOp::Shl,
        A::Shr => BinOp::Shr,
        A::Add => BinOp::Add,
        A::Sub => BinOp::Sub,
        A::Mul => BinOp::Mul,
        A::Div => BinOp::Div,
        A::Rem => BinOp::Rem,
        A::Or | A::And => unreachable!("short-circuit operators lower via lower_short_circuit"),
    }
}

/// `a && b` / `a || b` lower to a CFG, not a bitwise op (`spec.md` §4.4
/// "short-circuit operators lower to control flow"): `rhs` is only
/// evaluated in the branch where it can change the result.
fn lower_short_circuit(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    op: ast::BinaryOp,
    lhs: &Expression<TypeId>,
    rhs: &Expression<TypeId>,
    ty: TypeId,
    span: Span,
) -> Result<ValueId, IceError> {
    let l = lower_expr(ctx, b, env, lhs)?;
    let rhs_block = b.new_block("sc.rhs");
    let join_block = b.new_block("sc.join");
    let short_circuit_block = b.current;
    let short_circuit_id = b.blocks[short_circuit_block].id;

    match op {
        ast::BinaryOp::And => b.terminate(Terminator::CondBr { cond: l, then_block: rhs_block, else_block: join_block, span }),
        ast::BinaryOp::Or => b.terminate(Terminator::CondBr { cond: l, then_block: join_block, else_block: rhs_block, span }),
        _ => unreachable!(),
    }

    b.switch_to(rhs_block);
    let r = lower_expr(ctx, b, env, rhs)?;
    let rhs_end_block = b.blocks[b.current].id;
    if !b.is_terminated() {
        b.terminate(Terminator::Br { target: join_block, span });
    }

    b.switch_to(join_block);
    let dst = b.fresh_value();
    b.push(Instruction::Phi {
        dst,
        ty,
        incoming: vec![(short_circuit_id, l), (rhs_end_block, r)],
        span,
    });
    Ok(dst)
}

/// `if cond { then } else { else }` lowers to cond/then/(else)/join blocks
/// with a `Phi` collecting the branch values at `join` — unless the
/// expression's type is `unit` (statement position), in which case no value
/// is needed and no `Phi` is emitted (`spec.md` §4.4).
fn lower_if(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    condition: &Expression<TypeId>,
    then_branch: &Block<TypeId>,
    else_branch: Option<&Expression<TypeId>>,
    ty: TypeId,
    span: Span,
) -> Result<ValueId, IceError> {
    let cond = lower_expr(ctx, b, env, condition)?;
    let then_id = b.new_block("if.then");
    let else_id = b.new_block("if.else");
    let join_id = b.new_block("if.join");
    b.terminate(Terminator::CondBr { cond, then_block: then_id, else_block: else_id, span });

    b.switch_to(then_id);
    let then_val = lower_block(ctx, b, env, then_branch)?;
    let then_end = b.blocks[b.current].id;
    let then_diverged = b.is_terminated();
    if !then_diverged {
        b.terminate(Terminator::Br { target: join_id, span });
    }

    b.switch_to(else_id);
    let else_val = match else_branch {
        Some(e) => Some(lower_expr(ctx, b, env, e)?),
        None => None,
    };
    let else_end = b.blocks[b.current].id;
    let else_diverged = b.is_terminated();
    if !else_diverged {
        b.terminate(Terminator::Br { target: join_id, span });
    }

    b.switch_to(join_id);
    let is_unit = matches!(ctx.interner.resolve(ty), Type::Unit | Type::Void);
    if is_unit {
        return Ok(b.emit_const(ty, Constant::Unit, span));
    }

    let mut incoming = Vec::new();
    if !then_diverged {
        incoming.push((then_end, then_val.unwrap_or_else(|| unit_value(b, ty, span))));
    }
    if !else_diverged {
        incoming.push((else_end, else_val.unwrap_or_else(|| unit_value(b, ty, span))));
    }

    if incoming.len() == 1 {
        return Ok(incoming[0].1);
    }
    if incoming.is_empty() {
        b.terminate(Terminator::Unreachable { span });
        return Ok(b.emit_const(ty, Constant::Unit, span));
    }
    let dst = b.fresh_value();
    b.push(Instruction::Phi { dst, ty, incoming, span });
    Ok(dst)
}

fn unit_value(b: &mut FunctionBuilder, ty: TypeId, span: Span) -> ValueId {
    b.emit_const(ty, Constant::Unit, span)
}

/// `match` on an enum lowers to a discriminant extraction plus a `Switch`
/// terminator, one block per arm, and a join block with a `Phi` (the same
/// unit-elision rule as `lower_if` applies). Discriminants are the
/// variant's declaration-order index (`spec.md` §6's IR has no dedicated
/// tagged-union type, so discriminant/payload access are modeled as
/// `Intrinsic`s, matching `ir/mod.rs`'s documented catch-all).
fn lower_match(
    ctx: &ModuleCtx,
    b: &mut FunctionBuilder,
    env: &mut Env,
    scrutinee: &Expression<TypeId>,
    arms: &[MatchArm<TypeId>],
    ty: TypeId,
    span: Span,
) -> Result<ValueId, IceError> {
    let scrutinee_val = lower_expr(ctx, b, env, scrutinee)?;
    let scrutinee_ty = scrutinee.get_info();
    let enum_sym = match ctx.interner.resolve(scrutinee_ty) {
        Type::Enum(sym) => Some(*sym),
        _ => None,
    };
    let variant_index: HashMap<String, u64> = enum_sym
        .and_then(|sym| ctx.analysis.symbols.get(sym).enum_info.clone())
        .map(|info| info.variants.into_iter().enumerate().map(|(i, (name, _))| (name, i as u64)).collect())
        .unwrap_or_default();

    let disc = b.fresh_value();
    b.push(Instruction::Intrinsic {
        dst: Some(disc),
        name: "enum.discriminant".to_string(),
        args: vec![scrutinee_val],
        ty: ctx.interner.well_known.i64,
        span,
    });
    let switch_block = b.blocks[b.current].id;

    let join_id = b.new_block("match.join");
    let is_unit = matches!(ctx.interner.resolve(ty), Type::Unit | Type::Void);

    let mut cases = Vec::new();
    let mut default_id = None;
    let mut incoming = Vec::new();

    for arm in arms {
        let arm_block = b.new_block("match.arm");
        match &arm.pattern {
            Pattern::Variant { variant, .. } => {
                if let Some(idx) = variant_index.get(variant) {
                    cases.push((*idx, arm_block));
                }
            }
            Pattern::Binding { .. } | Pattern::Wildcard { .. } => {
                default_id = Some(arm_block);
            }
        }

        b.switch_to(arm_block);
        env.push();
        if let Pattern::Variant { bindings, .. } = &arm.pattern {
            if let Some(Pattern::Binding { name, span: bspan }) = bindings.first() {
                let payload_ty = ctx.binding_type(*bspan);
                let payload = b.fresh_value();
                b.push(Instruction::Intrinsic {
                    dst: Some(payload),
                    name: "enum.payload".to_string(),
                    args: vec![scrutinee_val],
                    ty: payload_ty,
                    span: *bspan,
                });
                env.declare(name, VarSlot::Value(payload, payload_ty));
            }
        } else if let Pattern::Binding { name, span: bspan } = &arm.pattern {
            env.declare(name, VarSlot::Value(scrutinee_val, ctx.binding_type(*bspan)));
        }

        let arm_val = lower_expr(ctx, b, env, &arm.body)?;
        env.pop();
        let arm_end = b.blocks[b.current].id;
        let diverged = b.is_terminated();
        if !diverged {
            b.terminate(Terminator::Br { target: join_id, span: arm.span });
            if !is_unit {
                incoming.push((arm_end, arm_val));
            }
        }
    }

    b.switch_to(switch_block);
    let default = default_id.unwrap_or(join_id);
    b.terminate(Terminator::Switch { discriminant: disc, cases, default, span });

    b.switch_to(join_id);
    if is_unit {
        return Ok(b.emit_const(ty, Constant::Unit, span));
    }
    if incoming.is_empty() {
        b.terminate(Terminator::Unreachable { span });
        return Ok(b.emit_const(ty, Constant::Unit, span));
    }
    if incoming.len() == 1 {
        return Ok(incoming[0].1);
    }
    let dst = b.fresh_value();
    b.push(Instruction::Phi { dst, ty, incoming, span });
    Ok(dst)
}

trait SpanOf {
    fn span_of(&self) -> Span;
}

impl SpanOf for Expression<TypeId> {
    fn span_of(&self) -> Span {
        use crate::ast::Spanned;
        self.span()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::check_module;
    use crate::diagnostics::Diagnostics;
    use crate::lexer::Lexer;
    use crate::parser::grammar::parse_unit;
    use crate::span::SourceMap;
    use crate::types::TypeInterner;

    fn compile(src: &str) -> (IrModule, Vec<IceError>) {
        let mut sources = SourceMap::new();
        let file = sources.add_file("t.ast", src);
        let mut diags = Diagnostics::new();
        let tokens = Lexer::tokenize(src, file, &sources, &mut diags);
        let module = parse_unit(tokens, &sources, &mut diags);
        let mut interner = TypeInterner::new();
        let analysis = check_module(module, &mut interner, &sources, &mut diags);
        assert!(!diags.has_errors(), "unexpected diagnostics: {:?}", diags.into_vec());
        lower_module(&analysis, &interner)
    }

    #[test]
    fn lowers_a_function_returning_a_constant() {
        let (module, errors) = compile(
            "package main;\npub fn answer() -> i32 { return 42; }\n",
        );
        assert!(errors.is_empty());
        let f = module.functions.iter().find(|f| f.name == "main::answer").unwrap();
        assert!(!f.blocks.is_empty());
        assert!(matches!(f.blocks[0].terminator, Some(Terminator::Ret { .. })));
    }

    #[test]
    fn lowers_an_if_expression_to_a_branching_cfg() {
        let (module, errors) = compile(
            "package main;\npub fn pick(flag: bool) -> i32 { return if flag { 1 } else { 2 }; }\n",
        );
        assert!(errors.is_empty());
        let f = module.functions.iter().find(|f| f.name == "main::pick").unwrap();
        assert!(f.blocks.len() >= 4);
        assert!(matches!(f.blocks[0].terminator, Some(Terminator::CondBr { .. })));
    }

    #[test]
    fn mutable_let_lowers_to_alloca_store_load() {
        let (module, errors) = compile(
            "package main;\npub fn counter() -> i32 { let mut x: i32 = 0; x = x + 1; return x; }\n",
        );
        assert!(errors.is_empty());
        let f = module.functions.iter().find(|f| f.name == "main::counter").unwrap();
        let has_alloca = f.blocks.iter().flat_map(|b| &b.instructions).any(|i| matches!(i, Instruction::Alloca { .. }));
        assert!(has_alloca);
    }
}
