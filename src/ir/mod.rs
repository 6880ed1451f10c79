//! Typed SSA-style intermediate representation (`spec.md` §3 "IR module",
//! §6 "Output to the backend"). This is a purpose-built model, not a
//! binding to LLVM: the teacher's `codegen` module binds `inkwell` (real
//! LLVM) directly, but the LLVM bridge is an external collaborator out of
//! scope here (`spec.md` §1), so `inkwell` is dropped from the dependency
//! set (`DESIGN.md`). We keep the teacher's *architecture* — a builder with
//! a variable/function scope stack and cached type lowering — and target
//! our own structs instead.

pub mod lower;

use crate::span::Span;
use crate::types::TypeId;

/// A value identifier, scoped to the function that defines it (`spec.md`
/// §3 "Value identifiers are scoped to their function").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    Char(char),
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// Who a `call` instruction invokes: a named top-level function resolved
/// at lowering time, or a value computed at runtime (a function pointer
/// held in a variable) — `spec.md` §4.4 "direct for known functions;
/// indirect via function value otherwise".
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Direct(String),
    Indirect(ValueId),
}

/// One SSA instruction. Every instruction that defines a value does so
/// exactly once (`dst`); every instruction carries the span of the source
/// expression it was lowered from (`spec.md` §4.4 "Debug info").
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Const {
        dst: ValueId,
        ty: TypeId,
        value: Constant,
        span: Span,
    },
    BinOp {
        dst: ValueId,
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
        ty: TypeId,
        span: Span,
    },
    UnOp {
        dst: ValueId,
        op: UnOp,
        operand: ValueId,
        ty: TypeId,
        span: Span,
    },
    Cast {
        dst: ValueId,
        operand: ValueId,
        ty: TypeId,
        span: Span,
    },
    Alloca {
        dst: ValueId,
        ty: TypeId,
        span: Span,
    },
    Load {
        dst: ValueId,
        ptr: ValueId,
        ty: TypeId,
        span: Span,
    },
    Store {
        ptr: ValueId,
        value: ValueId,
        span: Span,
    },
    /// Pointer/struct-field/array-element address computation. `index` is
    /// itself an SSA value (commonly a preceding `Const`) so field offsets
    /// and array indices share one instruction shape.
    GetElementPtr {
        dst: ValueId,
        base: ValueId,
        index: ValueId,
        ty: TypeId,
        span: Span,
    },
    Call {
        dst: Option<ValueId>,
        callee: Callee,
        args: Vec<ValueId>,
        ty: TypeId,
        span: Span,
    },
    Phi {
        dst: ValueId,
        ty: TypeId,
        incoming: Vec<(BlockId, ValueId)>,
        span: Span,
    },
    /// Runtime-coupled operation with no dedicated opcode (enum
    /// discriminant extraction, bounds-check traps) — `spec.md` §6 lists a
    /// catch-all `intrinsic` instruction kind for exactly this.
    Intrinsic {
        dst: Option<ValueId>,
        name: String,
        args: Vec<ValueId>,
        ty: TypeId,
        span: Span,
    },
}

/// The control instruction ending a basic block (`spec.md` §3 "terminated
/// by a control instruction").
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Ret {
        value: Option<ValueId>,
        span: Span,
    },
    Br {
        target: BlockId,
        span: Span,
    },
    CondBr {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
        span: Span,
    },
    Switch {
        discriminant: ValueId,
        cases: Vec<(u64, BlockId)>,
        default: BlockId,
        span: Span,
    },
    Unreachable {
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub(crate) fn new(id: BlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            instructions: Vec::new(),
            terminator: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Internal,
    Public,
    /// An `extern "C"` declaration with no body to lower.
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub linkage: Linkage,
    pub params: Vec<(String, TypeId)>,
    pub return_type: TypeId,
    pub abi: Option<String>,
    pub blocks: Vec<BasicBlock>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConstant {
    pub name: String,
    pub ty: TypeId,
    pub value: Constant,
}

/// Target data-layout hints accompanying a module (`spec.md` §6 "optional
/// target data layout hints (pointer size, endianness)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLayout {
    pub pointer_size: u32,
    pub little_endian: bool,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            pointer_size: 8,
            little_endian: true,
        }
    }
}

/// `spec.md` §6's module schema: function definitions, function
/// declarations (no body — FFI imports), global constants, layout hints.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub functions: Vec<Function>,
    pub declarations: Vec<Function>,
    pub globals: Vec<GlobalConstant>,
    pub layout: DataLayout,
}

impl Module {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
            declarations: Vec::new(),
            globals: Vec::new(),
            layout: DataLayout::default(),
        }
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal-compiler-error: an invariant IR generation relies on (a typed,
/// analyzer-validated AST) did not hold. Surfaced as a `Severity::Ice`
/// diagnostic rather than a panic, keeping the "accumulate, don't throw"
/// discipline uniform across all four phases (`spec.md` §4.4 "Failure";
/// `DESIGN.md` records this as the ambient IR-gen failure mode).
#[derive(Debug, Clone, PartialEq)]
pub struct IceError {
    pub message: String,
    pub span: Span,
}

impl IceError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}
