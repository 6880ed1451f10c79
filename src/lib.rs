//! Asthra's front end: lexer, parser, semantic analyzer, and IR generator,
//! wired into one pipeline entry point, [`compile_unit`].
//!
//! The pipeline never short-circuits on error (`spec.md` §7 "the pipeline
//! ... still returns a (possibly partial) AST and ... IR module"): every
//! phase records diagnostics into a shared [`diagnostics::Diagnostics`] sink
//! and keeps going, so a caller always gets back everything that *could* be
//! produced plus the full list of what went wrong, never a single early
//! `Err`. [`CompileError`] exists only for callers (like [`asthrac`, the
//! smoke-test binary in `src/bin`]) that want ordinary `Result`-based early
//! exit over a hard failure, not for the library's own control flow.

pub mod ast;
pub mod checker;
pub mod diagnostics;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod span;
pub mod types;

use diagnostics::{Diagnostic, Diagnostics};
use span::{FileId, SourceMap};
use types::TypeInterner;

/// Knobs a driver may want without reaching into the pipeline internals.
/// Intentionally tiny (`spec.md` §1 Non-goals excludes a full option-parsing
/// driver from this crate's scope; this struct is the *library's* surface,
/// not a CLI's).
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Display name for the translation unit (used as the diagnostic
    /// `file` field); need not be a real filesystem path.
    pub file_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            file_name: "<unit>".to_string(),
        }
    }
}

/// Everything [`compile_unit`] produces for one translation unit, including
/// whatever partial artifacts survived a failing phase.
pub struct CompileOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub ast: Option<ast::Module<()>>,
    pub analysis: Option<checker::Analysis>,
    pub ir: Option<ir::Module>,
}

/// The rare hard-failure case a `Result`-oriented caller wants: a lexer or
/// parser phase could not even recover past the first token, or IR
/// generation hit an internal invariant violation and produced no module at
/// all. `compile_unit` itself never returns this — it always returns a
/// [`CompileOutput`]; this enum exists for callers like `asthrac` to convert
/// "there are errors" into a process exit code without re-deriving the
/// check themselves (`spec.md` §7 ambient addition, `SPEC_FULL.md` §7).
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    HasErrors(usize),
    Internal(String),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::HasErrors(n) => write!(f, "{n} diagnostic(s) reported, including at least one error"),
            CompileError::Internal(msg) => write!(f, "internal compiler error: {msg}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.severity, diagnostics::Severity::Error | diagnostics::Severity::Ice))
    }

    /// Converts to a `Result` for callers that want early-exit semantics
    /// instead of inspecting `diagnostics` themselves (`SPEC_FULL.md` §7).
    pub fn into_result(self) -> Result<Self, CompileError> {
        let error_count = self
            .diagnostics
            .iter()
            .filter(|d| matches!(d.severity, diagnostics::Severity::Error | diagnostics::Severity::Ice))
            .count();
        if error_count > 0 {
            return Err(CompileError::HasErrors(error_count));
        }
        Ok(self)
    }
}

/// Runs the full pipeline — lex, parse, check, lower — over `source`,
/// accumulating diagnostics from every phase into one ordered list
/// (`spec.md` §5 "Diagnostics ... single append-only list per translation
/// unit").
pub fn compile_unit(source: &str, options: &CompileOptions) -> CompileOutput {
    let mut sources = SourceMap::new();
    let file = sources.add_file(options.file_name.clone(), source);
    compile_unit_in(source, file, &sources)
}

fn compile_unit_in(source: &str, file: FileId, sources: &SourceMap) -> CompileOutput {
    let mut diags = Diagnostics::new();

    let tokens = lexer::Lexer::tokenize(source, file, sources, &mut diags);
    let ast = parser::parse_unit(tokens, sources, &mut diags);

    let mut interner = TypeInterner::new();
    let analysis = checker::check_module(ast.clone(), &mut interner, sources, &mut diags);

    let ir = if diags.has_errors() {
        None
    } else {
        let (module, ice_errors) = ir::lower::lower_module(&analysis, &interner);
        for e in ice_errors {
            diags.push(Diagnostic::new(diagnostics::Severity::Ice, "E-IR-INTERNAL", e.span, e.message, sources));
        }
        Some(module)
    };

    CompileOutput {
        diagnostics: diags.into_vec(),
        ast: Some(ast),
        analysis: Some(analysis),
        ir,
    }
}
