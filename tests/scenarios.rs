//! End-to-end pipeline scenarios, one per `compile_unit` behavior the
//! diagnostic schema and IR shape must hold stable across releases (`spec.md`
//! §8 "Concrete end-to-end scenarios").

use asthra::diagnostics::Severity;
use asthra::{compile_unit, CompileOptions};

fn compile(source: &str) -> asthra::CompileOutput {
    compile_unit(source, &CompileOptions { file_name: "scenario.ast".to_string() })
}

#[test]
fn minimal_package_with_explicit_unit_return_has_no_diagnostics() {
    let out = compile("package p; pub fn main(none) -> void { return (); }");
    assert!(out.diagnostics.is_empty(), "unexpected diagnostics: {:?}", out.diagnostics);

    let module = out.ir.expect("a clean unit must produce an IR module");
    let main = module.functions.iter().find(|f| f.name == "p::main").expect("main not lowered");
    assert_eq!(main.blocks.len(), 1);
    assert!(matches!(
        main.blocks[0].terminator,
        Some(asthra::ir::Terminator::Ret { .. })
    ));
}

#[test]
fn let_without_type_annotation_is_a_parse_error_and_suppresses_ir() {
    let out = compile("package p; pub fn f(none) -> i32 { let x = 42; return x; }");

    assert!(out.has_errors());
    let diag = out
        .diagnostics
        .iter()
        .find(|d| d.message == "type annotation required")
        .expect("missing type-annotation diagnostic");
    assert_eq!(diag.severity, Severity::Error);
    assert!(out.ir.is_none(), "IR must not be emitted once a phase reported errors");
}

#[test]
fn simple_let_and_return_lowers_to_a_constant() {
    let out = compile("package p; pub fn f(none) -> i32 { let x: i32 = 42; return x; }");
    assert!(out.diagnostics.is_empty(), "unexpected diagnostics: {:?}", out.diagnostics);

    let module = out.ir.unwrap();
    let f = module.functions.iter().find(|f| f.name == "p::f").unwrap();
    let has_const_42 = f.blocks.iter().flat_map(|b| &b.instructions).any(|i| {
        matches!(i, asthra::ir::Instruction::Const { value: asthra::ir::Constant::Int(42), .. })
    });
    assert!(has_const_42, "expected a constant 42 among {:?}", f.blocks);
}

#[test]
fn if_expression_lowers_to_a_branching_cfg_with_phi() {
    let out = compile("package p; pub fn g(b: bool) -> i32 { let r: i32 = if b { 1 } else { 2 }; return r; }");
    assert!(out.diagnostics.is_empty(), "unexpected diagnostics: {:?}", out.diagnostics);

    let module = out.ir.unwrap();
    let g = module.functions.iter().find(|f| f.name == "p::g").unwrap();
    assert!(g.blocks.len() >= 4, "expected cond/then/else/join blocks, got {}", g.blocks.len());
    assert!(g.blocks.iter().any(|b| matches!(b.terminator, Some(asthra::ir::Terminator::CondBr { .. }))));
    let has_phi = g
        .blocks
        .iter()
        .flat_map(|b| &b.instructions)
        .any(|i| matches!(i, asthra::ir::Instruction::Phi { .. }));
    assert!(has_phi, "expected a phi at the join block");
}

#[test]
fn non_exhaustive_match_over_an_enum_is_a_semantic_error() {
    let out = compile(
        "package p; enum E { A, B, C } pub fn f(e: E) -> i32 { return match e { E.A => 1, E.B => 2 }; }",
    );
    assert!(out.has_errors());
    let diag = out
        .diagnostics
        .iter()
        .find(|d| d.code == "E-SEMA-NON-EXHAUSTIVE-MATCH")
        .expect("missing non-exhaustive-match diagnostic");
    assert!(diag.message.contains('C'), "expected the missing variant named: {}", diag.message);
    assert!(out.ir.is_none());
}

#[test]
fn ffi_call_outside_unsafe_is_a_safety_error() {
    let out = compile(
        r#"package p; extern "C" fn write(#[borrow] msg: i32) -> i32; pub fn f(none) -> i32 { return write(1); }"#,
    );
    assert!(out.has_errors());
    let diag = out
        .diagnostics
        .iter()
        .find(|d| d.code == "E-SEMA-FFI-OUTSIDE-UNSAFE")
        .expect("missing FFI-outside-unsafe diagnostic");
    assert!(diag.message.contains("unsafe"), "unexpected message: {}", diag.message);
    assert!(out.ir.is_none());
}
