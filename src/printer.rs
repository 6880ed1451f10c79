//! Pretty-printer: renders a parsed translation unit back to Asthra source
//! text. Grounded in the teacher's `formatter` module (`crates/why_lib/src/
//! formatter/mod.rs`) — a recursive visitor threading a single indentation
//! counter through nested blocks — generalized from the teacher's own node
//! set to this crate's `ast::{Declaration, Expression, Statement, Pattern,
//! TypeExpr}`.
//!
//! This module exists to support the round-trip property
//! (`parse(print(ast)) == ast`, modulo spans) exercised by the crate's
//! property tests; it is not reachable from [`crate::compile_unit`] and
//! carries no diagnostics of its own — a printer has nothing to recover
//! from, it only ever renders a tree that already parsed successfully.
//!
//! Operands that are not lexically atomic (binary/unary/cast/if/match/
//! spawn/await expressions) are always parenthesized when nested inside
//! another expression, even where the grammar's precedence would make the
//! parentheses redundant. This trades minimal output for a printer simple
//! enough to trust: every nesting site uses the same rule instead of
//! re-deriving precedence per call site.

use crate::ast::{
    self, Block, Declaration, EnumDecl, ExternFunctionDecl, FunctionDecl, MatchArm,
    OwnershipAnnotation, Pattern, StructDecl, TypeAliasDecl, TypeExpr, UnaryOp, Visibility,
};

const INDENT_WIDTH: usize = 4;

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent * INDENT_WIDTH {
            self.out.push(' ');
        }
    }
}

/// Renders a whole translation unit: the package declaration, its imports,
/// then every top-level item in order.
pub fn print_module(module: &ast::Module<()>) -> String {
    let mut p = Printer::new();
    p.write("package ");
    p.write(&module.package.name);
    p.write(";");

    for import in &module.imports {
        p.newline();
        p.write("import \"");
        p.write(&import.path);
        p.write("\";");
    }

    for item in &module.items {
        p.newline();
        p.newline();
        print_declaration(&mut p, item);
    }

    p.out
}

/// Renders a single declaration in isolation (used by property tests that
/// round-trip one item at a time rather than a whole module).
pub fn print_decl(decl: &Declaration<()>) -> String {
    let mut p = Printer::new();
    print_declaration(&mut p, decl);
    p.out
}

/// Renders a type expression in isolation.
pub fn print_type(ty: &TypeExpr) -> String {
    let mut p = Printer::new();
    print_type_expr(&mut p, ty);
    p.out
}

fn print_visibility(p: &mut Printer, vis: Visibility) {
    if vis == Visibility::Pub {
        p.write("pub ");
    }
}

fn print_declaration(p: &mut Printer, decl: &Declaration<()>) {
    match decl {
        Declaration::Function(f) => print_function(p, f),
        Declaration::ExternFunction(f) => print_extern_function(p, f),
        Declaration::Struct(s) => print_struct(p, s),
        Declaration::Enum(e) => print_enum(p, e),
        Declaration::TypeAlias(a) => print_type_alias(p, a),
    }
}

fn print_function(p: &mut Printer, f: &FunctionDecl<()>) {
    print_visibility(p, f.visibility);
    p.write("fn ");
    p.write(&f.name);
    p.write("(");
    print_param_list(p, &f.params);
    p.write(") -> ");
    print_type_expr(p, &f.return_type);
    p.write(" ");
    print_block(p, &f.body);
}

fn print_param_list(p: &mut Printer, params: &[ast::Param]) {
    if params.is_empty() {
        p.write("none");
        return;
    }
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            p.write(", ");
        }
        p.write(&param.name);
        p.write(": ");
        print_type_expr(p, &param.ty);
    }
}

fn print_extern_function(p: &mut Printer, f: &ExternFunctionDecl) {
    print_visibility(p, f.visibility);
    p.write("extern \"");
    p.write(&f.abi);
    p.write("\" fn ");
    p.write(&f.name);
    p.write("(");
    for (i, ep) in f.params.iter().enumerate() {
        if i > 0 {
            p.write(", ");
        }
        if let Some(ownership) = ep.ownership {
            p.write(match ownership {
                OwnershipAnnotation::TransferFull => "#[transfer_full] ",
                OwnershipAnnotation::TransferNone => "#[transfer_none] ",
                OwnershipAnnotation::Borrow => "#[borrow] ",
            });
        }
        p.write(&ep.param.name);
        p.write(": ");
        print_type_expr(p, &ep.param.ty);
    }
    p.write(") -> ");
    print_type_expr(p, &f.return_type);
    p.write(";");
}

fn print_struct(p: &mut Printer, s: &StructDecl) {
    print_visibility(p, s.visibility);
    p.write("struct ");
    p.write(&s.name);
    p.write(" {");
    p.indent += 1;
    for (name, ty) in &s.fields {
        p.newline();
        p.write(name);
        p.write(": ");
        print_type_expr(p, ty);
        p.write(",");
    }
    p.indent -= 1;
    p.newline();
    p.write("}");
}

fn print_enum(p: &mut Printer, e: &EnumDecl) {
    print_visibility(p, e.visibility);
    p.write("enum ");
    p.write(&e.name);
    p.write(" {");
    p.indent += 1;
    for variant in &e.variants {
        p.newline();
        p.write(&variant.name);
        if let Some(payload) = &variant.payload {
            p.write("(");
            print_type_expr(p, payload);
            p.write(")");
        }
        p.write(",");
    }
    p.indent -= 1;
    p.newline();
    p.write("}");
}

fn print_type_alias(p: &mut Printer, a: &TypeAliasDecl) {
    print_visibility(p, a.visibility);
    p.write("type ");
    p.write(&a.name);
    p.write(" = ");
    print_type_expr(p, &a.target);
    p.write(";");
}

fn print_type_expr(p: &mut Printer, ty: &TypeExpr) {
    match ty {
        TypeExpr::Named { name, .. } => p.write(name),
        TypeExpr::Pointer { pointee, mutable, .. } => {
            p.write("*");
            if *mutable {
                p.write("mut ");
            }
            print_type_expr(p, pointee);
        }
        TypeExpr::Slice { element, mutable, .. } => {
            p.write("[]");
            if *mutable {
                p.write("mut ");
            }
            print_type_expr(p, element);
        }
        TypeExpr::Array { element, length, .. } => {
            p.write("[");
            p.write(&length.to_string());
            p.write("]");
            print_type_expr(p, element);
        }
        TypeExpr::Function { params, return_type, .. } => {
            p.write("fn(");
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    p.write(", ");
                }
                print_type_expr(p, param);
            }
            p.write(") -> ");
            print_type_expr(p, return_type);
        }
        TypeExpr::Generic { name, args, .. } => {
            p.write(name);
            p.write("<");
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    p.write(", ");
                }
                print_type_expr(p, arg);
            }
            p.write(">");
        }
    }
}

fn print_block(p: &mut Printer, block: &Block<()>) {
    p.write("{");
    p.indent += 1;
    for stmt in &block.statements {
        p.newline();
        print_statement(p, stmt);
    }
    if let Some(tail) = &block.tail {
        p.newline();
        print_expr(p, tail);
    }
    p.indent -= 1;
    p.newline();
    p.write("}");
}

fn print_statement(p: &mut Printer, stmt: &ast::Statement<()>) {
    match stmt {
        ast::Statement::Let {
            name,
            mutable,
            ty,
            initializer,
            ..
        } => {
            p.write("let ");
            if *mutable {
                p.write("mut ");
            }
            p.write(name);
            p.write(": ");
            print_type_expr(p, ty);
            if let Some(init) = initializer {
                p.write(" = ");
                print_expr(p, init);
            }
            p.write(";");
        }
        ast::Statement::Assign { target, value, .. } => {
            print_expr(p, target);
            p.write(" = ");
            print_expr(p, value);
            p.write(";");
        }
        ast::Statement::Expr(e) => {
            print_expr(p, e);
            p.write(";");
        }
        ast::Statement::Return { value, .. } => {
            p.write("return");
            if let Some(v) = value {
                p.write(" ");
                print_expr(p, v);
            }
            p.write(";");
        }
    }
}

/// Non-atomic expression kinds: always parenthesized when they appear as an
/// operand of another expression (see module doc comment).
fn needs_parens(e: &ast::Expression<()>) -> bool {
    matches!(
        e,
        ast::Expression::Unary { .. }
            | ast::Expression::Binary { .. }
            | ast::Expression::Cast { .. }
            | ast::Expression::If { .. }
            | ast::Expression::Match { .. }
            | ast::Expression::Spawn { .. }
            | ast::Expression::Await { .. }
    )
}

fn print_operand(p: &mut Printer, e: &ast::Expression<()>) {
    if needs_parens(e) {
        p.write("(");
        print_expr(p, e);
        p.write(")");
    } else {
        print_expr(p, e);
    }
}

fn print_expr(p: &mut Printer, expr: &ast::Expression<()>) {
    match expr {
        ast::Expression::IntLiteral { value, .. } => p.write(&value.to_string()),
        ast::Expression::FloatLiteral { value, .. } => p.write(&value.to_string()),
        ast::Expression::BoolLiteral { value, .. } => p.write(if *value { "true" } else { "false" }),
        ast::Expression::StringLiteral { value, .. } => {
            p.write("\"");
            p.write(&escape_string(value));
            p.write("\"");
        }
        ast::Expression::CharLiteral { value, .. } => {
            p.write("'");
            p.write(&escape_char(*value));
            p.write("'");
        }
        ast::Expression::UnitLiteral { .. } => p.write("()"),
        ast::Expression::Ident { name, .. } => p.write(name),
        ast::Expression::Field { base, field, .. } => {
            print_operand(p, base);
            p.write(".");
            p.write(field);
        }
        ast::Expression::Index { base, index, .. } => {
            print_operand(p, base);
            p.write("[");
            print_expr(p, index);
            p.write("]");
        }
        ast::Expression::Call { callee, args, .. } => {
            print_operand(p, callee);
            p.write("(");
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    p.write(", ");
                }
                print_expr(p, arg);
            }
            p.write(")");
        }
        ast::Expression::Unary { op, operand, .. } => {
            p.write(match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
                UnaryOp::Deref => "*",
                UnaryOp::Ref { mutable: false } => "&",
                UnaryOp::Ref { mutable: true } => "&mut ",
            });
            print_operand(p, operand);
        }
        ast::Expression::Binary { op, lhs, rhs, .. } => {
            print_operand(p, lhs);
            p.write(" ");
            p.write(binop_text(*op));
            p.write(" ");
            print_operand(p, rhs);
        }
        ast::Expression::Cast { expr, target, .. } => {
            print_operand(p, expr);
            p.write(" as ");
            print_type_expr(p, target);
        }
        ast::Expression::Block(block) => print_block(p, block),
        ast::Expression::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            p.write("if ");
            print_expr(p, condition);
            p.write(" ");
            print_block(p, then_branch);
            if let Some(else_expr) = else_branch {
                p.write(" else ");
                print_expr(p, else_expr);
            }
        }
        ast::Expression::Match { scrutinee, arms, .. } => {
            p.write("match ");
            print_expr(p, scrutinee);
            p.write(" {");
            p.indent += 1;
            for arm in arms {
                p.newline();
                print_match_arm(p, arm);
            }
            p.indent -= 1;
            p.newline();
            p.write("}");
        }
        ast::Expression::Spawn { call, .. } => {
            p.write("spawn ");
            print_operand(p, call);
        }
        ast::Expression::Await { expr, .. } => {
            p.write("await ");
            print_operand(p, expr);
        }
        ast::Expression::Unsafe(block) => {
            p.write("unsafe ");
            print_block(p, block);
        }
    }
}

fn print_match_arm(p: &mut Printer, arm: &MatchArm<()>) {
    print_pattern(p, &arm.pattern);
    p.write(" => ");
    print_expr(p, &arm.body);
    p.write(",");
}

fn print_pattern(p: &mut Printer, pattern: &Pattern) {
    match pattern {
        Pattern::Variant {
            enum_name,
            variant,
            bindings,
            ..
        } => {
            p.write(enum_name);
            p.write(".");
            p.write(variant);
            if !bindings.is_empty() {
                p.write("(");
                for (i, b) in bindings.iter().enumerate() {
                    if i > 0 {
                        p.write(", ");
                    }
                    print_pattern(p, b);
                }
                p.write(")");
            }
        }
        Pattern::Binding { name, .. } => p.write(name),
        Pattern::Wildcard { .. } => p.write("_"),
    }
}

fn binop_text(op: ast::BinaryOp) -> &'static str {
    use ast::BinaryOp::*;
    match op {
        Or => "||",
        And => "&&",
        Eq => "==",
        Ne => "!=",
        Lt => "<",
        Le => "<=",
        Gt => ">",
        Ge => ">=",
        BitOr => "|",
        BitXor => "^",
        BitAnd => "&",
        Shl => "<<",
        Shr => ">>",
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Rem => "%",
    }
}

fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

fn escape_char(value: char) -> String {
    match value {
        '\\' => "\\\\".to_string(),
        '\'' => "\\'".to_string(),
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        '\0' => "\\0".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::lexer::Lexer;
    use crate::parser::parse_unit;
    use crate::span::SourceMap;

    fn parse(src: &str) -> ast::Module<()> {
        let mut sources = SourceMap::new();
        let file = sources.add_file("t.ast", src);
        let mut diags = Diagnostics::new();
        let tokens = Lexer::tokenize(src, file, &sources, &mut diags);
        let module = parse_unit(tokens, &sources, &mut diags);
        assert!(!diags.has_errors(), "fixture failed to parse: {src}");
        module
    }

    #[test]
    fn round_trips_a_minimal_function() {
        let module = parse("package main; fn f(none) -> i32 { 0 }");
        let printed = print_module(&module);
        let reparsed = parse(&printed);
        assert_eq!(reparsed.items.len(), 1);
        assert_eq!(reparsed.package.name, "main");
    }

    #[test]
    fn round_trips_nested_binary_and_call_expressions() {
        let module = parse(
            "package main; fn f(x: i32, y: i32) -> i32 { return x * (y + 1) - foo(x, y); }",
        );
        let printed = print_module(&module);
        let reparsed = parse(&printed);
        assert_eq!(reparsed.items.len(), 1);
    }

    #[test]
    fn round_trips_if_and_match() {
        let module = parse(
            "package main; enum Option { Some(i32), None } fn f(x: Option) -> i32 { match x { Option.Some(y) => if y > 0 { y } else { 0 - y }, _ => 0 } }",
        );
        let printed = print_module(&module);
        let reparsed = parse(&printed);
        assert_eq!(reparsed.items.len(), 2);
    }

    #[test]
    fn round_trips_struct_and_extern_declarations() {
        let module = parse(
            r#"package main; struct Point { x: i32, y: i32 } extern "C" fn malloc(#[transfer_full] size: i32) -> *mut i32;"#,
        );
        let printed = print_module(&module);
        let reparsed = parse(&printed);
        assert_eq!(reparsed.items.len(), 2);
    }
}
