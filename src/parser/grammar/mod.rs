//! Grammar productions, wired together into the single entry point
//! [`parse_unit`]. Submodules are ordered leaves-first: `ty`/`pattern` have
//! no dependents within the grammar, `expr` builds on both, `stmt` builds on
//! `expr`, and `decl` builds on `stmt`/`expr` (`spec.md` §2 "Dependency
//! order").
//!
//! Error recovery lives only here, at declaration granularity (`spec.md`
//! §4.2 "one diagnostic per mismatch, then resynchronize at the next
//! statement/declaration/module boundary"): a failing declaration is
//! diagnosed once and the parser skips forward to the next plausible
//! declaration start rather than cascading further errors from the same
//! failure.

pub mod decl;
pub mod expr;
pub mod pattern;
pub mod stmt;
pub mod ty;

use crate::ast::{ImportDecl, Module, PackageDecl};
use crate::diagnostics::Diagnostics;
use crate::lexer::{GetPosition, Token};
use crate::parser::ParseState;
use crate::span::SourceMap;

use self::ty::expect;

fn parse_package(state: &mut ParseState) -> Result<PackageDecl, crate::parser::ParseError> {
    let start = expect(state, |t| matches!(t, Token::Package { .. }), "package")?;
    let (name, _) = ty::expect_ident(state)?;
    let semi = expect(state, |t| matches!(t, Token::Semicolon { .. }), ";")?;
    let span = start.position().merge(&semi.position());
    Ok(PackageDecl { name, span })
}

fn parse_import(state: &mut ParseState) -> Result<ImportDecl, crate::parser::ParseError> {
    let start = expect(state, |t| matches!(t, Token::Import { .. }), "import")?;
    let Token::Str { value: path, .. } = state.peek() else {
        let tok = state.peek();
        return Err(crate::parser::ParseError::new(
            "E-PARSE-EXPECTED-IMPORT-PATH",
            format!("expected a string import path, found {tok:?}"),
            tok.position(),
        ));
    };
    state.next();
    let semi = expect(state, |t| matches!(t, Token::Semicolon { .. }), ";")?;
    let span = start.position().merge(&semi.position());
    Ok(ImportDecl { path, span })
}

/// Skips tokens until the next plausible declaration start (a leading `pub`/
/// `priv`/`fn`/`extern`/`struct`/`enum`/`type`) or end of file, so one bad
/// declaration does not cascade into spurious errors for everything after it.
fn synchronize(state: &mut ParseState) {
    loop {
        match state.peek() {
            Token::Eof { .. }
            | Token::Pub { .. }
            | Token::Priv { .. }
            | Token::Fn { .. }
            | Token::Extern { .. }
            | Token::Struct { .. }
            | Token::Enum { .. }
            | Token::TypeKw { .. } => return,
            _ => {
                state.next();
            }
        }
    }
}

/// Parses a full translation unit: a mandatory package declaration, zero or
/// more imports, then top-level declarations until EOF. Parse failures are
/// pushed to `diags` and do not abort the unit — the pipeline always
/// produces a (possibly partial) AST (`spec.md` §7).
pub fn parse_unit(tokens: Vec<Token>, sources: &SourceMap, diags: &mut Diagnostics) -> Module<()> {
    let mut state = ParseState::new(tokens);

    let package = match parse_package(&mut state) {
        Ok(package) => package,
        Err(e) => {
            diags.push(e.into_diagnostic(sources));
            synchronize(&mut state);
            PackageDecl {
                name: String::new(),
                span: crate::span::Span::dummy(),
            }
        }
    };

    let mut imports = vec![];
    while matches!(state.peek(), Token::Import { .. }) {
        match parse_import(&mut state) {
            Ok(import) => imports.push(import),
            Err(e) => {
                diags.push(e.into_diagnostic(sources));
                synchronize(&mut state);
            }
        }
    }

    let mut items = vec![];
    while !state.is_eof() {
        match decl::parse_declaration(&mut state) {
            Ok(item) => items.push(item),
            Err(e) => {
                diags.push(e.into_diagnostic(sources));
                synchronize(&mut state);
            }
        }
    }

    Module::new(package, imports, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;

    fn tokens_of(src: &str, sources: &mut SourceMap) -> Vec<Token> {
        let file = sources.add_file("t.ast", src);
        let mut diags = Diagnostics::new();
        crate::lexer::Lexer::tokenize(src, file, sources, &mut diags)
    }

    #[test]
    fn parses_a_minimal_unit() {
        let mut sources = SourceMap::new();
        let tokens = tokens_of("package main; fn f(none) -> i32 { 0 }", &mut sources);
        let mut diags = Diagnostics::new();
        let unit = parse_unit(tokens, &sources, &mut diags);
        assert_eq!(unit.package.name, "main");
        assert!(!diags.has_errors());
        assert_eq!(unit.items.len(), 1);
    }

    #[test]
    fn recovers_from_a_bad_declaration_and_keeps_parsing() {
        let mut sources = SourceMap::new();
        let tokens = tokens_of(
            "package main; fn !!! broken fn g(none) -> i32 { 1 }",
            &mut sources,
        );
        let mut diags = Diagnostics::new();
        let unit = parse_unit(tokens, &sources, &mut diags);
        assert!(diags.has_errors());
        assert_eq!(unit.items.len(), 1);
        assert_eq!(unit.items[0].name(), "g");
    }
}
