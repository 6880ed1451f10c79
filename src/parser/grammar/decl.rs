//! Top-level declaration grammar: function, extern function, struct, enum,
//! type alias, each with explicit `pub`/`priv` visibility (`spec.md` §3
//! "Declarations"). `extern` function parameters additionally accept an
//! FFI ownership annotation, written `#[transfer_full]` / `#[transfer_none]`
//! / `#[borrow]` immediately before the parameter (`spec.md` §4.3 "FFI and
//! unsafe").

use crate::ast::{
    Declaration, EnumDecl, EnumVariant, ExternFunctionDecl, ExternParam, FunctionDecl, Param,
    OwnershipAnnotation, Spanned, StructDecl, TypeAliasDecl, Visibility,
};
use crate::lexer::{GetPosition, Token};
use crate::parser::grammar::expr::parse_block;
use crate::parser::grammar::ty::{expect, expect_ident, parse_type};
use crate::parser::{ParseError, ParseState};

fn parse_visibility(state: &mut ParseState) -> Visibility {
    match state.peek() {
        Token::Pub { .. } => {
            state.next();
            Visibility::Pub
        }
        Token::Priv { .. } => {
            state.next();
            Visibility::Priv
        }
        // Default visibility is private (`spec.md` §3 "declarations are
        // private unless marked `pub`").
        _ => Visibility::Priv,
    }
}

fn parse_param(state: &mut ParseState) -> Result<Param, ParseError> {
    let (name, position) = expect_ident(state)?;
    expect(state, |t| matches!(t, Token::Colon { .. }), ":")?;
    let ty = parse_type(state)?;
    let span = position.merge(&ty.span());
    Ok(Param { name, ty, span })
}

fn parse_ownership_annotation(state: &mut ParseState) -> Result<Option<OwnershipAnnotation>, ParseError> {
    if !matches!(state.peek(), Token::Hash { .. }) {
        return Ok(None);
    }
    state.next();
    expect(state, |t| matches!(t, Token::LBracket { .. }), "[")?;
    let (name, position) = expect_ident(state)?;
    let ownership = match name.as_str() {
        "transfer_full" => OwnershipAnnotation::TransferFull,
        "transfer_none" => OwnershipAnnotation::TransferNone,
        "borrow" => OwnershipAnnotation::Borrow,
        _ => {
            return Err(ParseError::new(
                "E-PARSE-UNKNOWN-OWNERSHIP-ANNOTATION",
                format!("unknown ownership annotation '{name}'"),
                position,
            ))
        }
    };
    expect(state, |t| matches!(t, Token::RBracket { .. }), "]")?;
    Ok(Some(ownership))
}

/// Parses a parenthesized parameter list, honoring the literal `none`
/// no-parameters marker (`spec.md` §4.3 "the `none` parameter marker").
fn parse_param_list(state: &mut ParseState) -> Result<Vec<Param>, ParseError> {
    expect(state, |t| matches!(t, Token::LParen { .. }), "(")?;
    if matches!(state.peek(), Token::NoneKeyword { .. }) {
        state.next();
        expect(state, |t| matches!(t, Token::RParen { .. }), ")")?;
        return Ok(vec![]);
    }
    let mut params = vec![];
    if !matches!(state.peek(), Token::RParen { .. }) {
        loop {
            params.push(parse_param(state)?);
            if matches!(state.peek(), Token::Comma { .. }) {
                state.next();
                continue;
            }
            break;
        }
    }
    expect(state, |t| matches!(t, Token::RParen { .. }), ")")?;
    Ok(params)
}

fn parse_function(state: &mut ParseState, visibility: Visibility, start: crate::span::Span) -> Result<Declaration<()>, ParseError> {
    let (name, _) = expect_ident(state)?;
    let params = parse_param_list(state)?;
    expect(state, |t| matches!(t, Token::Arrow { .. }), "->")?;
    let return_type = parse_type(state)?;
    let body = parse_block(state)?;
    let span = start.merge(&body.span);
    Ok(Declaration::Function(FunctionDecl {
        visibility,
        name,
        params,
        return_type,
        body,
        span,
    }))
}

fn parse_extern_function(state: &mut ParseState, visibility: Visibility, start: crate::span::Span) -> Result<Declaration<()>, ParseError> {
    expect(state, |t| matches!(t, Token::Extern { .. }), "extern")?;
    let Token::Str { value: abi, .. } = state.peek() else {
        let tok = state.peek();
        return Err(ParseError::new(
            "E-PARSE-EXPECTED-ABI-STRING",
            format!("expected an ABI string literal, found {tok:?}"),
            tok.position(),
        ));
    };
    state.next();
    expect(state, |t| matches!(t, Token::Fn { .. }), "fn")?;
    let (name, _) = expect_ident(state)?;

    expect(state, |t| matches!(t, Token::LParen { .. }), "(")?;
    let mut params = vec![];
    if !matches!(state.peek(), Token::RParen { .. }) {
        loop {
            let ownership = parse_ownership_annotation(state)?;
            let param = parse_param(state)?;
            params.push(ExternParam { param, ownership });
            if matches!(state.peek(), Token::Comma { .. }) {
                state.next();
                continue;
            }
            break;
        }
    }
    expect(state, |t| matches!(t, Token::RParen { .. }), ")")?;
    expect(state, |t| matches!(t, Token::Arrow { .. }), "->")?;
    let return_type = parse_type(state)?;
    let semi = expect(state, |t| matches!(t, Token::Semicolon { .. }), ";")?;
    let span = start.merge(&semi.position());

    Ok(Declaration::ExternFunction(ExternFunctionDecl {
        visibility,
        name,
        abi,
        params,
        return_type,
        span,
    }))
}

fn parse_struct(state: &mut ParseState, visibility: Visibility, start: crate::span::Span) -> Result<Declaration<()>, ParseError> {
    expect(state, |t| matches!(t, Token::Struct { .. }), "struct")?;
    let (name, _) = expect_ident(state)?;
    expect(state, |t| matches!(t, Token::LBrace { .. }), "{")?;
    let mut fields = vec![];
    while !matches!(state.peek(), Token::RBrace { .. } | Token::Eof { .. }) {
        let (field_name, _) = expect_ident(state)?;
        expect(state, |t| matches!(t, Token::Colon { .. }), ":")?;
        let ty = parse_type(state)?;
        fields.push((field_name, ty));
        if matches!(state.peek(), Token::Comma { .. }) {
            state.next();
        }
    }
    let close = expect(state, |t| matches!(t, Token::RBrace { .. }), "}")?;
    let span = start.merge(&close.position());
    Ok(Declaration::Struct(StructDecl {
        visibility,
        name,
        fields,
        span,
    }))
}

fn parse_enum(state: &mut ParseState, visibility: Visibility, start: crate::span::Span) -> Result<Declaration<()>, ParseError> {
    expect(state, |t| matches!(t, Token::Enum { .. }), "enum")?;
    let (name, _) = expect_ident(state)?;
    expect(state, |t| matches!(t, Token::LBrace { .. }), "{")?;
    let mut variants = vec![];
    while !matches!(state.peek(), Token::RBrace { .. } | Token::Eof { .. }) {
        let (variant_name, variant_position) = expect_ident(state)?;
        let mut end = variant_position;
        let payload = if matches!(state.peek(), Token::LParen { .. }) {
            state.next();
            let ty = parse_type(state)?;
            let close = expect(state, |t| matches!(t, Token::RParen { .. }), ")")?;
            end = close.position();
            Some(ty)
        } else {
            None
        };
        variants.push(EnumVariant {
            name: variant_name,
            payload,
            span: variant_position.merge(&end),
        });
        if matches!(state.peek(), Token::Comma { .. }) {
            state.next();
        }
    }
    let close = expect(state, |t| matches!(t, Token::RBrace { .. }), "}")?;
    let span = start.merge(&close.position());
    Ok(Declaration::Enum(EnumDecl {
        visibility,
        name,
        variants,
        span,
    }))
}

fn parse_type_alias(state: &mut ParseState, visibility: Visibility, start: crate::span::Span) -> Result<Declaration<()>, ParseError> {
    expect(state, |t| matches!(t, Token::TypeKw { .. }), "type")?;
    let (name, _) = expect_ident(state)?;
    expect(state, |t| matches!(t, Token::Assign { .. }), "=")?;
    let target = parse_type(state)?;
    let semi = expect(state, |t| matches!(t, Token::Semicolon { .. }), ";")?;
    let span = start.merge(&semi.position());
    Ok(Declaration::TypeAlias(TypeAliasDecl {
        visibility,
        name,
        target,
        span,
    }))
}

/// Parses one top-level item, dispatching on the leading keyword after
/// visibility.
pub fn parse_declaration(state: &mut ParseState) -> Result<Declaration<()>, ParseError> {
    let start = state.peek().position();
    let visibility = parse_visibility(state);

    match state.peek() {
        Token::Fn { .. } => {
            state.next();
            parse_function(state, visibility, start)
        }
        Token::Extern { .. } => parse_extern_function(state, visibility, start),
        Token::Struct { .. } => parse_struct(state, visibility, start),
        Token::Enum { .. } => parse_enum(state, visibility, start),
        Token::TypeKw { .. } => parse_type_alias(state, visibility, start),
        other => Err(ParseError::new(
            "E-PARSE-EXPECTED-DECLARATION",
            format!("expected a declaration, found {other:?}"),
            other.position(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_of(src: &str) -> Vec<Token> {
        let mut sources = crate::span::SourceMap::new();
        let file = sources.add_file("t.ast", src);
        let mut diags = crate::diagnostics::Diagnostics::new();
        crate::lexer::Lexer::tokenize(src, file, &sources, &mut diags)
    }

    #[test]
    fn parses_pub_function_with_none_params() {
        let mut state = ParseState::new(tokens_of("pub fn main(none) -> i32 { 0 }"));
        let decl = parse_declaration(&mut state).unwrap();
        let Declaration::Function(f) = decl else { panic!() };
        assert_eq!(f.visibility, Visibility::Pub);
        assert!(f.params.is_empty());
    }

    #[test]
    fn parses_extern_function_with_ownership_annotations() {
        let mut state = ParseState::new(tokens_of(
            r#"extern "C" fn free(#[transfer_full] ptr: *mut i32) -> unit;"#,
        ));
        let decl = parse_declaration(&mut state).unwrap();
        let Declaration::ExternFunction(f) = decl else { panic!() };
        assert_eq!(f.abi, "C");
        assert_eq!(f.params[0].ownership, Some(OwnershipAnnotation::TransferFull));
    }

    #[test]
    fn parses_struct_fields() {
        let mut state = ParseState::new(tokens_of("struct Point { x: i32, y: i32 }"));
        let decl = parse_declaration(&mut state).unwrap();
        let Declaration::Struct(s) = decl else { panic!() };
        assert_eq!(s.fields.len(), 2);
    }

    #[test]
    fn parses_enum_with_payload_variants() {
        let mut state = ParseState::new(tokens_of("enum Option { Some(i32), None }"));
        let decl = parse_declaration(&mut state).unwrap();
        let Declaration::Enum(e) = decl else { panic!() };
        assert_eq!(e.variants.len(), 2);
        assert!(e.variants[0].payload.is_some());
        assert!(e.variants[1].payload.is_none());
    }
}
