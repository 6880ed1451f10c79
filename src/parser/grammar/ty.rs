//! Syntactic type grammar: `named`, `*[mut]T` (pointer), `[]T`/`[N]T`
//! (slice/array, with an optional `mut` element marker), `fn(T...) -> T`,
//! and `Name<T...>` generic instantiation (`spec.md` §3 "Types (syntactic)").

use crate::ast::{Spanned, TypeExpr};
use crate::lexer::{GetPosition, Token};
use crate::parser::{ParseError, ParseState};

pub fn parse_type(state: &mut ParseState) -> Result<TypeExpr, ParseError> {
    match state.peek() {
        Token::Star { position } => {
            state.next();
            let mutable = consume_mut(state);
            let pointee = parse_type(state)?;
            let span = position.merge(&pointee.span());
            Ok(TypeExpr::Pointer {
                pointee: Box::new(pointee),
                mutable,
                span,
            })
        }
        Token::LBracket { position } => {
            state.next();
            if let Token::RBracket { .. } = state.peek() {
                state.next();
                let mutable = consume_mut(state);
                let element = parse_type(state)?;
                let span = position.merge(&element.span());
                Ok(TypeExpr::Slice {
                    element: Box::new(element),
                    mutable,
                    span,
                })
            } else {
                let Token::Integer { value: length, .. } = state.peek() else {
                    let tok = state.peek();
                    return Err(ParseError::new(
                        "E-PARSE-EXPECTED-ARRAY-LENGTH",
                        "expected an integer array length",
                        tok.position(),
                    ));
                };
                state.next();
                expect(state, |t| matches!(t, Token::RBracket { .. }), "]")?;
                let element = parse_type(state)?;
                let span = position.merge(&element.span());
                Ok(TypeExpr::Array {
                    element: Box::new(element),
                    length,
                    span,
                })
            }
        }
        Token::Fn { position } => {
            state.next();
            expect(state, |t| matches!(t, Token::LParen { .. }), "(")?;
            let mut params = vec![];
            if !matches!(state.peek(), Token::RParen { .. }) {
                loop {
                    params.push(parse_type(state)?);
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
            let span = position.merge(&return_type.span());
            Ok(TypeExpr::Function {
                params,
                return_type: Box::new(return_type),
                span,
            })
        }
        Token::Id { value, position } => {
            state.next();
            if matches!(state.peek(), Token::Lt { .. }) {
                state.next();
                let mut args = vec![parse_type(state)?];
                while matches!(state.peek(), Token::Comma { .. }) {
                    state.next();
                    args.push(parse_type(state)?);
                }
                let close = state.peek();
                expect(state, |t| matches!(t, Token::Gt { .. }), ">")?;
                let span = position.merge(&close.position());
                Ok(TypeExpr::Generic {
                    name: value,
                    args,
                    span,
                })
            } else {
                Ok(TypeExpr::Named { name: value, span: position })
            }
        }
        other => Err(ParseError::new(
            "E-PARSE-EXPECTED-TYPE",
            format!("expected a type, found {other:?}"),
            other.position(),
        )),
    }
}

fn consume_mut(state: &mut ParseState) -> bool {
    if matches!(state.peek(), Token::Mut { .. }) {
        state.next();
        true
    } else {
        false
    }
}

pub(crate) fn expect(
    state: &mut ParseState,
    matches_kind: impl Fn(&Token) -> bool,
    expected: &str,
) -> Result<Token, ParseError> {
    let tok = state.peek();
    if matches_kind(&tok) {
        state.next();
        Ok(tok)
    } else {
        Err(ParseError::new(
            "E-PARSE-UNEXPECTED-TOKEN",
            format!("expected {expected}, found {tok:?}"),
            tok.position(),
        ))
    }
}

pub(crate) fn expect_ident(state: &mut ParseState) -> Result<(String, crate::span::Span), ParseError> {
    match state.peek() {
        Token::Id { value, position } => {
            state.next();
            Ok((value, position))
        }
        other => Err(ParseError::new(
            "E-PARSE-EXPECTED-IDENT",
            format!("expected an identifier, found {other:?}"),
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
    fn parses_pointer_and_slice_types() {
        let mut state = ParseState::new(tokens_of("*mut i32"));
        let ty = parse_type(&mut state).unwrap();
        assert!(matches!(ty, TypeExpr::Pointer { mutable: true, .. }));

        let mut state = ParseState::new(tokens_of("[]i32"));
        let ty = parse_type(&mut state).unwrap();
        assert!(matches!(ty, TypeExpr::Slice { mutable: false, .. }));

        let mut state = ParseState::new(tokens_of("[4]i32"));
        let ty = parse_type(&mut state).unwrap();
        assert!(matches!(ty, TypeExpr::Array { length: 4, .. }));
    }

    #[test]
    fn parses_generic_instantiation() {
        let mut state = ParseState::new(tokens_of("Result<i32, string>"));
        let ty = parse_type(&mut state).unwrap();
        let TypeExpr::Generic { name, args, .. } = ty else { panic!() };
        assert_eq!(name, "Result");
        assert_eq!(args.len(), 2);
    }
}
