//! Pattern grammar: `_` wildcard, bare identifier binding, and
//! `Name.Variant[(pat, ...)]` enum-constructor patterns (`spec.md` §3
//! "Patterns (in match/if-let)").

use crate::ast::Pattern;
use crate::lexer::{GetPosition, Token};
use crate::parser::grammar::ty::expect;
use crate::parser::{ParseError, ParseState};

pub fn parse_pattern(state: &mut ParseState) -> Result<Pattern, ParseError> {
    let Token::Id { value: name, position } = state.peek() else {
        let tok = state.peek();
        return Err(ParseError::new(
            "E-PARSE-EXPECTED-PATTERN",
            format!("expected a pattern, found {tok:?}"),
            tok.position(),
        ));
    };
    state.next();

    if name == "_" {
        return Ok(Pattern::Wildcard { span: position });
    }

    if matches!(state.peek(), Token::Dot { .. }) {
        state.next();
        let (variant, variant_span) = super::ty::expect_ident(state)?;
        let mut bindings = vec![];
        let mut end = variant_span;
        if matches!(state.peek(), Token::LParen { .. }) {
            state.next();
            if !matches!(state.peek(), Token::RParen { .. }) {
                loop {
                    bindings.push(parse_pattern(state)?);
                    if matches!(state.peek(), Token::Comma { .. }) {
                        state.next();
                        continue;
                    }
                    break;
                }
            }
            let close = expect(state, |t| matches!(t, Token::RParen { .. }), ")")?;
            end = close.position();
        }
        return Ok(Pattern::Variant {
            enum_name: name,
            variant,
            bindings,
            span: position.merge(&end),
        });
    }

    Ok(Pattern::Binding { name, span: position })
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
    fn parses_wildcard_and_binding() {
        let mut state = ParseState::new(tokens_of("_"));
        assert!(matches!(parse_pattern(&mut state).unwrap(), Pattern::Wildcard { .. }));

        let mut state = ParseState::new(tokens_of("x"));
        assert!(matches!(parse_pattern(&mut state).unwrap(), Pattern::Binding { .. }));
    }

    #[test]
    fn parses_variant_pattern_with_bindings() {
        let mut state = ParseState::new(tokens_of("Option.Some(x)"));
        let pat = parse_pattern(&mut state).unwrap();
        let Pattern::Variant {
            enum_name,
            variant,
            bindings,
            ..
        } = pat
        else {
            panic!()
        };
        assert_eq!(enum_name, "Option");
        assert_eq!(variant, "Some");
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn parses_nullary_variant_pattern() {
        let mut state = ParseState::new(tokens_of("E.A"));
        let pat = parse_pattern(&mut state).unwrap();
        assert!(matches!(pat, Pattern::Variant { bindings, .. } if bindings.is_empty()));
    }
}
