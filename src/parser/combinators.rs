//! A small algebra of parser combinators over [`ParseState`] — ordered
//! choice, sequencing, optional, and repetition — composed with operator
//! overloads exactly like the teacher's `Comb` type
//! (`crates/why_lib/src/parser/combinators.rs`), generalized from Y's
//! `Token`/`Terminal`/`AstNode` triple to Asthra's. Used for the
//! fixed-shape, list-like productions (parameter lists, call argument
//! lists) where a sequence/repetition reads more clearly than another
//! hand-rolled loop; the precedence-climbing expression grammar
//! (`parser::grammar::expr`) is still plain recursive descent, per
//! `spec.md` §4.2 "recursive-descent implementation of a PEG grammar".

use std::ops::{BitOr, BitXor, Not, Shr};

use crate::lexer::{Terminal, Token};
use crate::parser::{ParseError, ParseState};

#[derive(Clone)]
pub enum Comb<'a, Node> {
    Node {
        parser: &'a dyn Fn(&mut ParseState) -> Result<Node, ParseError>,
    },
    Terminal {
        token: Terminal,
    },
    Sequence {
        current: Box<Comb<'a, Node>>,
        next: Box<Comb<'a, Node>>,
    },
    Either {
        left: Box<Comb<'a, Node>>,
        right: Box<Comb<'a, Node>>,
    },
    Optional {
        inner: Box<Comb<'a, Node>>,
    },
    Repetition {
        inner: Box<Comb<'a, Node>>,
        amount: Option<usize>,
    },
}

impl<'a, Node> Comb<'a, Node> {
    pub fn node(parser: &'a dyn Fn(&mut ParseState) -> Result<Node, ParseError>) -> Self {
        Comb::Node { parser }
    }

    pub fn term(token: Terminal) -> Self {
        Comb::Terminal { token }
    }

    /// Run the combinator, returning every `Node` produced by nested
    /// `Comb::Node`s (terminals contribute nothing to the result vector,
    /// matching the teacher's convention: they are matched for shape only).
    pub fn parse(&self, tokens: &mut ParseState) -> Result<Vec<Node>, ParseError> {
        let mut matched = vec![];
        match self {
            Comb::Terminal { token } => {
                let t = tokens.peek();
                if matches!(t, Token::Eof { .. }) {
                    return Err(ParseError::new("E-PARSE-EOF", "unexpected end of file", t.position()));
                }
                if *token != t {
                    return Err(ParseError::new(
                        "E-PARSE-UNEXPECTED-TOKEN",
                        format!("unexpected token {t:?} while expecting {token:?}"),
                        t.position(),
                    ));
                }
                tokens.next();
            }
            Comb::Sequence { current, next } => {
                matched.extend(current.parse(tokens)?);
                matched.extend(next.parse(tokens)?);
            }
            Comb::Either { left, right } => {
                let save = tokens.get_index();
                match left.parse(tokens) {
                    Ok(result) => matched.extend(result),
                    Err(_) => {
                        tokens.set_index(save);
                        matched.extend(right.parse(tokens)?);
                    }
                }
            }
            Comb::Node { parser } => {
                matched.push(parser(tokens)?);
            }
            Comb::Optional { inner } => {
                let save = tokens.get_index();
                if let Ok(result) = inner.parse(tokens) {
                    matched.extend(result);
                } else {
                    tokens.set_index(save);
                }
            }
            Comb::Repetition { inner, amount } => {
                if let Some(amount) = amount {
                    for _ in 0..*amount {
                        matched.extend(inner.parse(tokens)?);
                    }
                } else {
                    let mut save = tokens.get_index();
                    while let Ok(result) = inner.parse(tokens) {
                        matched.extend(result);
                        save = tokens.get_index();
                    }
                    tokens.set_index(save);
                }
            }
        }
        Ok(matched)
    }
}

use crate::lexer::GetPosition;

impl<'a, Node> Shr for Comb<'a, Node> {
    type Output = Self;
    fn shr(self, rhs: Self) -> Self::Output {
        Comb::Sequence {
            current: Box::new(self),
            next: Box::new(rhs),
        }
    }
}

impl<'a, Node> BitOr for Comb<'a, Node> {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Comb::Either {
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }
}

impl<'a, Node> Not for Comb<'a, Node> {
    type Output = Self;
    fn not(self) -> Self::Output {
        Comb::Optional { inner: Box::new(self) }
    }
}

impl<'a, Node> BitXor<()> for Comb<'a, Node> {
    type Output = Self;
    fn bitxor(self, _rhs: ()) -> Self::Output {
        Comb::Repetition {
            inner: Box::new(self),
            amount: None,
        }
    }
}

impl<'a, Node> BitXor<usize> for Comb<'a, Node> {
    type Output = Self;
    fn bitxor(self, rhs: usize) -> Self::Output {
        Comb::Repetition {
            inner: Box::new(self),
            amount: Some(rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Param;
    use crate::span::{FileId, Span};

    fn dummy_span() -> Span {
        Span::new(FileId(0), 0, 1)
    }

    #[test]
    fn sequence_consumes_both_terminals() {
        let comb: Comb<()> = Comb::term(Terminal::LParen) >> Comb::term(Terminal::RParen);
        let mut state = ParseState::new(vec![
            Token::LParen { position: dummy_span() },
            Token::RParen { position: dummy_span() },
            Token::Eof { position: dummy_span() },
        ]);
        assert!(comb.parse(&mut state).is_ok());
        assert_eq!(state.get_index(), 2);
    }

    #[test]
    fn either_backtracks_on_failure() {
        let comb: Comb<()> = Comb::term(Terminal::Comma) | Comb::term(Terminal::Semicolon);
        let mut state = ParseState::new(vec![
            Token::Semicolon { position: dummy_span() },
            Token::Eof { position: dummy_span() },
        ]);
        assert!(comb.parse(&mut state).is_ok());
        assert_eq!(state.get_index(), 1);
    }

    #[test]
    fn optional_does_not_consume_on_mismatch() {
        let comb: Comb<()> = !Comb::term(Terminal::Comma);
        let mut state = ParseState::new(vec![Token::Eof { position: dummy_span() }]);
        assert_eq!(comb.parse(&mut state), Ok(vec![]));
        assert_eq!(state.get_index(), 0);
    }

    #[test]
    fn node_combinator_invokes_inner_parser() {
        fn parse_nothing(_state: &mut ParseState) -> Result<Param, ParseError> {
            Ok(Param {
                name: "x".into(),
                ty: crate::ast::TypeExpr::Named {
                    name: "i32".into(),
                    span: dummy_span(),
                },
                span: dummy_span(),
            })
        }
        let comb = Comb::node(&parse_nothing);
        let mut state = ParseState::new(vec![Token::Eof { position: dummy_span() }]);
        let result = comb.parse(&mut state).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "x");
    }
}
