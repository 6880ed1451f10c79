//! Expression grammar: a precedence-climbing chain of pure, `Diagnostics`-free
//! `Result`-returning functions (`spec.md` §4.2 "recursive-descent
//! implementation of a PEG grammar"), from loosest to tightest:
//!
//! `or -> and -> comparison (non-associative) -> bitor -> bitxor -> bitand
//! -> shift -> additive -> multiplicative -> unary -> postfix -> primary`
//!
//! Conversion to [`crate::diagnostics::Diagnostic`] and error-recovery
//! synchronization happen only at the statement/declaration layer
//! (`parser::grammar::stmt`, `parser::grammar::decl`), not here.

use crate::ast::{BinaryOp, Block, Expression, MatchArm, UnaryOp};
use crate::lexer::{GetPosition, Token};
use crate::parser::grammar::pattern::parse_pattern;
use crate::parser::grammar::ty::{expect, parse_type};
use crate::parser::{ParseError, ParseState};

type Expr = Expression<()>;

pub fn parse_expr(state: &mut ParseState) -> Result<Expr, ParseError> {
    parse_or(state)
}

macro_rules! left_assoc_binop {
    ($name:ident, $next:expr, { $($tok:pat => $op:expr),+ $(,)? }) => {
        fn $name(state: &mut ParseState) -> Result<Expr, ParseError> {
            let mut lhs = $next(state)?;
            loop {
                let op = match state.peek() {
                    $($tok => $op,)+
                    _ => break,
                };
                state.next();
                let rhs = $next(state)?;
                let span = lhs.span().merge(&rhs.span());
                lhs = Expression::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    info: (),
                    span,
                };
            }
            Ok(lhs)
        }
    };
}

use crate::ast::Spanned;

fn parse_or(state: &mut ParseState) -> Result<Expr, ParseError> {
    parse_binop_or(state)
}

left_assoc_binop!(parse_binop_or, parse_and, { Token::OrOr { .. } => BinaryOp::Or });
left_assoc_binop!(parse_and, parse_comparison, { Token::AndAnd { .. } => BinaryOp::And });

/// Comparisons do not chain: `a < b < c` is rejected rather than parsed as
/// `(a < b) < c` (`spec.md` §4.2 "chained comparisons are a syntax error").
fn parse_comparison(state: &mut ParseState) -> Result<Expr, ParseError> {
    let lhs = parse_bitor(state)?;
    let op = match state.peek() {
        Token::EqEq { .. } => BinaryOp::Eq,
        Token::NotEq { .. } => BinaryOp::Ne,
        Token::Lt { .. } => BinaryOp::Lt,
        Token::Le { .. } => BinaryOp::Le,
        Token::Gt { .. } => BinaryOp::Gt,
        Token::Ge { .. } => BinaryOp::Ge,
        _ => return Ok(lhs),
    };
    state.next();
    let rhs = parse_bitor(state)?;
    let span = lhs.span().merge(&rhs.span());

    if let Token::EqEq { .. }
    | Token::NotEq { .. }
    | Token::Lt { .. }
    | Token::Le { .. }
    | Token::Gt { .. }
    | Token::Ge { .. } = state.peek()
    {
        let tok = state.peek();
        return Err(ParseError::new(
            "E-PARSE-CHAINED-COMPARISON",
            "comparison operators do not associate; parenthesize to disambiguate",
            tok.position(),
        ));
    }

    Ok(Expression::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        info: (),
        span,
    })
}

left_assoc_binop!(parse_bitor, parse_bitxor, { Token::Pipe { .. } => BinaryOp::BitOr });
left_assoc_binop!(parse_bitxor, parse_bitand, { Token::Caret { .. } => BinaryOp::BitXor });
left_assoc_binop!(parse_bitand, parse_shift, { Token::Amp { .. } => BinaryOp::BitAnd });
left_assoc_binop!(parse_shift, parse_additive, {
    Token::Shl { .. } => BinaryOp::Shl,
    Token::Shr { .. } => BinaryOp::Shr,
});
left_assoc_binop!(parse_additive, parse_multiplicative, {
    Token::Plus { .. } => BinaryOp::Add,
    Token::Minus { .. } => BinaryOp::Sub,
});
left_assoc_binop!(parse_multiplicative, parse_unary, {
    Token::Star { .. } => BinaryOp::Mul,
    Token::Slash { .. } => BinaryOp::Div,
    Token::Percent { .. } => BinaryOp::Rem,
});

fn parse_unary(state: &mut ParseState) -> Result<Expr, ParseError> {
    let (op, position) = match state.peek() {
        Token::Minus { position } => (UnaryOp::Neg, position),
        Token::Bang { position } => (UnaryOp::Not, position),
        Token::Star { position } => (UnaryOp::Deref, position),
        Token::Amp { position } => {
            state.next();
            let mutable = matches!(state.peek(), Token::Mut { .. });
            if mutable {
                state.next();
            }
            let operand = parse_unary(state)?;
            let span = position.merge(&operand.span());
            return Ok(Expression::Unary {
                op: UnaryOp::Ref { mutable },
                operand: Box::new(operand),
                info: (),
                span,
            });
        }
        _ => return parse_postfix(state),
    };
    state.next();
    let operand = parse_unary(state)?;
    let span = position.merge(&operand.span());
    Ok(Expression::Unary {
        op,
        operand: Box::new(operand),
        info: (),
        span,
    })
}

fn parse_postfix(state: &mut ParseState) -> Result<Expr, ParseError> {
    let mut expr = parse_primary(state)?;
    loop {
        expr = match state.peek() {
            Token::Dot { .. } => {
                state.next();
                let (field, field_span) = super::ty::expect_ident(state)?;
                let span = expr.span().merge(&field_span);
                Expression::Field {
                    base: Box::new(expr),
                    field,
                    info: (),
                    span,
                }
            }
            Token::LBracket { .. } => {
                state.next();
                let index = parse_expr(state)?;
                let close = expect(state, |t| matches!(t, Token::RBracket { .. }), "]")?;
                let span = expr.span().merge(&close.position());
                Expression::Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                    info: (),
                    span,
                }
            }
            Token::LParen { .. } => {
                state.next();
                let mut args = vec![];
                if !matches!(state.peek(), Token::RParen { .. }) {
                    loop {
                        args.push(parse_expr(state)?);
                        if matches!(state.peek(), Token::Comma { .. }) {
                            state.next();
                            continue;
                        }
                        break;
                    }
                }
                let close = expect(state, |t| matches!(t, Token::RParen { .. }), ")")?;
                let span = expr.span().merge(&close.position());
                Expression::Call {
                    callee: Box::new(expr),
                    args,
                    info: (),
                    span,
                }
            }
            Token::As { .. } => {
                state.next();
                let target = parse_type(state)?;
                let span = expr.span().merge(&target.span());
                Expression::Cast {
                    expr: Box::new(expr),
                    target,
                    info: (),
                    span,
                }
            }
            _ => break,
        };
    }
    Ok(expr)
}

fn parse_primary(state: &mut ParseState) -> Result<Expr, ParseError> {
    match state.peek() {
        Token::Integer { value, position } => {
            state.next();
            Ok(Expression::IntLiteral { value, info: (), span: position })
        }
        Token::Float { value, position } => {
            state.next();
            Ok(Expression::FloatLiteral { value, info: (), span: position })
        }
        Token::True { position } => {
            state.next();
            Ok(Expression::BoolLiteral { value: true, info: (), span: position })
        }
        Token::False { position } => {
            state.next();
            Ok(Expression::BoolLiteral { value: false, info: (), span: position })
        }
        Token::Str { value, position } => {
            state.next();
            Ok(Expression::StringLiteral { value, info: (), span: position })
        }
        Token::Char { value, position } => {
            state.next();
            Ok(Expression::CharLiteral { value, info: (), span: position })
        }
        Token::Id { value, position } => {
            state.next();
            Ok(Expression::Ident { name: value, info: (), span: position })
        }
        Token::LParen { position } => {
            state.next();
            if matches!(state.peek(), Token::RParen { .. }) {
                let close = state.peek();
                state.next();
                return Ok(Expression::UnitLiteral { info: (), span: position.merge(&close.position()) });
            }
            let inner = parse_expr(state)?;
            expect(state, |t| matches!(t, Token::RParen { .. }), ")")?;
            Ok(inner)
        }
        Token::LBrace { .. } => Ok(Expression::Block(parse_block(state)?)),
        Token::Unsafe { position } => {
            state.next();
            let block = parse_block(state)?;
            let span = position.merge(&block.span);
            Ok(Expression::Unsafe(Block { span, ..block }))
        }
        Token::If { .. } => parse_if(state),
        Token::Match { .. } => parse_match(state),
        Token::Spawn { position } => {
            state.next();
            let call = parse_postfix(state)?;
            let span = position.merge(&call.span());
            Ok(Expression::Spawn { call: Box::new(call), info: (), span })
        }
        Token::Await { position } => {
            state.next();
            let expr = parse_unary(state)?;
            let span = position.merge(&expr.span());
            Ok(Expression::Await { expr: Box::new(expr), info: (), span })
        }
        other => Err(ParseError::new(
            "E-PARSE-EXPECTED-EXPRESSION",
            format!("expected an expression, found {other:?}"),
            other.position(),
        )),
    }
}

/// A `{ ... }` block. The final statement, if it is an expression statement
/// with no trailing `;`, becomes `Block.tail` instead of living in
/// `Block.statements` (`spec.md` §4.3, see `ast::expr::Block` doc comment).
pub fn parse_block(state: &mut ParseState) -> Result<Block<()>, ParseError> {
    use crate::ast::Statement;
    use crate::parser::grammar::stmt::parse_statement;

    let open = expect(state, |t| matches!(t, Token::LBrace { .. }), "{")?;
    let mut statements = vec![];
    let mut tail = None;

    while !matches!(state.peek(), Token::RBrace { .. } | Token::Eof { .. }) {
        let (stmt, had_semicolon) = parse_statement(state)?;
        if !had_semicolon && matches!(state.peek(), Token::RBrace { .. }) {
            if let Statement::Expr(e) = stmt {
                tail = Some(Box::new(e));
                break;
            }
            statements.push(stmt);
            break;
        }
        statements.push(stmt);
    }

    let close = expect(state, |t| matches!(t, Token::RBrace { .. }), "}")?;
    let span = open.position().merge(&close.position());
    Ok(Block {
        statements,
        tail,
        info: (),
        span,
    })
}

fn parse_if(state: &mut ParseState) -> Result<Expr, ParseError> {
    let if_tok = expect(state, |t| matches!(t, Token::If { .. }), "if")?;
    let condition = parse_expr(state)?;
    let then_branch = parse_block(state)?;
    let mut span = if_tok.position().merge(&then_branch.span);

    let else_branch = if matches!(state.peek(), Token::Else { .. }) {
        state.next();
        let else_expr = if matches!(state.peek(), Token::If { .. }) {
            parse_if(state)?
        } else {
            Expression::Block(parse_block(state)?)
        };
        span = span.merge(&else_expr.span());
        Some(Box::new(else_expr))
    } else {
        None
    };

    Ok(Expression::If {
        condition: Box::new(condition),
        then_branch,
        else_branch,
        info: (),
        span,
    })
}

fn parse_match(state: &mut ParseState) -> Result<Expr, ParseError> {
    let match_tok = expect(state, |t| matches!(t, Token::Match { .. }), "match")?;
    let scrutinee = parse_expr(state)?;
    expect(state, |t| matches!(t, Token::LBrace { .. }), "{")?;

    let mut arms = vec![];
    while !matches!(state.peek(), Token::RBrace { .. } | Token::Eof { .. }) {
        let pattern = parse_pattern(state)?;
        expect(state, |t| matches!(t, Token::FatArrow { .. }), "=>")?;
        let body = parse_expr(state)?;
        let span = pattern.span().merge(&body.span());
        arms.push(MatchArm { pattern, body, span });
        if matches!(state.peek(), Token::Comma { .. }) {
            state.next();
        }
    }
    let close = expect(state, |t| matches!(t, Token::RBrace { .. }), "}")?;
    let span = match_tok.position().merge(&close.position());

    Ok(Expression::Match {
        scrutinee: Box::new(scrutinee),
        arms,
        info: (),
        span,
    })
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
    fn parses_arithmetic_with_precedence() {
        let mut state = ParseState::new(tokens_of("1 + 2 * 3"));
        let expr = parse_expr(&mut state).unwrap();
        let Expression::Binary { op: BinaryOp::Add, rhs, .. } = expr else { panic!() };
        assert!(matches!(*rhs, Expression::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn rejects_chained_comparisons() {
        let mut state = ParseState::new(tokens_of("a < b < c"));
        assert!(parse_expr(&mut state).is_err());
    }

    #[test]
    fn parses_block_with_tail_expression() {
        let mut state = ParseState::new(tokens_of("{ let x: i32 = 1; x }"));
        let block = parse_block(&mut state).unwrap();
        assert_eq!(block.statements.len(), 1);
        assert!(block.tail.is_some());
    }

    #[test]
    fn parses_block_ending_in_statement_has_no_tail() {
        let mut state = ParseState::new(tokens_of("{ x = 1; }"));
        let block = parse_block(&mut state).unwrap();
        assert!(block.tail.is_none());
    }

    #[test]
    fn parses_if_else_as_expression() {
        let mut state = ParseState::new(tokens_of("if true { 1 } else { 2 }"));
        let expr = parse_expr(&mut state).unwrap();
        assert!(matches!(expr, Expression::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn parses_match_with_variant_patterns() {
        let mut state = ParseState::new(tokens_of("match x { Option.Some(y) => y, _ => 0 }"));
        let expr = parse_expr(&mut state).unwrap();
        let Expression::Match { arms, .. } = expr else { panic!() };
        assert_eq!(arms.len(), 2);
    }

    #[test]
    fn parses_unit_literal() {
        let mut state = ParseState::new(tokens_of("()"));
        assert!(matches!(parse_expr(&mut state).unwrap(), Expression::UnitLiteral { .. }));
    }

    #[test]
    fn parses_unsafe_block() {
        let mut state = ParseState::new(tokens_of("unsafe { foo() }"));
        let expr = parse_expr(&mut state).unwrap();
        assert!(matches!(expr, Expression::Unsafe(_)));
    }

    #[test]
    fn parses_call_and_field_and_cast_chain() {
        let mut state = ParseState::new(tokens_of("a.b(1, 2).c as i32"));
        let expr = parse_expr(&mut state).unwrap();
        assert!(matches!(expr, Expression::Cast { .. }));
    }
}
