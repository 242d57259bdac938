use std::iter::Peekable;

use crate::{
    ast::UnitExpr,
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{core::ParseResult, utils::parse_identifier},
    },
};

/// Parses a braced unit block: `{ unitexpr }`.
///
/// The opening brace is consumed here; a missing closing brace produces
/// `ExpectedClosingBrace`.
pub fn parse_unit_block<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<UnitExpr>
    where I: Iterator<Item = &'a Token> + Clone
{
    match tokens.next() {
        Some(Token::LBrace) => {},
        Some(token) => {
            return Err(ParseError::UnexpectedToken { token: format!("expected '{{', found {token:?}"), });
        },
        None => return Err(ParseError::UnexpectedEndOfInput),
    }

    let unit = parse_unit_expr(tokens)?;

    match tokens.next() {
        Some(Token::RBrace) => Ok(unit),
        _ => Err(ParseError::ExpectedClosingBrace),
    }
}

/// Parses a unit expression.
///
/// Handles left-associative chains of `*` and `/` over unit names and
/// parenthesized sub-expressions.
///
/// Grammar:
/// ```text
///     unitexpr := unitprimary (("*" | "/") unitprimary)*
///     unitprimary := NAME | "(" unitexpr ")"
/// ```
fn parse_unit_expr<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<UnitExpr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let mut left = parse_unit_primary(tokens)?;

    while let Some(token) = tokens.peek() {
        let multiply = match token {
            Token::Star => true,
            Token::Slash => false,
            _ => break,
        };

        tokens.next();
        let right = parse_unit_primary(tokens)?;

        left = if multiply {
            UnitExpr::Mul(Box::new(left), Box::new(right))
        } else {
            UnitExpr::Div(Box::new(left), Box::new(right))
        };
    }

    Ok(left)
}

/// Parses a single unit name or a parenthesized unit expression.
fn parse_unit_primary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<UnitExpr>
    where I: Iterator<Item = &'a Token> + Clone
{
    match tokens.peek() {
        Some(Token::LParen) => {
            tokens.next();
            let unit = parse_unit_expr(tokens)?;
            match tokens.next() {
                Some(Token::RParen) => Ok(unit),
                _ => Err(ParseError::ExpectedClosingParen),
            }
        },
        _ => Ok(UnitExpr::Unit(parse_identifier(tokens)?)),
    }
}
