use std::iter::Peekable;

use crate::{
    ast::Expr,
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            core::{ParseResult, parse_expression},
            units::parse_unit_block,
            utils::{parse_comma_separated, parse_identifier},
        },
    },
};

/// Parses one input line.
///
/// A line may be one of the statement forms, recognized at top level only:
/// - `unset NAME`
/// - `undef NAME`
/// - `def NAME(params) = expr`
/// - `NAME = expr`
///
/// or a bare expression, optionally followed by `-> { unitexpr }` which
/// wraps it in a conversion node.
///
/// Parsing is attempted in that order; the first matching construct wins.
/// The caller is responsible for rejecting trailing tokens.
pub fn parse_statement<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    if let Some(statement) = parse_unset(tokens)? {
        return Ok(statement);
    }
    if let Some(statement) = parse_undef(tokens)? {
        return Ok(statement);
    }
    if let Some(statement) = parse_function_definition(tokens)? {
        return Ok(statement);
    }
    if let Some(statement) = parse_assignment(tokens)? {
        return Ok(statement);
    }

    let expr = parse_expression(tokens)?;

    if let Some(Token::Arrow) = tokens.peek() {
        tokens.next();
        let unit = parse_unit_block(tokens)?;
        return Ok(Expr::Convert { value: Box::new(expr),
                                  unit });
    }

    Ok(expr)
}

/// Parses `unset NAME`, or returns `Ok(None)` without consuming input.
fn parse_unset<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<Expr>>
    where I: Iterator<Item = &'a Token> + Clone
{
    if let Some(Token::Unset) = tokens.peek() {
        tokens.next();
        let name = parse_identifier(tokens)?;
        return Ok(Some(Expr::Unset(name)));
    }

    Ok(None)
}

/// Parses `undef NAME`, or returns `Ok(None)` without consuming input.
fn parse_undef<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<Expr>>
    where I: Iterator<Item = &'a Token> + Clone
{
    if let Some(Token::Undef) = tokens.peek() {
        tokens.next();
        let name = parse_identifier(tokens)?;
        return Ok(Some(Expr::FunctionUndef(name)));
    }

    Ok(None)
}

/// Parses a function definition of the form `def name(param, ...) = expr`.
///
/// The parameter list may be empty. Duplicate parameter names are accepted
/// here and rejected by the evaluator, which owns that invariant.
fn parse_function_definition<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<Expr>>
    where I: Iterator<Item = &'a Token> + Clone
{
    if !matches!(tokens.peek(), Some(Token::Def)) {
        return Ok(None);
    }
    tokens.next();

    let name = parse_identifier(tokens)?;

    match tokens.next() {
        Some(Token::LParen) => {},
        Some(token) => {
            return Err(ParseError::UnexpectedToken { token: format!("expected '(' after function name, found {token:?}"), });
        },
        None => return Err(ParseError::UnexpectedEndOfInput),
    }

    let params = parse_comma_separated(tokens, parse_identifier, &Token::RParen)?;

    match tokens.next() {
        Some(Token::Equals) => {},
        Some(token) => {
            return Err(ParseError::UnexpectedToken { token: format!("expected '=' after parameter list, found {token:?}"), });
        },
        None => return Err(ParseError::UnexpectedEndOfInput),
    }

    let body = parse_expression(tokens)?;

    Ok(Some(Expr::FunctionDef { name,
                                params,
                                body: Box::new(body) }))
}

/// Parses an assignment statement: `name = expr`.
///
/// The function performs a limited lookahead: an assignment is parsed only
/// when an identifier is directly followed by `=`. Anything else (such as a
/// function call) is left for expression parsing, with no tokens consumed.
fn parse_assignment<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<Expr>>
    where I: Iterator<Item = &'a Token> + Clone
{
    if let Some(Token::Identifier(_)) = tokens.peek() {
        let mut lookahead = tokens.clone();
        lookahead.next();

        if let Some(Token::Equals) = lookahead.peek() {
            let name = parse_identifier(tokens)?;
            tokens.next(); // consume '='

            let value = parse_expression(tokens)?;
            return Ok(Some(Expr::Assign { name,
                                          value: Box::new(value) }));
        }
    }

    Ok(None)
}
