use std::iter::Peekable;

use crate::{
    error::ParseError,
    interpreter::{lexer::Token, parser::core::ParseResult},
};

/// Parses a comma-separated list of items until a closing token.
///
/// This utility is shared by function-call arguments and definition
/// parameter lists. It repeatedly calls `parse_item` to parse one element,
/// expecting either:
///
/// - a comma, to continue the list, or
/// - the specified closing token, to end it.
///
/// An immediately encountered closing token produces an empty list. The
/// closing token is consumed.
///
/// Grammar (simplified): `list := (item ("," item)*)?`
pub(in crate::interpreter::parser) fn parse_comma_separated<'a, I, T>(
    tokens: &mut Peekable<I>,
    parse_item: impl Fn(&mut Peekable<I>) -> ParseResult<T>,
    closing: &Token)
    -> ParseResult<Vec<T>>
    where I: Iterator<Item = &'a Token> + Clone
{
    let mut items = Vec::new();

    if let Some(token) = tokens.peek() {
        if *token == closing {
            tokens.next();
            return Ok(items);
        }
    }

    loop {
        items.push(parse_item(tokens)?);
        match tokens.peek() {
            Some(Token::Comma) => {
                tokens.next();
            },
            Some(token) if *token == closing => {
                tokens.next();
                break;
            },
            Some(token) => {
                return Err(ParseError::UnexpectedToken { token: format!("expected ',' or {closing:?}, found {token:?}"), });
            },
            None => return Err(ParseError::UnexpectedEndOfInput),
        }
    }

    Ok(items)
}

/// Parses a plain identifier and returns its name.
///
/// The next token must be `Token::Identifier`.
pub(in crate::interpreter::parser) fn parse_identifier<'a, I>(tokens: &mut Peekable<I>)
                                                              -> ParseResult<String>
    where I: Iterator<Item = &'a Token>
{
    match tokens.next() {
        Some(Token::Identifier(name)) => Ok(name.clone()),
        Some(token) => Err(ParseError::ExpectedIdentifier { found: format!("{token:?}"), }),
        None => Err(ParseError::UnexpectedEndOfInput),
    }
}
