use std::iter::Peekable;

use crate::{
    ast::Expr,
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            core::{ParseResult, parse_expression},
            units::parse_unit_block,
            utils::parse_comma_separated,
        },
        value::complex::ComplexNumber,
    },
};

/// Parses a unary expression.
///
/// A leading `-` negates the atom that follows it. Negated numeric literals
/// are folded into the literal itself; anything else becomes an application
/// of the builtin `neg`, keeping the AST free of a dedicated negation node.
///
/// Because `-` is an atom form, it binds tighter than exponentiation:
/// `-2^2` parses as `(-2)^2`.
///
/// Grammar:
/// ```text
///     unary := "-" unary
///            | primary ("{" unitexpr "}")*
/// ```
pub(crate) fn parse_unary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    if let Some(Token::Minus) = tokens.peek() {
        tokens.next();
        let operand = parse_unary(tokens)?;

        return Ok(match operand {
            Expr::Number(n) => Expr::Number(-n),
            Expr::Complex(c) => Expr::Complex(-c),
            other => Expr::Apply { function:  "neg".to_string(),
                                   arguments: vec![other], },
        });
    }

    let primary = parse_primary(tokens)?;
    parse_postfix(tokens, primary)
}

/// Parses a primary (atomic) expression.
///
/// Primary expressions form the base of the expression grammar and include:
/// - numeric literals, with an optional `i`/`j` suffix for pure-imaginary
///   complex literals
/// - base-radix literals such as `<ff>16`
/// - identifiers and function calls
/// - matrix literals
/// - parenthesized expressions
fn parse_primary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let peeked = tokens.peek().ok_or(ParseError::UnexpectedEndOfInput)?;

    match peeked {
        Token::Number(..) => parse_number_literal(tokens),
        Token::BaseLiteral(..) => parse_base_literal(tokens),
        Token::Identifier(_) => parse_identifier_or_call(tokens),
        Token::LBracket => parse_matrix_literal(tokens),
        Token::LParen => parse_grouping(tokens),
        token => Err(ParseError::UnexpectedToken { token: format!("{token:?}"), }),
    }
}

/// Applies postfix unit tags to an expression.
///
/// Each `{ unitexpr }` block directly after an atom wraps it in a
/// `WithUnits` node; chained blocks nest, which the evaluator resolves as
/// unit multiplication.
fn parse_postfix<'a, I>(tokens: &mut Peekable<I>, mut node: Expr) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    while let Some(Token::LBrace) = tokens.peek() {
        let unit = parse_unit_block(tokens)?;
        node = Expr::WithUnits { value: Box::new(node),
                                 unit };
    }

    Ok(node)
}

/// Parses a numeric literal, promoting it to a pure-imaginary complex
/// literal when immediately followed by the identifier `i` or `j`.
fn parse_number_literal<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let Some(Token::Number(n)) = tokens.next() else {
        return Err(ParseError::UnexpectedEndOfInput);
    };

    if let Some(Token::Identifier(suffix)) = tokens.peek() {
        if suffix == "i" || suffix == "j" {
            tokens.next();
            return Ok(Expr::Complex(ComplexNumber::new(0.0, *n)));
        }
    }

    Ok(Expr::Number(*n))
}

/// Decodes a base-radix literal such as `<ff>16`.
///
/// Digits are drawn from `0-9a-z`, case-insensitive; each digit's value
/// must be below the base and the base must be at least 2, otherwise the
/// literal is a syntax error.
fn parse_base_literal<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let Some(Token::BaseLiteral(literal)) = tokens.next() else {
        return Err(ParseError::UnexpectedEndOfInput);
    };

    decode_base_literal(literal).map(Expr::Number)
}

/// Computes the value of a `<digits>base` literal.
fn decode_base_literal(literal: &str) -> ParseResult<f64> {
    let invalid = || ParseError::InvalidBaseLiteral { literal: literal.to_string(), };

    let inner = literal.strip_prefix('<').ok_or_else(invalid)?;
    let (digits, base_text) = inner.split_once('>').ok_or_else(invalid)?;

    let base: u32 = base_text.parse().map_err(|_| invalid())?;
    if !(2..=36).contains(&base) {
        return Err(invalid());
    }

    let mut result = 0.0_f64;
    for digit in digits.chars() {
        let value = digit.to_ascii_lowercase()
                         .to_digit(36)
                         .filter(|&v| v < base)
                         .ok_or_else(invalid)?;
        result = result * f64::from(base) + f64::from(value);
    }

    Ok(result)
}

/// Parses an identifier or a function call.
///
/// If the identifier is immediately followed by `(`, a call with a
/// comma-separated argument list is parsed; zero-argument calls use empty
/// parentheses. Otherwise the identifier is a variable reference.
fn parse_identifier_or_call<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let Some(Token::Identifier(name)) = tokens.next() else {
        return Err(ParseError::UnexpectedEndOfInput);
    };

    match tokens.peek() {
        Some(Token::LParen) => {
            tokens.next();
            let arguments = parse_comma_separated(tokens, parse_expression, &Token::RParen)?;
            Ok(Expr::Apply { function: name.clone(),
                             arguments })
        },
        _ => Ok(Expr::Variable(name.clone())),
    }
}

/// Parses a matrix literal: `[` expr+ `]`.
///
/// Elements are whitespace-separated expressions; rows of a two-dimensional
/// matrix are themselves matrix literals, nested one level.
fn parse_matrix_literal<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    tokens.next(); // consume '['

    let mut elements = Vec::new();

    loop {
        match tokens.peek() {
            Some(Token::RBracket) => {
                tokens.next();
                break;
            },
            Some(_) => elements.push(parse_expression(tokens)?),
            None => return Err(ParseError::ExpectedClosingBracket),
        }
    }

    if elements.is_empty() {
        return Err(ParseError::UnexpectedToken { token: "]".to_string(), });
    }

    Ok(Expr::Matrix(elements))
}

/// Parses a parenthesized expression.
///
/// The inner expression is returned as-is (no wrapper node).
fn parse_grouping<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    tokens.next(); // consume '('
    let expr = parse_expression(tokens)?;
    match tokens.next() {
        Some(Token::RParen) => Ok(expr),
        _ => Err(ParseError::ExpectedClosingParen),
    }
}
