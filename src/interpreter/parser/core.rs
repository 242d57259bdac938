use std::iter::Peekable;

use crate::{
    ast::Expr,
    error::ParseError,
    interpreter::{lexer::Token, parser::unary::parse_unary},
};

pub type ParseResult<T> = Result<T, ParseError>;

/// Wraps two operands in an application of the operator-named builtin.
///
/// The language has no dedicated AST nodes for binary operators; `1 + 2`
/// becomes `Apply("+", [1, 2])` and resolves through the environment like
/// any other function call.
fn apply_operator(operator: &str, left: Expr, right: Expr) -> Expr {
    Expr::Apply { function:  operator.to_string(),
                  arguments: vec![left, right], }
}

/// Parses a full expression.
///
/// This is the entry point for expression parsing. It begins at the
/// lowest-precedence level, addition, and recursively descends through the
/// precedence hierarchy.
///
/// Grammar: `expression := additive`
pub fn parse_expression<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    parse_additive(tokens)
}

/// Parses addition and subtraction expressions.
///
/// Handles left-associative binary operators: `+` and `-`.
///
/// Grammar: `additive := term (("+" | "-") term)*`
fn parse_additive<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let mut left = parse_term(tokens)?;

    while let Some(token) = tokens.peek() {
        let operator = match token {
            Token::Plus => "+",
            Token::Minus => "-",
            _ => break,
        };

        tokens.next();
        let right = parse_term(tokens)?;
        left = apply_operator(operator, left, right);
    }

    Ok(left)
}

/// Parses multiplication and division expressions.
///
/// Handles left-associative binary operators: `*` and `/`.
///
/// Grammar: `term := power (("*" | "/") power)*`
fn parse_term<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let mut left = parse_power(tokens)?;

    while let Some(token) = tokens.peek() {
        let operator = match token {
            Token::Star => "*",
            Token::Slash => "/",
            _ => break,
        };

        tokens.next();
        let right = parse_power(tokens)?;
        left = apply_operator(operator, left, right);
    }

    Ok(left)
}

/// Parses exponentiation expressions.
///
/// `**` and `^` are interchangeable and parse left-associatively, so
/// `2^3^2` means `(2^3)^2`. Unary minus is an atom form and binds tighter
/// than the exponent: `-2^2` means `(-2)^2`.
///
/// Grammar: `power := unary (("**" | "^") unary)*`
fn parse_power<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let mut left = parse_unary(tokens)?;

    while let Some(Token::DoubleStar | Token::Caret) = tokens.peek() {
        tokens.next();
        let right = parse_unary(tokens)?;
        left = apply_operator("pow", left, right);
    }

    Ok(left)
}
