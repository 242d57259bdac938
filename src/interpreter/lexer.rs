use logos::Logos;

use crate::error::ParseError;

/// Represents a lexical token in one input line.
/// A token is a minimal but meaningful unit of text produced by the lexer.
/// This enum defines all recognized tokens in the language.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\f\r\n]+")]
pub enum Token {
    /// Numeric literal tokens, such as `42`, `3.14`, `.5` or `13e3`.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_number)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", parse_number)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_number)]
    #[regex(r"[0-9]+", parse_number)]
    Number(f64),
    /// A base-radix literal such as `<ff>16`, kept as raw text. The parser
    /// decodes the digits so that invalid ones are reported as syntax errors.
    #[regex(r"<[0-9a-zA-Z]+>[0-9]+", |lex| lex.slice().to_string())]
    BaseLiteral(String),
    /// `def`
    #[token("def")]
    Def,
    /// `unset`
    #[token("unset")]
    Unset,
    /// `undef`
    #[token("undef")]
    Undef,
    /// Identifier tokens; variable, function or unit names such as `x`,
    /// `square` or `kg`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// `->`
    #[token("->")]
    Arrow,
    /// `**`
    #[token("**")]
    DoubleStar,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `^`
    #[token("^")]
    Caret,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `=`
    #[token("=")]
    Equals,
    /// `,`
    #[token(",")]
    Comma,
}

/// Parses a numeric literal from the current token slice.
///
/// # Parameters
/// - `lex`: Reference to the Logos lexer at the current token.
///
/// # Returns
/// - `Some(f64)`: The parsed value if successful.
/// - `None`: If the token slice is not a valid number.
fn parse_number(lex: &logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Tokenizes one input line.
///
/// Unrecognized characters fail with an `UnexpectedToken` error carrying the
/// offending slice.
///
/// # Example
/// ```
/// use mensura::interpreter::lexer::{Token, tokenize};
///
/// let tokens = tokenize("x = 3").unwrap();
/// assert_eq!(tokens,
///            vec![Token::Identifier("x".to_string()), Token::Equals, Token::Number(3.0)]);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(token) = lexer.next() {
        match token {
            Ok(tok) => tokens.push(tok),
            Err(()) => {
                return Err(ParseError::UnexpectedToken { token: lexer.slice().to_string(), });
            },
        }
    }

    Ok(tokens)
}
