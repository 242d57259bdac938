//! # mensura
//!
//! mensura is a small interactive expression language: a calculator with
//! variables, user-defined functions, complex numbers, matrices, and
//! physical-unit-tagged quantities. Each call to [`evaluate`] processes one
//! line of input against a persistent per-session [`Environment`]
//! (`interpreter::env::Environment`), so a chat transport or a REPL can feed
//! it successive user turns.
//!
//! ```text
//! x = 3
//! fact(x ^ 2)
//! def f(a, b) = a + b
//! tr(T([2 1]) * [1 2])
//! 3.6{kg} -> {mg}
//! ```

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::match_same_arms,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
)]
#![allow(clippy::missing_errors_doc)]

/// Defines the structure of parsed code.
///
/// This module declares the `Expr` and `UnitExpr` enums that represent the
/// syntactic structure of one input line as a tree. The AST is built by the
/// parser and traversed by the evaluator.
pub mod ast;
/// Provides unified error types for parsing and evaluation.
///
/// This module defines all errors that can be raised while lexing, parsing,
/// or evaluating a line. Every failure is a recoverable value surfaced to
/// the caller; evaluation never panics on user input.
pub mod error;
/// Orchestrates the entire process of evaluating a line.
///
/// This module ties together lexing, parsing, evaluation, value
/// representations, the binding environment and the unit registry to
/// provide a complete runtime for the language.
pub mod interpreter;

use crate::{
    error::{EvaluationError, ParseError},
    interpreter::{
        env::Environment, evaluator::core::eval, lexer::tokenize, parser::statement::parse_statement,
        value::core::Value,
    },
};

/// Evaluates one line of input against a session environment.
///
/// This is the entry point consumed by transport collaborators: the line is
/// tokenized, parsed into an AST, and evaluated against the session's root
/// scope. Statement forms (assignment, `unset`, `def`, `undef`) mutate the
/// environment and return `Ok(None)`; expressions return their value, whose
/// `Display` rendering is what a front end shows the user.
///
/// # Errors
/// Returns an [`EvaluationError`] when the line fails to lex, parse, or
/// evaluate. Failures are fail-fast: a line that errors leaves the
/// environment exactly as it was before the call.
///
/// # Example
/// ```
/// use mensura::{evaluate, interpreter::env::Environment};
///
/// let mut env = Environment::new();
///
/// assert!(evaluate("x = 3", &mut env).unwrap().is_none());
///
/// let result = evaluate("x + 1", &mut env).unwrap().unwrap();
/// assert_eq!(result.to_string(), "4");
///
/// // An erroring line does not disturb the session.
/// assert!(evaluate("x = nope + 1", &mut env).is_err());
/// assert_eq!(evaluate("x", &mut env).unwrap().unwrap().to_string(), "3");
/// ```
pub fn evaluate(line: &str, env: &mut Environment) -> Result<Option<Value>, EvaluationError> {
    let tokens = tokenize(line)?;

    let mut iter = tokens.iter().peekable();
    let statement = parse_statement(&mut iter)?;

    if let Some(token) = iter.next() {
        return Err(ParseError::TrailingTokens { token: format!("{token:?}"), }.into());
    }

    log::debug!("evaluating {statement:?}");

    eval(&statement, env, Environment::ROOT).map_err(EvaluationError::from)
}
