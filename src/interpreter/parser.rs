/// Statement-level parsing.
///
/// Recognizes the statement forms allowed at the top of an input line:
/// assignment, `unset`, `def`, `undef`, and a bare expression with an
/// optional trailing unit conversion.
pub mod statement;

/// Expression parsing.
///
/// Implements the operator-precedence levels (additive, multiplicative,
/// exponentiation) and lowers each binary operator to an application of the
/// operator-named builtin.
pub mod core;

/// Atom-level parsing.
///
/// Handles literals, unary minus, identifiers and calls, matrix literals,
/// parenthesized expressions, base-radix literals, and postfix unit tags.
pub mod unary;

/// Unit-expression parsing.
///
/// Parses the `{ ... }` unit syntax: names, products, quotients and
/// parenthesization, left-associative.
pub mod units;

/// Utility functions for the parser.
///
/// Shared helpers for comma-separated lists and identifiers.
pub mod utils;
