/// Core evaluation logic.
///
/// The single recursive `eval` function dispatching by AST node tag, plus
/// function application with its transient call scopes.
pub mod core;

/// Arithmetic semantics for the operator builtins.
///
/// Implements `+ - * / pow neg` across reals, complex numbers, matrices and
/// quantities, including complex promotion and unit algebra.
pub mod arith;

/// The builtin function table.
///
/// Declares every native function and installs the table into a session's
/// root scope at construction.
pub mod builtin;
