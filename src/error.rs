/// Parsing errors.
///
/// Defines all error types that can occur during lexing and parsing of an
/// input line. Parse errors include syntax mistakes, unexpected tokens,
/// unbalanced delimiters, and malformed base literals.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised during evaluation: unbound
/// names, arity mismatches, protected builtins, matrix shape problems, and
/// unit failures.
pub mod runtime_error;

pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;

/// The failure type surfaced by the public entry point.
///
/// Wraps either a [`ParseError`] from the grammar phase or a
/// [`RuntimeError`] from evaluation. Transport layers render the `Display`
/// text back to the user; every variant is recoverable and the session
/// environment is left exactly as it was before the failing call.
#[derive(Debug)]
pub enum EvaluationError {
    /// The input line did not parse.
    Parse(ParseError),
    /// The line parsed but failed to evaluate.
    Runtime(RuntimeError),
}

impl std::fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EvaluationError {}

impl From<ParseError> for EvaluationError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<RuntimeError> for EvaluationError {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}
