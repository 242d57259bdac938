use mensura::{
    error::{EvaluationError, ParseError, RuntimeError},
    evaluate,
    interpreter::{env::Environment, value::core::Value},
};

/// Runs a sequence of lines in one fresh session and returns the session
/// plus the outcome of the last line.
fn session(lines: &[&str]) -> (Environment, Result<Option<Value>, EvaluationError>) {
    let mut env = Environment::new();
    let mut last = Ok(None);

    for line in lines {
        last = evaluate(line, &mut env);
    }

    (env, last)
}

/// Asserts that the last line yields a value with the given rendering.
fn assert_displays(lines: &[&str], expected: &str) {
    let (_, last) = session(lines);
    let value = last.unwrap_or_else(|e| panic!("evaluation failed: {e}"))
                    .expect("expected a value, got a void result");
    assert_eq!(value.to_string(), expected);
}

/// Asserts that the last line yields a real number close to `expected`.
fn assert_close(lines: &[&str], expected: f64) {
    let (_, last) = session(lines);
    let value = last.unwrap_or_else(|e| panic!("evaluation failed: {e}"))
                    .expect("expected a value, got a void result");
    let Value::Real(actual) = value else {
        panic!("expected a real number, got {value}");
    };
    assert!((actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}");
}

/// Asserts that the last line fails at runtime and returns the error.
fn runtime_error(lines: &[&str]) -> RuntimeError {
    let (_, last) = session(lines);
    match last {
        Err(EvaluationError::Runtime(e)) => e,
        Err(EvaluationError::Parse(e)) => panic!("expected a runtime error, got parse error: {e}"),
        Ok(v) => panic!("expected a runtime error, got {v:?}"),
    }
}

/// Asserts that a single line fails to parse and returns the error.
fn parse_error(line: &str) -> ParseError {
    let (_, last) = session(&[line]);
    match last {
        Err(EvaluationError::Parse(e)) => e,
        Err(EvaluationError::Runtime(e)) => panic!("expected a parse error, got runtime error: {e}"),
        Ok(v) => panic!("expected a parse error, got {v:?}"),
    }
}

#[test]
fn numeric_literals_evaluate_to_themselves() {
    assert_displays(&["42"], "42");
    assert_displays(&["1.5"], "1.5");
    assert_displays(&[".5"], "0.5");
    assert_displays(&["13e3"], "13000");
    assert_displays(&["2.5e-1"], "0.25");
}

#[test]
fn assignment_then_lookup() {
    let (_, last) = session(&["x = 3"]);
    assert!(matches!(last, Ok(None)), "assignment must be a void result");

    assert_displays(&["x = 3", "x"], "3");
    assert_displays(&["x = 3", "x = x + 1", "x"], "4");
}

#[test]
fn unset_is_idempotent() {
    let (_, last) = session(&["x = 1", "unset x", "unset x"]);
    assert!(matches!(last, Ok(None)));

    let error = runtime_error(&["x = 1", "unset x", "x"]);
    assert!(matches!(error, RuntimeError::UnboundVariable { .. }));
}

#[test]
fn failing_lines_leave_the_session_untouched() {
    let mut env = Environment::new();
    evaluate("x = 1", &mut env).unwrap();

    assert!(evaluate("x = nope + 1", &mut env).is_err());
    assert_eq!(evaluate("x", &mut env).unwrap().unwrap().to_string(), "1");
}

#[test]
fn function_definition_and_invocation() {
    assert_displays(&["def f(x, y) = x + y", "f(2, 3)"], "5");
    assert_displays(&["def square(x) = x * x", "square(7)"], "49");
    assert_displays(&["def two() = 2", "two()"], "2");
}

#[test]
fn functions_resolve_their_callees_at_call_time() {
    // h is defined after g; the body only resolves names when called.
    assert_displays(&["def g(x) = h(x) + 1", "def h(x) = x * 10", "g(2)"], "21");
}

#[test]
fn free_identifiers_resolve_through_the_caller() {
    // Dynamic scoping: y is not captured at definition time.
    assert_displays(&["def f(a) = a + y", "y = 10", "f(1)"], "11");

    let error = runtime_error(&["def f(a) = a + y", "f(1)"]);
    assert!(matches!(error, RuntimeError::UnboundVariable { .. }));
}

#[test]
fn call_scopes_do_not_leak_parameters() {
    let error = runtime_error(&["def f(a) = a", "f(1)", "a"]);
    assert!(matches!(error, RuntimeError::UnboundVariable { .. }));
}

#[test]
fn arity_is_checked_for_user_and_builtin_functions() {
    let error = runtime_error(&["def f(x) = x", "f(2, 3)"]);
    assert!(matches!(error,
                     RuntimeError::ArityMismatch { expected: 1,
                                                   found: 2,
                                                   .. }));

    let error = runtime_error(&["cos(1, 2)"]);
    assert!(matches!(error,
                     RuntimeError::ArityMismatch { expected: 1,
                                                   found: 2,
                                                   .. }));
}

#[test]
fn builtins_cannot_be_redefined() {
    let error = runtime_error(&["def sqrt(x, y) = x"]);
    assert!(matches!(error, RuntimeError::ProtectedRedefinition { .. }));
}

#[test]
fn duplicate_parameters_are_rejected() {
    let error = runtime_error(&["def f(x, x) = x + x"]);
    assert!(matches!(error, RuntimeError::DuplicateParameter { .. }));
}

#[test]
fn undef_removes_user_functions() {
    let error = runtime_error(&["def f(x) = x", "undef f", "f(1)"]);
    assert!(matches!(error, RuntimeError::UnboundFunction { .. }));

    // Removing a missing function is a no-op; builtins survive an undef.
    assert_displays(&["undef f", "undef sqrt", "sqrt(9)"], "3");
}

#[test]
fn exponentiation_is_left_associative() {
    // The grammar leaves the associativity of `^` ambiguous on paper; the
    // implementation parses it left-associatively, so 2^3^2 is (2^3)^2,
    // not 2^(3^2) = 512.
    assert_displays(&["2^3^2"], "64");
    assert_displays(&["2**3"], "8");
    assert_displays(&["2 ** 3 ^ 2"], "64");
}

#[test]
fn unary_minus_binds_tighter_than_the_exponent() {
    assert_displays(&["-2^2"], "4");
    assert_displays(&["2^-1"], "0.5");
    assert_displays(&["-2 + 2"], "0");
}

#[test]
fn operator_precedence_and_grouping() {
    assert_displays(&["1 + 2 * 3"], "7");
    assert_displays(&["(1 + 2) * 3"], "9");
    assert_displays(&["10 - 2 - 3"], "5");
    assert_displays(&["12 / 2 / 3"], "2");
}

#[test]
fn complex_literals_and_arithmetic() {
    assert_displays(&["1j"], "1i");
    assert_displays(&["2 - 1j"], "2 - 1i");
    assert_displays(&["3i * 2"], "6i");

    // i * i collapses back to a real.
    assert_displays(&["1i * 1i"], "-1");
}

#[test]
fn sqrt_of_a_negative_real_is_pure_imaginary() {
    assert_displays(&["sqrt(-4)"], "2i");
    assert_displays(&["sqrt(9)"], "3");
}

#[test]
fn constants_are_preinstalled() {
    assert_displays(&["cos(0)"], "1");
    assert_close(&["e"], std::f64::consts::E);
    assert_close(&["pi"], std::f64::consts::PI);
    assert_close(&["sin(pi)"], 0.0);
    assert_close(&["ln(e)"], 1.0);
}

#[test]
fn scalar_builtins() {
    assert_close(&["lg(100)"], 2.0);
    assert_close(&["log2(8)"], 3.0);
    assert_close(&["ctg(pi / 4)"], 1.0);
    assert_close(&["pow(2, 10)"], 1024.0);
}

#[test]
fn fact_generalizes_the_factorial_through_gamma() {
    assert_close(&["fact(5)"], 120.0);
    assert_close(&["fact(0)"], 1.0);
    assert_close(&["x = 3", "fact(x ^ 2)"], 362_880.0);

    let error = runtime_error(&["fact(-2)"]);
    assert!(matches!(error, RuntimeError::DomainError { .. }));
}

#[test]
fn matrix_round_trip() {
    assert_displays(&["tr(T([2 1]) * [1 2])"], "4");
}

#[test]
fn matrix_literals_and_display() {
    assert_displays(&["[1 2]"], "[1 2]");
    assert_displays(&["[[1 2] [3 4]]"], "[[1 2] [3 4]]");
    assert_displays(&["[1 + 1 2 * 3]"], "[2 6]");
}

#[test]
fn matrix_arithmetic() {
    assert_displays(&["[1 2] + [3 4]"], "[4 6]");
    assert_displays(&["[[1 2] [3 4]] * [[1 0] [0 1]]"], "[[1 2] [3 4]]");
    assert_displays(&["2 * [1 2]"], "[2 4]");
    assert_displays(&["sin([0 0])"], "[0 0]");
}

#[test]
fn matrix_shape_errors() {
    let error = runtime_error(&["[1 2] + [1 2 3]"]);
    assert!(matches!(error, RuntimeError::ShapeMismatch { .. }));

    let error = runtime_error(&["[[1 2] [3]]"]);
    assert!(matches!(error, RuntimeError::ShapeMismatch { .. }));

    let error = runtime_error(&["[[1 2] [3 4]] * [1 2]"]);
    assert!(matches!(error, RuntimeError::ShapeMismatch { .. }));
}

#[test]
fn linear_algebra_builtins() {
    assert_close(&["D([[1 2] [3 4]])"], -2.0);
    assert_displays(&["rk([[1 2] [2 4]])"], "1");
    assert_displays(&["rk([[1 0] [0 1]])"], "2");
    assert_displays(&["[[2 0] [0 2]] * inv([[2 0] [0 2]])"], "[[1 0] [0 1]]");

    let error = runtime_error(&["inv([[1 2] [2 4]])"]);
    assert!(matches!(error, RuntimeError::SingularMatrix));

    let error = runtime_error(&["D([[1 2 3] [4 5 6]])"]);
    assert!(matches!(error, RuntimeError::ShapeMismatch { .. }));
}

#[test]
fn unit_conversion_round_trip() {
    let (_, last) = session(&["3.6{kg} -> {mg}"]);
    let Value::Quantity(quantity) = last.unwrap().unwrap() else {
        panic!("expected a quantity");
    };

    assert_eq!(quantity.unit.to_string(), "mg");
    let Value::Real(magnitude) = *quantity.magnitude else {
        panic!("expected a real magnitude");
    };
    assert!((magnitude - 3_600_000.0).abs() < 1e-3);
}

#[test]
fn compound_unit_conversion() {
    let (_, last) = session(&["3.6 {(kg * m) / s} -> {(mg * m) / s}"]);
    let Value::Quantity(quantity) = last.unwrap().unwrap() else {
        panic!("expected a quantity");
    };

    assert_eq!(quantity.unit.to_string(), "mg * m / s");
    let Value::Real(magnitude) = *quantity.magnitude else {
        panic!("expected a real magnitude");
    };
    assert!((magnitude - 3_600_000.0).abs() < 1e-3);
}

#[test]
fn conversions_with_exact_factors_display_cleanly() {
    assert_displays(&["3{kg} -> {g}"], "3000 g");
    assert_displays(&["1{h} -> {s}"], "3600 s");
}

#[test]
fn incompatible_dimensions_are_rejected() {
    let error = runtime_error(&["1{kg} -> {m}"]);
    assert!(matches!(error, RuntimeError::IncompatibleUnits { .. }));

    let error = runtime_error(&["1{kg} + 1{s}"]);
    assert!(matches!(error, RuntimeError::IncompatibleUnits { .. }));
}

#[test]
fn converting_a_bare_value_fails() {
    let error = runtime_error(&["3 -> {kg}"]);
    assert!(matches!(error, RuntimeError::NotAQuantity));
}

#[test]
fn unknown_units_are_reported() {
    let error = runtime_error(&["1{parsec}"]);
    assert!(matches!(error, RuntimeError::UnknownUnit { .. }));
}

#[test]
fn quantity_arithmetic_converts_units() {
    assert_displays(&["2{m} + 50{cm}"], "2.5 m");
    assert_displays(&["2{m} * 3"], "6 m");
    assert_displays(&["6{m} / 2{s}"], "3 m / s");
}

#[test]
fn quantities_can_be_stored_in_variables() {
    assert_displays(&["w = 3{kg}", "w -> {g}"], "3000 g");
}

#[test]
fn base_literals_decode_their_radix() {
    assert_displays(&["<ff>16"], "255");
    assert_displays(&["<FF>16"], "255");
    assert_displays(&["<101>2"], "5");
    assert_displays(&["<ff>16 + <101>2"], "260");
    assert_displays(&["<777>8"], "511");
}

#[test]
fn base_literals_reject_digits_outside_the_base() {
    assert!(matches!(parse_error("<12>2"),
                     ParseError::InvalidBaseLiteral { .. }));
    assert!(matches!(parse_error("<g>16"),
                     ParseError::InvalidBaseLiteral { .. }));
    assert!(matches!(parse_error("<0>1"),
                     ParseError::InvalidBaseLiteral { .. }));
}

#[test]
fn malformed_input_is_a_syntax_error() {
    assert!(matches!(parse_error("1 +"), ParseError::UnexpectedEndOfInput));
    assert!(matches!(parse_error("(1 + 2"), ParseError::ExpectedClosingParen));
    assert!(matches!(parse_error("[1 2"), ParseError::ExpectedClosingBracket));
    assert!(matches!(parse_error("1{kg"), ParseError::ExpectedClosingBrace));
    assert!(matches!(parse_error("1 2"), ParseError::TrailingTokens { .. }));
    assert!(matches!(parse_error("def f = 1"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_error("$"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn export_and_import_round_trip_a_session() {
    let mut original = Environment::new();
    evaluate("x = 3", &mut original).unwrap();
    evaluate("def f(a, b) = a * b + x", &mut original).unwrap();

    let (variables, functions) = original.export_bindings();
    assert!(functions.contains_key("f"));
    assert!(!functions.contains_key("sin"), "builtins must never be exported");

    // The payload is plain data; persistence can serialize it as-is.
    let serialized = serde_json::to_string(&functions).unwrap();
    let functions = serde_json::from_str(&serialized).unwrap();

    let mut restored = Environment::new();
    restored.import_bindings(variables, functions).unwrap();

    assert_eq!(evaluate("f(2, 5)", &mut restored).unwrap().unwrap().to_string(),
               "13");
}
