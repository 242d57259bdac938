use std::collections::HashSet;

use crate::{
    ast::{Expr, UnitExpr},
    error::RuntimeError,
    interpreter::{
        env::{Environment, FunctionKind, ScopeId, UserFunction},
        units,
        value::{
            complex::ComplexNumber,
            core::{Quantity, Value},
            matrix::Matrix,
        },
    },
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Evaluates an AST node against a scope of the session environment.
///
/// This is the main entry point for evaluation, a single recursive function
/// dispatching by node tag. Statement forms (`Assign`, `Unset`,
/// `FunctionDef`, `FunctionUndef`) mutate bindings and yield `None`; every
/// other node yields `Some(Value)`.
///
/// Failures propagate immediately, so a statement whose right-hand side
/// fails never mutates the environment.
///
/// # Example
/// ```
/// use mensura::{
///     ast::Expr,
///     interpreter::{env::Environment, evaluator::core::eval, value::core::Value},
/// };
///
/// let mut env = Environment::new();
/// let node = Expr::Apply { function:  "+".to_string(),
///                          arguments: vec![Expr::Number(2.0), Expr::Number(3.0)], };
///
/// let result = eval(&node, &mut env, Environment::ROOT).unwrap();
/// assert_eq!(result, Some(Value::Real(5.0)));
/// ```
pub fn eval(expr: &Expr, env: &mut Environment, scope: ScopeId) -> EvalResult<Option<Value>> {
    match expr {
        Expr::Number(n) => Ok(Some(Value::Real(*n))),
        Expr::Complex(c) => Ok(Some(Value::Complex(*c))),
        Expr::Variable(name) => env.get_var(scope, name).map(|value| Some(value.clone())),

        Expr::Assign { name, value } => {
            let value = eval_value(value, env, scope)?;
            env.set_var(scope, name, value);
            Ok(None)
        },

        Expr::Unset(name) => {
            env.del_var(scope, name);
            Ok(None)
        },

        Expr::FunctionDef { name, params, body } => {
            let mut seen = HashSet::new();
            for param in params {
                if !seen.insert(param.as_str()) {
                    return Err(RuntimeError::DuplicateParameter { name: param.clone(), });
                }
            }

            env.set_function(scope,
                              name,
                              UserFunction { params: params.clone(),
                                             body:   (**body).clone(), })?;
            Ok(None)
        },

        Expr::FunctionUndef(name) => {
            env.del_function(scope, name);
            Ok(None)
        },

        Expr::Apply { function, arguments } => {
            apply(function, arguments, env, scope).map(Some)
        },

        Expr::Matrix(elements) => eval_matrix(elements, env, scope).map(Some),

        Expr::WithUnits { value, unit } => {
            // Resolve eagerly so unknown unit names fail before tagging.
            units::resolve(unit)?;

            let magnitude = eval_value(value, env, scope)?;
            let quantity = match magnitude {
                Value::Quantity(inner) => {
                    // Tagging a quantity again multiplies the units.
                    Quantity { magnitude: inner.magnitude,
                               unit:      UnitExpr::Mul(Box::new(inner.unit),
                                                        Box::new(unit.clone())), }
                },
                other => Quantity { magnitude: Box::new(other),
                                    unit:      unit.clone(), },
            };

            Ok(Some(Value::Quantity(quantity)))
        },

        Expr::Convert { value, unit } => {
            let Value::Quantity(quantity) = eval_value(value, env, scope)? else {
                return Err(RuntimeError::NotAQuantity);
            };

            let factor = units::conversion_factor(&quantity.unit, unit)?;
            let magnitude = quantity.magnitude.scaled(factor)?;

            Ok(Some(Value::Quantity(Quantity { magnitude: Box::new(magnitude),
                                               unit:      unit.clone(), })))
        },
    }
}

/// Evaluates a subexpression that must produce a value.
///
/// Statement forms are only reachable at the top level by construction, so
/// a `None` here indicates a malformed tree built through the API rather
/// than the parser.
fn eval_value(expr: &Expr, env: &mut Environment, scope: ScopeId) -> EvalResult<Value> {
    eval(expr, env, scope)?.ok_or_else(|| RuntimeError::TypeError { details: "statement form used where a value is required".to_string(), })
}

/// Applies a function to its argument expressions.
///
/// Resolution walks the scope chain, the arity is checked against the
/// declared one, and the arguments are evaluated eagerly left to right in
/// the *current* scope. Builtins then run natively; user-defined functions
/// evaluate their body in a fresh scope whose parent is the caller's scope,
/// so free identifiers resolve through the calling chain (dynamic scoping)
/// and recursive definitions find themselves through the shared root.
fn apply(name: &str,
         arguments: &[Expr],
         env: &mut Environment,
         scope: ScopeId)
         -> EvalResult<Value> {
    let entry = env.get_function(scope, name)?.clone();

    if entry.arity != arguments.len() {
        return Err(RuntimeError::ArityMismatch { function: name.to_string(),
                                                 expected: entry.arity,
                                                 found:    arguments.len(), });
    }

    let mut args = Vec::with_capacity(arguments.len());
    for argument in arguments {
        args.push(eval_value(argument, env, scope)?);
    }

    match entry.kind {
        FunctionKind::Builtin(func) => func(&args),
        FunctionKind::User(function) => {
            let mark = env.scope_count();
            let call_scope = env.child_scope(scope);

            for (param, value) in function.params.iter().zip(args) {
                env.set_var(call_scope, param, value);
            }

            let result = eval(&function.body, env, call_scope);
            env.truncate_scopes(mark);

            result?.ok_or_else(|| RuntimeError::TypeError { details: "function body produced no value".to_string(), })
        },
    }
}

/// Evaluates a matrix literal.
///
/// Each cell is evaluated first. A literal of scalars builds a single row;
/// a literal of single-row matrices stacks them as the rows of a
/// two-dimensional matrix. Anything else (mixed cells, deeper nesting,
/// ragged rows) is a shape mismatch.
fn eval_matrix(elements: &[Expr], env: &mut Environment, scope: ScopeId) -> EvalResult<Value> {
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        values.push(eval_value(element, env, scope)?);
    }

    if values.iter().all(Value::is_scalar) {
        let entries = values.iter()
                            .map(Value::as_complex)
                            .collect::<EvalResult<Vec<ComplexNumber>>>()?;
        return Matrix::row(entries).map(Value::Matrix);
    }

    let mut rows = Vec::with_capacity(values.len());
    for value in &values {
        match value {
            Value::Matrix(m) if m.rows() == 1 => {
                rows.push((0..m.cols()).map(|col| m.get(0, col)).collect());
            },
            _ => {
                return Err(RuntimeError::ShapeMismatch { details: "matrix rows must all be scalars or all be rows of equal length".to_string(), });
            },
        }
    }

    Matrix::from_rows(rows).map(Value::Matrix)
}
