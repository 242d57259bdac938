use crate::{
    error::RuntimeError,
    interpreter::{
        env::{BuiltinFn, Environment},
        evaluator::{arith, core::EvalResult},
        value::{complex::ComplexNumber, core::Value, matrix::Matrix},
    },
};

/// Defines the builtin function table.
///
/// Each entry provides a name, a fixed arity and a function pointer. The
/// macro produces `BUILTIN_TABLE`, which [`install`] copies into a session's
/// root scope as protected entries. The arithmetic operators live here under
/// their symbolic names because the parser lowers `1 + 2` to an application
/// of `+`.
macro_rules! builtin_functions {
    (
        $(
            $name:literal => {
                arity: $arity:expr,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        static BUILTIN_TABLE: &[(&str, usize, BuiltinFn)] = &[
            $(
                ($name, $arity, $func),
            )*
        ];
    };
}

builtin_functions! {
    "+"    => { arity: 2, func: arith::add },
    "-"    => { arity: 2, func: arith::sub },
    "neg"  => { arity: 1, func: arith::neg },
    "*"    => { arity: 2, func: arith::mul },
    "/"    => { arity: 2, func: arith::div },
    "pow"  => { arity: 2, func: arith::pow },
    "sin"  => { arity: 1, func: sin },
    "cos"  => { arity: 1, func: cos },
    "tan"  => { arity: 1, func: tan },
    "ctg"  => { arity: 1, func: ctg },
    "ln"   => { arity: 1, func: ln },
    "lg"   => { arity: 1, func: lg },
    "log2" => { arity: 1, func: log2 },
    "sqrt" => { arity: 1, func: sqrt },
    "fact" => { arity: 1, func: fact },
    "T"    => { arity: 1, func: transpose },
    "tr"   => { arity: 1, func: trace },
    "D"    => { arity: 1, func: determinant },
    "rk"   => { arity: 1, func: rank },
    "inv"  => { arity: 1, func: inverse },
}

/// Installs the builtin table into a session's root scope.
///
/// Called once per session while constructing the [`Environment`]; every
/// entry is marked builtin and therefore protected against redefinition and
/// deletion.
pub fn install(env: &mut Environment) {
    for &(name, arity, func) in BUILTIN_TABLE {
        env.install_builtin(name, arity, func);
    }
}

/// Applies a scalar function to a value, entering matrices elementwise.
///
/// Real entries go through the real function so results stay exact where
/// `f64` is; complex entries use the complex variant.
fn elementwise(value: &Value,
               real_fn: fn(f64) -> f64,
               complex_fn: fn(ComplexNumber) -> ComplexNumber)
               -> EvalResult<Value> {
    match value {
        Value::Real(r) => Ok(Value::Real(real_fn(*r))),
        Value::Complex(c) => Ok(Value::collapsed(complex_fn(*c))),
        Value::Matrix(m) => Ok(Value::Matrix(m.map(|entry| {
                                                  if entry.imaginary == 0.0 {
                                                      ComplexNumber::from(real_fn(entry.real))
                                                  } else {
                                                      complex_fn(entry)
                                                  }
                                              }))),
        Value::Quantity(_) => Err(RuntimeError::TypeError { details: "scalar functions do not accept quantities".to_string(), }),
    }
}

/// Generates a unary builtin that maps its real and complex variants over
/// the argument.
macro_rules! scalar_builtin {
    ($fname:ident, $real_fn:expr, $complex_fn:expr) => {
        fn $fname(args: &[Value]) -> EvalResult<Value> {
            elementwise(&args[0], $real_fn, $complex_fn)
        }
    };
}

scalar_builtin!(sin, f64::sin, ComplexNumber::sin);
scalar_builtin!(cos, f64::cos, ComplexNumber::cos);
scalar_builtin!(tan, f64::tan, ComplexNumber::tan);
scalar_builtin!(ctg, |x| 1.0 / x.tan(), |c| ComplexNumber::from(1.0) / c.tan());
scalar_builtin!(ln, f64::ln, ComplexNumber::ln);
scalar_builtin!(lg, f64::log10, |c| c.ln().scaled(1.0 / std::f64::consts::LN_10));
scalar_builtin!(log2, f64::log2, |c| c.ln().scaled(1.0 / std::f64::consts::LN_2));

/// The square root, promoting negative reals to a pure-imaginary result.
fn sqrt(args: &[Value]) -> EvalResult<Value> {
    fn entry_sqrt(c: ComplexNumber) -> ComplexNumber {
        if c.imaginary == 0.0 {
            if c.real >= 0.0 {
                ComplexNumber::from(c.real.sqrt())
            } else {
                ComplexNumber::new(0.0, (-c.real).sqrt())
            }
        } else {
            c.sqrt()
        }
    }

    match &args[0] {
        Value::Real(r) if *r >= 0.0 => Ok(Value::Real(r.sqrt())),
        Value::Real(r) => Ok(Value::Complex(ComplexNumber::new(0.0, (-r).sqrt()))),
        Value::Complex(c) => Ok(Value::collapsed(c.sqrt())),
        Value::Matrix(m) => Ok(Value::Matrix(m.map(entry_sqrt))),
        Value::Quantity(_) => Err(RuntimeError::TypeError { details: "scalar functions do not accept quantities".to_string(), }),
    }
}

/// The generalized factorial: `fact(x)` is `Γ(x + 1)`.
///
/// The gamma function has poles at the non-positive integers, so negative
/// integer arguments are a domain error.
fn fact(args: &[Value]) -> EvalResult<Value> {
    let x = match &args[0] {
        Value::Real(r) => *r,
        _ => {
            return Err(RuntimeError::TypeError { details: "fact expects a real number".to_string(), });
        },
    };

    let z = x + 1.0;
    if z <= 0.0 && z.fract() == 0.0 {
        return Err(RuntimeError::DomainError { details: format!("fact({x}) lies on a pole of the gamma function"), });
    }

    Ok(Value::Real(euler_gamma(z)))
}

/// Computes the gamma function Γ(z) using the Lanczos approximation.
///
/// Uses the standard 9-term Lanczos coefficients (`g = 7`). For `z < 0.5`
/// the reflection formula `Γ(z) = π / (sin(πz) * Γ(1 − z))` is applied;
/// poles are rejected by the caller.
fn euler_gamma(z: f64) -> f64 {
    // Lanczos coefficients, g = 7, n = 9.
    // These are standard values from Numerical Recipes.
    const COEFFS: [f64; 9] = [0.999_999_999_999_809_9,
                              676.520_368_121_885_1,
                              -1_259.139_216_722_402_8,
                              771.323_428_777_653_1,
                              -176.615_029_162_140_6,
                              12.507_343_278_686_905,
                              -0.138_571_095_265_720_12,
                              9.984_369_578_019_572e-6,
                              1.505_632_735_149_311_6e-7];
    const G: f64 = 7.0;

    if z < 0.5 {
        std::f64::consts::PI / ((std::f64::consts::PI * z).sin() * euler_gamma(1.0 - z))
    } else {
        let z_minus_1 = z - 1.0;
        let mut x = COEFFS[0];

        #[allow(clippy::cast_precision_loss)]
        for (i, &c) in COEFFS.iter().enumerate().skip(1) {
            x += c / (z_minus_1 + i as f64);
        }

        let t = z_minus_1 + G + 0.5;

        (std::f64::consts::TAU).sqrt() * t.powf(z_minus_1 + 0.5) * (-t).exp() * x
    }
}

/// Requires a matrix operand for the linear-algebra builtins.
fn as_matrix<'a>(value: &'a Value, function: &str) -> EvalResult<&'a Matrix> {
    match value {
        Value::Matrix(m) => Ok(m),
        _ => Err(RuntimeError::TypeError { details: format!("{function} expects a matrix"), }),
    }
}

fn transpose(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Matrix(as_matrix(&args[0], "T")?.transpose()))
}

fn trace(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::collapsed(as_matrix(&args[0], "tr")?.trace()))
}

fn determinant(args: &[Value]) -> EvalResult<Value> {
    as_matrix(&args[0], "D")?.determinant().map(Value::collapsed)
}

#[allow(clippy::cast_precision_loss)]
fn rank(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Real(as_matrix(&args[0], "rk")?.rank() as f64))
}

fn inverse(args: &[Value]) -> EvalResult<Value> {
    as_matrix(&args[0], "inv")?.inverse().map(Value::Matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_generalizes_the_factorial() {
        assert!((euler_gamma(5.0) - 24.0).abs() < 1e-10);
        assert!((euler_gamma(1.0) - 1.0).abs() < 1e-12);

        // Γ(1/2) = √π
        let half = euler_gamma(0.5);
        assert!((half - std::f64::consts::PI.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn fact_rejects_negative_integers() {
        let result = fact(&[Value::Real(-2.0)]);
        assert!(matches!(result, Err(RuntimeError::DomainError { .. })));
    }

    #[test]
    fn sqrt_of_negative_real_is_pure_imaginary() {
        let result = sqrt(&[Value::Real(-4.0)]).unwrap();
        assert_eq!(result, Value::Complex(ComplexNumber::new(0.0, 2.0)));
    }
}
