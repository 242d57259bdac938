use crate::{
    ast::UnitExpr,
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        units,
        value::{
            complex::ComplexNumber,
            core::{Quantity, Value},
        },
    },
};

/// Adds two values. Quantities must share a physical dimension; the right
/// operand is re-expressed in the left operand's unit.
pub fn add(args: &[Value]) -> EvalResult<Value> {
    add_values(&args[0], &args[1])
}

/// Subtracts the second value from the first, with the same promotion and
/// unit rules as addition.
pub fn sub(args: &[Value]) -> EvalResult<Value> {
    sub_values(&args[0], &args[1])
}

/// Multiplies two values. Matrix operands use matrix multiplication;
/// quantity units combine symbolically.
pub fn mul(args: &[Value]) -> EvalResult<Value> {
    mul_values(&args[0], &args[1])
}

/// Divides the first value by the second.
pub fn div(args: &[Value]) -> EvalResult<Value> {
    div_values(&args[0], &args[1])
}

/// Negates a value of any kind.
pub fn neg(args: &[Value]) -> EvalResult<Value> {
    neg_value(&args[0])
}

/// Raises the first value to the power of the second.
pub fn pow(args: &[Value]) -> EvalResult<Value> {
    pow_values(&args[0], &args[1])
}

pub(crate) fn add_values(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Quantity(a), Value::Quantity(b)) => {
            let factor = units::conversion_factor(&b.unit, &a.unit)?;
            let converted = b.magnitude.scaled(factor)?;
            let sum = add_values(&a.magnitude, &converted)?;
            Ok(quantity(sum, a.unit.clone()))
        },
        (Value::Quantity(_), _) | (_, Value::Quantity(_)) => Err(bare_and_quantity("add")),

        (Value::Matrix(a), Value::Matrix(b)) => a.zip_map(b, |x, y| x + y).map(Value::Matrix),
        (Value::Matrix(m), other) => {
            let scalar = other.as_complex()?;
            Ok(Value::Matrix(m.map(|entry| entry + scalar)))
        },
        (other, Value::Matrix(m)) => {
            let scalar = other.as_complex()?;
            Ok(Value::Matrix(m.map(|entry| scalar + entry)))
        },

        (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a + b)),
        _ => Ok(Value::collapsed(left.as_complex()? + right.as_complex()?)),
    }
}

pub(crate) fn sub_values(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Quantity(a), Value::Quantity(b)) => {
            let factor = units::conversion_factor(&b.unit, &a.unit)?;
            let converted = b.magnitude.scaled(factor)?;
            let difference = sub_values(&a.magnitude, &converted)?;
            Ok(quantity(difference, a.unit.clone()))
        },
        (Value::Quantity(_), _) | (_, Value::Quantity(_)) => Err(bare_and_quantity("subtract")),

        (Value::Matrix(a), Value::Matrix(b)) => a.zip_map(b, |x, y| x - y).map(Value::Matrix),
        (Value::Matrix(m), other) => {
            let scalar = other.as_complex()?;
            Ok(Value::Matrix(m.map(|entry| entry - scalar)))
        },
        (other, Value::Matrix(m)) => {
            let scalar = other.as_complex()?;
            Ok(Value::Matrix(m.map(|entry| scalar - entry)))
        },

        (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a - b)),
        _ => Ok(Value::collapsed(left.as_complex()? - right.as_complex()?)),
    }
}

pub(crate) fn mul_values(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Quantity(a), Value::Quantity(b)) => {
            let product = mul_values(&a.magnitude, &b.magnitude)?;
            Ok(quantity(product,
                        UnitExpr::Mul(Box::new(a.unit.clone()), Box::new(b.unit.clone()))))
        },
        (Value::Quantity(q), other) => {
            let product = mul_values(&q.magnitude, other)?;
            Ok(quantity(product, q.unit.clone()))
        },
        (other, Value::Quantity(q)) => {
            let product = mul_values(other, &q.magnitude)?;
            Ok(quantity(product, q.unit.clone()))
        },

        (Value::Matrix(a), Value::Matrix(b)) => a.matmul(b).map(Value::Matrix),
        (Value::Matrix(m), other) => {
            let scalar = other.as_complex()?;
            Ok(Value::Matrix(m.scale(scalar)))
        },
        (other, Value::Matrix(m)) => {
            let scalar = other.as_complex()?;
            Ok(Value::Matrix(m.scale(scalar)))
        },

        (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a * b)),
        _ => Ok(Value::collapsed(left.as_complex()? * right.as_complex()?)),
    }
}

pub(crate) fn div_values(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Quantity(a), Value::Quantity(b)) => {
            let ratio = div_values(&a.magnitude, &b.magnitude)?;
            Ok(quantity(ratio,
                        UnitExpr::Div(Box::new(a.unit.clone()), Box::new(b.unit.clone()))))
        },
        (Value::Quantity(q), other) => {
            let ratio = div_values(&q.magnitude, other)?;
            Ok(quantity(ratio, q.unit.clone()))
        },
        (_, Value::Quantity(_)) => {
            Err(RuntimeError::TypeError { details: "cannot divide a bare value by a quantity".to_string(), })
        },

        (Value::Matrix(a), Value::Matrix(b)) => a.zip_map(b, |x, y| x / y).map(Value::Matrix),
        (Value::Matrix(m), other) => {
            let scalar = other.as_complex()?;
            Ok(Value::Matrix(m.map(|entry| entry / scalar)))
        },
        (other, Value::Matrix(m)) => {
            let scalar = other.as_complex()?;
            Ok(Value::Matrix(m.map(|entry| scalar / entry)))
        },

        (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a / b)),
        _ => Ok(Value::collapsed(left.as_complex()? / right.as_complex()?)),
    }
}

pub(crate) fn neg_value(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Real(r) => Ok(Value::Real(-r)),
        Value::Complex(c) => Ok(Value::Complex(-*c)),
        Value::Matrix(m) => Ok(Value::Matrix(m.map(|entry| -entry))),
        Value::Quantity(q) => {
            let negated = neg_value(&q.magnitude)?;
            Ok(quantity(negated, q.unit.clone()))
        },
    }
}

pub(crate) fn pow_values(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Quantity(q), Value::Real(exponent)) => {
            let count = quantity_exponent(*exponent)?;
            let raised = pow_values(&q.magnitude, right)?;
            Ok(quantity(raised, unit_power(&q.unit, count)))
        },
        (Value::Quantity(_), _) | (_, Value::Quantity(_)) => {
            Err(RuntimeError::TypeError { details: "quantity exponentiation requires a positive integer exponent".to_string(), })
        },

        (Value::Matrix(a), Value::Matrix(b)) => {
            a.zip_map(b, ComplexNumber::powc).map(Value::Matrix)
        },
        (Value::Matrix(m), other) => {
            let exponent = other.as_complex()?;
            Ok(Value::Matrix(m.map(|entry| entry.powc(exponent))))
        },
        (other, Value::Matrix(m)) => {
            let base = other.as_complex()?;
            Ok(Value::Matrix(m.map(|entry| base.powc(entry))))
        },

        (Value::Real(base), Value::Real(exponent)) => {
            // A negative base with a fractional exponent has no real result;
            // promote to the complex principal value.
            if *base < 0.0 && exponent.fract() != 0.0 {
                Ok(Value::collapsed(ComplexNumber::from(*base).powf(*exponent)))
            } else {
                Ok(Value::Real(base.powf(*exponent)))
            }
        },
        _ => Ok(Value::collapsed(left.as_complex()?.powc(right.as_complex()?))),
    }
}

/// Validates a quantity exponent: a positive integer, returned as a count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantity_exponent(exponent: f64) -> EvalResult<u32> {
    if exponent >= 1.0 && exponent.fract() == 0.0 && exponent <= f64::from(u32::MAX) {
        Ok(exponent as u32)
    } else {
        Err(RuntimeError::TypeError { details: "quantity exponentiation requires a positive integer exponent".to_string(), })
    }
}

/// Repeats a unit `count` times as a product: `m^3` becomes `m * m * m`.
fn unit_power(unit: &UnitExpr, count: u32) -> UnitExpr {
    let mut result = unit.clone();
    for _ in 1..count {
        result = UnitExpr::Mul(Box::new(result), Box::new(unit.clone()));
    }
    result
}

fn quantity(magnitude: Value, unit: UnitExpr) -> Value {
    Value::Quantity(Quantity { magnitude: Box::new(magnitude),
                               unit })
}

fn bare_and_quantity(operation: &str) -> RuntimeError {
    RuntimeError::TypeError { details: format!("cannot {operation} a bare value and a quantity"), }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_promotion_collapses_back_to_real() {
        let i = Value::Complex(ComplexNumber::new(0.0, 1.0));
        let product = mul_values(&i, &i).unwrap();
        assert_eq!(product, Value::Real(-1.0));
    }

    #[test]
    fn quantity_addition_converts_the_right_operand() {
        let meters = Value::Quantity(Quantity { magnitude: Box::new(Value::Real(2.0)),
                                                unit:      UnitExpr::named("m"), });
        let centimeters = Value::Quantity(Quantity { magnitude: Box::new(Value::Real(50.0)),
                                                     unit:      UnitExpr::named("cm"), });

        let sum = add_values(&meters, &centimeters).unwrap();
        assert_eq!(sum.to_string(), "2.5 m");
    }

    #[test]
    fn quantity_addition_rejects_mismatched_dimensions() {
        let mass = Value::Quantity(Quantity { magnitude: Box::new(Value::Real(1.0)),
                                              unit:      UnitExpr::named("kg"), });
        let length = Value::Quantity(Quantity { magnitude: Box::new(Value::Real(1.0)),
                                                unit:      UnitExpr::named("m"), });

        assert!(matches!(add_values(&mass, &length),
                         Err(RuntimeError::IncompatibleUnits { .. })));
    }

    #[test]
    fn negative_base_fractional_exponent_promotes() {
        let result = pow_values(&Value::Real(-4.0), &Value::Real(0.5)).unwrap();
        let Value::Complex(c) = result else {
            panic!("expected a complex result");
        };
        assert!(c.real.abs() < 1e-10);
        assert!((c.imaginary - 2.0).abs() < 1e-10);
    }

    #[test]
    fn quantity_power_repeats_the_unit() {
        let length = Value::Quantity(Quantity { magnitude: Box::new(Value::Real(3.0)),
                                                unit:      UnitExpr::named("m"), });
        let squared = pow_values(&length, &Value::Real(2.0)).unwrap();
        assert_eq!(squared.to_string(), "9 m * m");
    }
}
