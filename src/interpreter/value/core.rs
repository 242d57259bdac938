use serde::{Deserialize, Serialize};

use crate::{
    ast::UnitExpr,
    error::RuntimeError,
    interpreter::value::{complex::ComplexNumber, matrix::Matrix},
};

/// Represents a runtime value in the interpreter.
///
/// This enum models all the possible results of evaluating an expression.
/// Values are immutable once produced; operations construct new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A real number (double precision floating-point).
    Real(f64),
    /// A complex number (with real and imaginary parts).
    Complex(ComplexNumber),
    /// A rectangular matrix of numbers.
    Matrix(Matrix),
    /// A number or matrix tagged with a physical unit.
    Quantity(Quantity),
}

/// A magnitude paired with a symbolic unit expression.
///
/// The magnitude is any non-quantity [`Value`]; nesting is prevented by
/// construction (tagging an existing quantity multiplies its units instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// The numeric or matrix magnitude.
    pub magnitude: Box<Value>,
    /// The unit as written by the user.
    pub unit:      UnitExpr,
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<ComplexNumber> for Value {
    fn from(c: ComplexNumber) -> Self {
        Self::Complex(c)
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Self::Matrix(m)
    }
}

impl Value {
    /// Collapses a complex number to a real value when its imaginary part is
    /// zero, so that results like `1i * 1i` display as `-1`.
    #[must_use]
    pub const fn collapsed(c: ComplexNumber) -> Self {
        if c.imaginary == 0.0 {
            Self::Real(c.real)
        } else {
            Self::Complex(c)
        }
    }

    /// Converts the value to a complex number, or returns an error if it is
    /// a matrix or a quantity.
    ///
    /// # Example
    /// ```
    /// use mensura::interpreter::value::{complex::ComplexNumber, core::Value};
    ///
    /// let x = Value::Real(10.0);
    /// assert_eq!(x.as_complex().unwrap(), ComplexNumber::new(10.0, 0.0));
    /// ```
    pub fn as_complex(&self) -> Result<ComplexNumber, RuntimeError> {
        match self {
            Self::Real(r) => Ok(ComplexNumber::from(*r)),
            Self::Complex(c) => Ok(*c),
            Self::Matrix(_) => Err(RuntimeError::TypeError { details: "expected a number, found a matrix".to_string(), }),
            Self::Quantity(_) => Err(RuntimeError::TypeError { details: "expected a number, found a quantity".to_string(), }),
        }
    }

    /// Converts the value to a real number, or returns an error if it has an
    /// imaginary part or is not numeric.
    pub fn as_real(&self) -> Result<f64, RuntimeError> {
        match self {
            Self::Real(r) => Ok(*r),
            Self::Complex(c) if c.imaginary == 0.0 => Ok(c.real),
            Self::Complex(_) => Err(RuntimeError::TypeError { details: "expected a real number, found a complex one".to_string(), }),
            _ => self.as_complex().map(|c| c.real),
        }
    }

    /// Returns `true` if the value is a scalar (real or complex).
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Real(_) | Self::Complex(_))
    }

    /// Returns `true` if the value is [`Matrix`].
    #[must_use]
    pub const fn is_matrix(&self) -> bool {
        matches!(self, Self::Matrix(_))
    }

    /// Scales the value by a real factor, entering matrices elementwise.
    /// Used by unit conversion; quantities are not valid magnitudes.
    pub(crate) fn scaled(&self, factor: f64) -> Result<Self, RuntimeError> {
        match self {
            Self::Real(r) => Ok(Self::Real(r * factor)),
            Self::Complex(c) => Ok(Self::collapsed(c.scaled(factor))),
            Self::Matrix(m) => Ok(Self::Matrix(m.map(|c| c.scaled(factor)))),
            Self::Quantity(_) => Err(RuntimeError::TypeError { details: "a quantity cannot be the magnitude of another quantity".to_string(), }),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real(r) => write!(f, "{r}"),
            Self::Complex(c) => write!(f, "{c}"),
            Self::Matrix(m) => write!(f, "{m}"),
            Self::Quantity(q) => write!(f, "{} {}", q.magnitude, q.unit),
        }
    }
}
