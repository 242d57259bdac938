use serde::{Deserialize, Serialize};

use crate::interpreter::value::complex::ComplexNumber;

/// An abstract syntax tree node representing one parsed input line.
///
/// `Expr` covers every construct of the language: literals, variable
/// references, the statement forms recognized at top level (assignment,
/// unset, function definition and removal), function application, matrix
/// literals, and the two unit-tagging forms.
///
/// Binary operators and unary negation do not have dedicated variants; the
/// parser lowers them to [`Expr::Apply`] nodes over the operator-named
/// builtins (`+`, `-`, `*`, `/`, `pow`, `neg`), so the evaluator dispatches
/// every operation through the same function-resolution path.
///
/// Each tree is produced fresh per input line and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A real number literal.
    Number(f64),
    /// A pure-imaginary literal such as `2j` or `1.5i`.
    Complex(ComplexNumber),
    /// Reference to a variable by name.
    Variable(String),
    /// Top-level assignment: `name = expr`.
    Assign {
        /// The variable being bound.
        name:  String,
        /// The expression producing the bound value.
        value: Box<Expr>,
    },
    /// Top-level variable removal: `unset name`.
    Unset(String),
    /// Function application: `name(arg, ...)`, including the lowered
    /// arithmetic operators.
    Apply {
        /// Name of the function being applied.
        function:  String,
        /// Argument expressions, evaluated eagerly left to right.
        arguments: Vec<Expr>,
    },
    /// Top-level function definition: `def name(params) = body`.
    FunctionDef {
        /// The function name.
        name:   String,
        /// Parameter names, in declaration order.
        params: Vec<String>,
        /// The body expression evaluated on each call.
        body:   Box<Expr>,
    },
    /// Top-level function removal: `undef name`.
    FunctionUndef(String),
    /// A matrix literal: `[expr ...]`. Rows of a two-dimensional matrix
    /// appear as nested `Matrix` elements: `[[1 2] [3 4]]`.
    Matrix(Vec<Expr>),
    /// A unit-tagged value: `expr { unitexpr }`.
    WithUnits {
        /// The expression producing the magnitude.
        value: Box<Expr>,
        /// The unit to attach.
        unit:  UnitExpr,
    },
    /// A unit conversion: `expr -> { unitexpr }`, top level only.
    Convert {
        /// The expression producing the quantity to convert.
        value: Box<Expr>,
        /// The target unit.
        unit:  UnitExpr,
    },
}

/// A symbolic unit expression as written between braces.
///
/// Unit expressions are kept as trees rather than eagerly canonicalized so
/// that quantities display with the units the user wrote (`kg * m / s`).
/// They are only resolved to a dimension vector and scale factor when
/// arithmetic or conversion requires it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnitExpr {
    /// A named unit, e.g. `kg`.
    Unit(String),
    /// A product of two unit expressions.
    Mul(Box<UnitExpr>, Box<UnitExpr>),
    /// A quotient of two unit expressions.
    Div(Box<UnitExpr>, Box<UnitExpr>),
}

impl UnitExpr {
    /// Convenience constructor for a named unit.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::Unit(name.to_string())
    }

    fn fmt_operand(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit(_) => write!(f, "{self}"),
            Self::Mul(..) | Self::Div(..) => write!(f, "({self})"),
        }
    }
}

impl std::fmt::Display for UnitExpr {
    /// Renders the unit expression back to source syntax.
    ///
    /// Left operands print bare (the grammar is left-associative); right
    /// operands of `*` and `/` are parenthesized when compound, so the
    /// rendering reparses to the same tree.
    ///
    /// # Example
    /// ```
    /// use mensura::ast::UnitExpr;
    ///
    /// let unit = UnitExpr::Div(Box::new(UnitExpr::Mul(Box::new(UnitExpr::named("kg")),
    ///                                                 Box::new(UnitExpr::named("m")))),
    ///                          Box::new(UnitExpr::named("s")));
    ///
    /// assert_eq!(unit.to_string(), "kg * m / s");
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit(name) => write!(f, "{name}"),
            Self::Mul(left, right) => {
                write!(f, "{left} * ")?;
                right.fmt_operand(f)
            },
            Self::Div(left, right) => {
                write!(f, "{left} / ")?;
                right.fmt_operand(f)
            },
        }
    }
}
