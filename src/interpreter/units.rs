use crate::{ast::UnitExpr, error::RuntimeError};

/// A vector of exponents over the seven SI base dimensions, in the order
/// mass, length, time, current, temperature, amount, luminous intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension(pub [i8; 7]);

impl Dimension {
    /// The dimensionless vector.
    pub const NONE: Self = Self([0; 7]);

    /// Combines two dimension vectors: `sign` is `1` for multiplication and
    /// `-1` for division.
    #[must_use]
    pub fn combine(self, other: Self, sign: i8) -> Self {
        let mut out = self.0;
        for (slot, exponent) in out.iter_mut().zip(other.0) {
            *slot += sign * exponent;
        }
        Self(out)
    }
}

/// A unit expression resolved against the registry: its physical dimension
/// and the factor that converts one of it into the registry's base units.
///
/// The base unit of each dimension is the smallest registered one (mg, mm,
/// ms, mA), so the scale of every metric unit is an exactly representable
/// power of ten and conversion factors between metric units stay exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedUnit {
    /// The physical dimension.
    pub dimension: Dimension,
    /// Scale factor to the registry's base units.
    pub scale:     f64,
}

/// Shorthand for a dimension vector literal.
const fn dim(mass: i8,
             length: i8,
             time: i8,
             current: i8,
             temperature: i8,
             amount: i8,
             luminous: i8)
             -> Dimension {
    Dimension([mass, length, time, current, temperature, amount, luminous])
}

/// Defines the unit registry as a static lookup table.
///
/// Each entry provides a unit name, its dimension vector and its scale to
/// the registry's base units.
macro_rules! unit_table {
    (
        $(
            $name:literal => { dim: $dimension:expr, scale: $scale:expr $(,)? }
        ),* $(,)?
    ) => {
        /// Every registered unit: `(name, dimension, scale to base units)`.
        pub static UNIT_TABLE: &[(&str, Dimension, f64)] = &[
            $(
                ($name, $dimension, $scale),
            )*
        ];
    };
}

unit_table! {
    // mass (base: mg)
    "mg"  => { dim: dim(1, 0, 0, 0, 0, 0, 0), scale: 1.0 },
    "g"   => { dim: dim(1, 0, 0, 0, 0, 0, 0), scale: 1e3 },
    "kg"  => { dim: dim(1, 0, 0, 0, 0, 0, 0), scale: 1e6 },
    "t"   => { dim: dim(1, 0, 0, 0, 0, 0, 0), scale: 1e9 },
    // length (base: mm)
    "mm"  => { dim: dim(0, 1, 0, 0, 0, 0, 0), scale: 1.0 },
    "cm"  => { dim: dim(0, 1, 0, 0, 0, 0, 0), scale: 10.0 },
    "m"   => { dim: dim(0, 1, 0, 0, 0, 0, 0), scale: 1e3 },
    "km"  => { dim: dim(0, 1, 0, 0, 0, 0, 0), scale: 1e6 },
    // time (base: ms)
    "ms"  => { dim: dim(0, 0, 1, 0, 0, 0, 0), scale: 1.0 },
    "s"   => { dim: dim(0, 0, 1, 0, 0, 0, 0), scale: 1e3 },
    "min" => { dim: dim(0, 0, 1, 0, 0, 0, 0), scale: 6e4 },
    "h"   => { dim: dim(0, 0, 1, 0, 0, 0, 0), scale: 3.6e6 },
    // current (base: mA)
    "mA"  => { dim: dim(0, 0, 0, 1, 0, 0, 0), scale: 1.0 },
    "A"   => { dim: dim(0, 0, 0, 1, 0, 0, 0), scale: 1e3 },
    // temperature, amount, luminous intensity
    "K"   => { dim: dim(0, 0, 0, 0, 1, 0, 0), scale: 1.0 },
    "mol" => { dim: dim(0, 0, 0, 0, 0, 1, 0), scale: 1.0 },
    "cd"  => { dim: dim(0, 0, 0, 0, 0, 0, 1), scale: 1.0 },
    // derived, expanded over the base units above
    "Hz"  => { dim: dim(0, 0, -1, 0, 0, 0, 0), scale: 1e-3 },
    "N"   => { dim: dim(1, 1, -2, 0, 0, 0, 0), scale: 1e3 },
    "Pa"  => { dim: dim(1, -1, -2, 0, 0, 0, 0), scale: 1e-3 },
    "J"   => { dim: dim(1, 2, -2, 0, 0, 0, 0), scale: 1e6 },
    "W"   => { dim: dim(1, 2, -3, 0, 0, 0, 0), scale: 1e3 },
}

/// Looks up a single unit name in the registry.
fn lookup(name: &str) -> Result<ResolvedUnit, RuntimeError> {
    UNIT_TABLE.iter()
              .find(|(unit, ..)| *unit == name)
              .map(|&(_, dimension, scale)| ResolvedUnit { dimension, scale })
              .ok_or_else(|| RuntimeError::UnknownUnit { name: name.to_string(), })
}

/// Resolves a unit expression to its dimension vector and SI scale factor
/// by recursively combining sub-units.
///
/// # Errors
/// Fails with `UnknownUnit` for names absent from the registry.
///
/// # Example
/// ```
/// use mensura::{ast::UnitExpr, interpreter::units::resolve};
///
/// let kg = resolve(&UnitExpr::named("kg")).unwrap();
/// let mg = resolve(&UnitExpr::named("mg")).unwrap();
///
/// assert_eq!(kg.dimension, mg.dimension);
/// assert!((kg.scale / mg.scale - 1e6).abs() < 1e-3);
/// ```
pub fn resolve(unit: &UnitExpr) -> Result<ResolvedUnit, RuntimeError> {
    match unit {
        UnitExpr::Unit(name) => lookup(name),
        UnitExpr::Mul(left, right) => {
            let l = resolve(left)?;
            let r = resolve(right)?;
            Ok(ResolvedUnit { dimension: l.dimension.combine(r.dimension, 1),
                              scale:     l.scale * r.scale, })
        },
        UnitExpr::Div(left, right) => {
            let l = resolve(left)?;
            let r = resolve(right)?;
            Ok(ResolvedUnit { dimension: l.dimension.combine(r.dimension, -1),
                              scale:     l.scale / r.scale, })
        },
    }
}

/// Computes the factor that re-expresses a magnitude in `from` units as a
/// magnitude in `to` units.
///
/// # Errors
/// - `UnknownUnit` if either side names an unregistered unit.
/// - `IncompatibleUnits` if the physical dimensions differ.
///
/// # Example
/// ```
/// use mensura::{ast::UnitExpr, interpreter::units::conversion_factor};
///
/// let factor = conversion_factor(&UnitExpr::named("kg"), &UnitExpr::named("mg")).unwrap();
/// assert!((factor - 1e6).abs() < 1e-3);
///
/// assert!(conversion_factor(&UnitExpr::named("kg"), &UnitExpr::named("m")).is_err());
/// ```
pub fn conversion_factor(from: &UnitExpr, to: &UnitExpr) -> Result<f64, RuntimeError> {
    let source = resolve(from)?;
    let target = resolve(to)?;

    if source.dimension != target.dimension {
        return Err(RuntimeError::IncompatibleUnits { from: from.to_string(),
                                                     to:   to.to_string(), });
    }

    Ok(source.scale / target.scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_units_combine_dimensions() {
        // kg * m / s
        let unit = UnitExpr::Div(Box::new(UnitExpr::Mul(Box::new(UnitExpr::named("kg")),
                                                        Box::new(UnitExpr::named("m")))),
                                 Box::new(UnitExpr::named("s")));

        let resolved = resolve(&unit).unwrap();
        assert_eq!(resolved.dimension, dim(1, 1, -1, 0, 0, 0, 0));
        assert!((resolved.scale - 1e6).abs() < 1e-6);
    }

    #[test]
    fn derived_units_match_their_expansion() {
        let newton = resolve(&UnitExpr::named("N")).unwrap();
        let expanded = resolve(&UnitExpr::Div(Box::new(UnitExpr::Mul(Box::new(UnitExpr::named("kg")),
                                                                     Box::new(UnitExpr::named("m")))),
                                              Box::new(UnitExpr::Mul(Box::new(UnitExpr::named("s")),
                                                                     Box::new(UnitExpr::named("s")))))).unwrap();

        assert_eq!(newton.dimension, expanded.dimension);
        assert!((newton.scale - expanded.scale).abs() < 1e-12);
    }

    #[test]
    fn unknown_unit_is_reported() {
        assert!(matches!(resolve(&UnitExpr::named("furlong")),
                         Err(RuntimeError::UnknownUnit { .. })));
    }

    #[test]
    fn hour_to_second_factor() {
        let factor = conversion_factor(&UnitExpr::named("h"), &UnitExpr::named("s")).unwrap();
        assert!((factor - 3600.0).abs() < 1e-9);
    }
}
