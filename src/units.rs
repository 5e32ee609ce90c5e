// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Physical units and quantities.
//!
//! Units are runtime values: a scale factor relative to the base units plus
//! the exponents of the base dimensions.  This is enough to convert flows,
//! costs and ratios into the canonical unit of a commodity before their
//! magnitudes are handed to the optimization model, which only understands
//! plain numbers.

mod parse;

use std::collections::BTreeMap;

use crate::Error;

/// Number of base dimensions: mass, length, time, currency.
const NUM_DIMS: usize = 4;

/// Exponents of the base dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Dims([i8; NUM_DIMS]);

impl Dims {
    pub(crate) const MASS: Dims = Dims([1, 0, 0, 0]);
    pub(crate) const LENGTH: Dims = Dims([0, 1, 0, 0]);
    pub(crate) const TIME: Dims = Dims([0, 0, 1, 0]);
    pub(crate) const CURRENCY: Dims = Dims([0, 0, 0, 1]);
    pub(crate) const VOLUME: Dims = Dims([0, 3, 0, 0]);
    pub(crate) const MASS_FLOW: Dims = Dims([1, 0, -1, 0]);
    pub(crate) const ENERGY: Dims = Dims([1, 2, -2, 0]);
    pub(crate) const POWER: Dims = Dims([1, 2, -3, 0]);

    /// Returns `self + sign * other`, or `None` if an exponent overflows.
    fn combine(self, other: Dims, sign: i8) -> Option<Dims> {
        let mut dims = self.0;
        for (d, o) in dims.iter_mut().zip(other.0) {
            *d = d.checked_add(sign.checked_mul(o)?)?;
        }
        Some(Dims(dims))
    }

    /// Returns `exponent * self`, or `None` if an exponent overflows.
    fn scaled(self, exponent: i8) -> Option<Dims> {
        let mut dims = self.0;
        for d in dims.iter_mut() {
            *d = d.checked_mul(exponent)?;
        }
        Some(Dims(dims))
    }
}

/// A physical unit, e.g. `MW`, `t/h` or `EUR/MW`.
#[derive(Clone, Debug)]
pub struct Unit {
    symbol: String,
    scale: f64,
    dims: Dims,
}

impl Unit {
    pub(crate) fn from_parts(symbol: impl Into<String>, scale: f64, dims: Dims) -> Self {
        Self {
            symbol: symbol.into(),
            scale,
            dims,
        }
    }

    /// The unit of dimensionless numbers.
    pub fn dimensionless() -> Self {
        Self::from_parts("1", 1.0, Dims::default())
    }

    /// Parses a unit expression like `"EUR/(t/h)"` or `"kg*h^-1"`.
    pub fn parse(symbol: &str) -> Result<Self, Error> {
        parse::parse_unit(symbol)
    }

    /// Returns the symbol the unit was created from.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns true if the unit has no dimensions.
    pub fn is_dimensionless(&self) -> bool {
        self.dims == Dims::default()
    }

    /// Returns the factor `f`, such that `x [self] == x * f [target]`.
    ///
    /// Fails if the two units have different dimensions.
    pub fn factor_to(&self, target: &Unit) -> Result<f64, Error> {
        if self.dims != target.dims {
            return Err(Error::invalid_unit(format!(
                "Can't convert from '{}' to '{}': incompatible dimensions.",
                self.symbol, target.symbol
            )));
        }
        Ok(self.scale / target.scale)
    }

    /// Raises the unit to an integer power.
    ///
    /// Fails if a dimension exponent of the result doesn't fit into an `i8`.
    pub fn powi(&self, exponent: i8) -> Result<Self, Error> {
        let symbol = format!("{}^{}", Self::bracketed(&self.symbol), exponent);
        let dims = self
            .dims
            .scaled(exponent)
            .ok_or_else(|| Self::out_of_range(&symbol))?;
        Ok(Self {
            symbol,
            scale: self.scale.powi(exponent as i32),
            dims,
        })
    }

    /// Returns the product of two units.
    pub fn try_mul(&self, rhs: &Unit) -> Result<Self, Error> {
        let symbol = format!("{}*{}", self.symbol, Self::bracketed(&rhs.symbol));
        let dims = self
            .dims
            .combine(rhs.dims, 1)
            .ok_or_else(|| Self::out_of_range(&symbol))?;
        Ok(Self {
            symbol,
            scale: self.scale * rhs.scale,
            dims,
        })
    }

    /// Returns the quotient of two units.
    pub fn try_div(&self, rhs: &Unit) -> Result<Self, Error> {
        let symbol = format!("{}/{}", self.symbol, Self::bracketed(&rhs.symbol));
        let dims = self
            .dims
            .combine(rhs.dims, -1)
            .ok_or_else(|| Self::out_of_range(&symbol))?;
        Ok(Self {
            symbol,
            scale: self.scale / rhs.scale,
            dims,
        })
    }

    fn out_of_range(symbol: &str) -> Error {
        Error::invalid_unit(format!(
            "Unit '{symbol}' has a dimension exponent out of range."
        ))
    }

    fn bracketed(symbol: &str) -> String {
        if symbol.contains(['*', '/', '^']) {
            format!("({symbol})")
        } else {
            symbol.to_string()
        }
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims
            && (self.scale - other.scale).abs() <= 1e-12 * self.scale.abs().max(other.scale.abs())
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// A magnitude, optionally tagged with a unit.
///
/// A quantity without a unit is taken to be expressed in whatever canonical
/// unit it is used with, so plain numbers pass through conversions unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Quantity {
    magnitude: f64,
    unit: Option<Unit>,
}

impl Quantity {
    /// Creates a quantity with the given unit.
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self {
            magnitude,
            unit: Some(unit),
        }
    }

    /// Creates a quantity, parsing the unit from a string.
    pub fn parse(magnitude: f64, unit: &str) -> Result<Self, Error> {
        Ok(Self::new(magnitude, Unit::parse(unit)?))
    }

    /// Returns the magnitude in the quantity's own unit.
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Returns the unit of the quantity, if it has one.
    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    /// Returns the magnitude expressed in `target`.
    pub fn to_magnitude(&self, target: &Unit) -> Result<f64, Error> {
        match &self.unit {
            Some(unit) => Ok(self.magnitude * unit.factor_to(target)?),
            None => Ok(self.magnitude),
        }
    }

    /// Converts the quantity into `target`.
    pub fn convert(&self, target: &Unit) -> Result<Quantity, Error> {
        Ok(Quantity::new(self.to_magnitude(target)?, target.clone()))
    }
}

impl From<f64> for Quantity {
    fn from(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: None,
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} {}", self.magnitude, unit),
            None => write!(f, "{}", self.magnitude),
        }
    }
}

/// Maps commodity names to their canonical units.
#[derive(Clone, Debug)]
pub struct UnitMap {
    units: BTreeMap<String, Unit>,
}

impl Default for UnitMap {
    fn default() -> Self {
        let megawatt = Unit::from_parts("MW", 1e6, Dims::POWER);
        let tonne_per_hour = Unit::from_parts("t/h", 1e3 / 3600.0, Dims::MASS_FLOW);

        let mut units = UnitMap::empty();
        units.insert("electricity", megawatt.clone());
        units.insert("co2", tonne_per_hour.clone());
        units.insert("hydrogen", tonne_per_hour.clone());
        units.insert("gas", megawatt);
        units.insert("methanol", tonne_per_hour);
        units
    }
}

impl UnitMap {
    /// Creates a map without any commodities.
    pub fn empty() -> Self {
        Self {
            units: BTreeMap::new(),
        }
    }

    /// Sets the unit of a commodity, replacing an existing one.
    pub fn insert(&mut self, commodity: impl Into<String>, unit: Unit) {
        self.units.insert(commodity.into(), unit);
    }

    /// Returns the canonical unit of the given commodity.
    pub fn unit_of(&self, commodity: &str) -> Result<&Unit, Error> {
        self.units.get(commodity).ok_or_else(|| {
            Error::invalid_unit(format!("No unit defined for commodity '{commodity}'."))
        })
    }

    /// Returns an iterator over all commodities and their units.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Unit)> {
        self.units.iter().map(|(c, u)| (c.as_str(), u))
    }
}
