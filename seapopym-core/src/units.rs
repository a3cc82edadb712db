//! Physical units of forcing fields and their conversion to the standard units of the model.
//!
//! Unit strings are parsed into products of known symbols with integer exponents, so that
//! `kg m-2 day-1`, `kg/m^2/day` and `kg / m**2 / d` are the same unit.
//!
//! ```
//! use seapopym_core::units::Unit;
//!
//! let from = Unit::parse("mg m-2 d-1").unwrap();
//! let to = Unit::parse("kg/m^2/day").unwrap();
//! let (scale, offset) = from.conversion_to(&to).unwrap();
//! assert!((scale - 1e-6).abs() < 1e-18);
//! assert_eq!(offset, 0.0);
//! ```

use crate::array::DataArray;
use crate::errors::{SeapopymError, SeapopymResult};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Add;
use std::sync::LazyLock;

/// Exponents of the base quantities a unit is made of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub mass: i8,
    pub length: i8,
    pub time: i8,
    pub temperature: i8,
}

impl Dimension {
    pub const NONE: Dimension = Dimension::new(0, 0, 0, 0);
    pub const MASS: Dimension = Dimension::new(1, 0, 0, 0);
    pub const LENGTH: Dimension = Dimension::new(0, 1, 0, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1, 0);
    pub const TEMPERATURE: Dimension = Dimension::new(0, 0, 0, 1);

    pub const fn new(mass: i8, length: i8, time: i8, temperature: i8) -> Self {
        Self {
            mass,
            length,
            time,
            temperature,
        }
    }

    pub fn pow(self, exponent: i8) -> Self {
        Self::new(
            self.mass * exponent,
            self.length * exponent,
            self.time * exponent,
            self.temperature * exponent,
        )
    }
}

impl Add for Dimension {
    type Output = Dimension;

    fn add(self, other: Dimension) -> Dimension {
        Dimension::new(
            self.mass + other.mass,
            self.length + other.length,
            self.time + other.time,
            self.temperature + other.temperature,
        )
    }
}

/// A known unit symbol: its dimension and how to express it in SI units (`v * factor + offset`).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Symbol {
    dimension: Dimension,
    factor: f64,
    offset: f64,
}

impl Symbol {
    const fn new(dimension: Dimension, factor: f64) -> Self {
        Self {
            dimension,
            factor,
            offset: 0.0,
        }
    }
}

const SECONDS_PER_DAY: f64 = 86_400.0;

static SYMBOLS: LazyLock<HashMap<&'static str, Symbol>> = LazyLock::new(|| {
    let mut symbols = HashMap::new();
    for (name, factor) in [("kg", 1.0), ("g", 1e-3), ("mg", 1e-6), ("ug", 1e-9), ("t", 1e3)] {
        symbols.insert(name, Symbol::new(Dimension::MASS, factor));
    }
    for (name, factor) in [("m", 1.0), ("km", 1e3), ("cm", 1e-2), ("mm", 1e-3)] {
        symbols.insert(name, Symbol::new(Dimension::LENGTH, factor));
    }
    for (name, factor) in [
        ("s", 1.0),
        ("sec", 1.0),
        ("second", 1.0),
        ("seconds", 1.0),
        ("min", 60.0),
        ("h", 3600.0),
        ("hr", 3600.0),
        ("hour", 3600.0),
        ("hours", 3600.0),
        ("d", SECONDS_PER_DAY),
        ("day", SECONDS_PER_DAY),
        ("days", SECONDS_PER_DAY),
    ] {
        symbols.insert(name, Symbol::new(Dimension::TIME, factor));
    }
    for name in ["K", "kelvin"] {
        symbols.insert(name, Symbol::new(Dimension::TEMPERATURE, 1.0));
    }
    for name in ["degC", "°C", "celsius", "degree_Celsius", "degrees_Celsius", "deg_C"] {
        symbols.insert(
            name,
            Symbol {
                dimension: Dimension::TEMPERATURE,
                factor: 1.0,
                offset: 273.15,
            },
        );
    }
    symbols
});

/// A parsed unit: known symbols raised to integer exponents.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    components: BTreeMap<String, i32>,
}

impl Unit {
    /// The unit of a pure number.
    pub fn dimensionless() -> Self {
        Self {
            components: BTreeMap::new(),
        }
    }

    /// Parse a unit string. Returns `None` for malformed strings and unknown symbols.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty()
            || input == "1"
            || input.eq_ignore_ascii_case("dimensionless")
            || input.eq_ignore_ascii_case("pH")
        {
            return Some(Self::dimensionless());
        }

        let mut components = BTreeMap::new();
        let mut chars = input.chars().peekable();
        let mut divide = false;
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == '*' || c == '.' || c == '·' {
                chars.next();
                continue;
            }
            if c == '/' {
                chars.next();
                divide = true;
                continue;
            }

            let mut symbol = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphabetic() || c == '_' || c == '°' {
                    symbol.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if symbol.is_empty() {
                return None;
            }
            if symbol == "per" {
                divide = true;
                continue;
            }
            SYMBOLS.get(symbol.as_str())?;

            while matches!(chars.peek(), Some('^') | Some('*')) {
                chars.next();
            }
            let mut exponent = String::new();
            if chars.peek() == Some(&'-') {
                exponent.push('-');
                chars.next();
            }
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    exponent.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            let mut exponent: i32 = match exponent.as_str() {
                "" => 1,
                "-" => return None,
                digits => digits.parse().ok()?,
            };
            if divide {
                exponent = -exponent;
                divide = false;
            }
            *components.entry(symbol).or_insert(0) += exponent;
        }
        if divide {
            return None;
        }
        components.retain(|_, exponent| *exponent != 0);
        Some(Self { components })
    }

    pub fn dimension(&self) -> Dimension {
        self.symbols()
            .fold(Dimension::NONE, |dimension, (symbol, exponent)| {
                dimension + symbol.dimension.pow(exponent as i8)
            })
    }

    fn symbols(&self) -> impl Iterator<Item = (Symbol, i32)> + '_ {
        self.components
            .iter()
            .filter_map(|(name, exponent)| SYMBOLS.get(name.as_str()).map(|s| (*s, *exponent)))
    }

    /// `(factor, offset)` such that `v * factor + offset` is the value in SI units.
    ///
    /// Offsets only apply to a lone temperature symbol: a temperature difference per day
    /// has no offset.
    fn to_si(&self) -> (f64, f64) {
        let factor = self
            .symbols()
            .map(|(symbol, exponent)| symbol.factor.powi(exponent))
            .product();
        let offset = match self.symbols().collect::<Vec<_>>().as_slice() {
            [(symbol, 1)] => symbol.offset,
            _ => 0.0,
        };
        (factor, offset)
    }

    /// `(scale, offset)` converting a value in this unit into `target` (`v * scale + offset`).
    ///
    /// Returns `None` when the dimensions differ.
    pub fn conversion_to(&self, target: &Unit) -> Option<(f64, f64)> {
        if self.dimension() != target.dimension() {
            return None;
        }
        let (from_factor, from_offset) = self.to_si();
        let (to_factor, to_offset) = target.to_si();
        Some((
            from_factor / to_factor,
            (from_offset - to_offset) / to_factor,
        ))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "1");
        }
        let parts: Vec<String> = self
            .components
            .iter()
            .map(|(name, exponent)| match exponent {
                1 => name.clone(),
                _ => format!("{name}^{exponent}"),
            })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Units the kernels expect their inputs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardUnit {
    Temperature,
    Time,
    Production,
    Biomass,
    Dimensionless,
}

impl StandardUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            StandardUnit::Temperature => "degC",
            StandardUnit::Time => "day",
            StandardUnit::Production => "kg m-2 day-1",
            StandardUnit::Biomass => "kg m-2",
            StandardUnit::Dimensionless => "dimensionless",
        }
    }

    pub fn unit(&self) -> Unit {
        Unit::parse(self.symbol()).unwrap_or_else(Unit::dimensionless)
    }
}

/// Convert `data`, expressed in `from`, to the standard unit `to`.
///
/// The returned array carries a `units` attribute set to the standard symbol.
pub fn standardize(
    variable: &str,
    data: &DataArray,
    from: &str,
    to: StandardUnit,
) -> SeapopymResult<DataArray> {
    let incompatible = || SeapopymError::IncompatibleUnits {
        variable: variable.to_string(),
        from: from.to_string(),
        to: to.symbol().to_string(),
    };
    let (scale, offset) = Unit::parse(from)
        .and_then(|unit| unit.conversion_to(&to.unit()))
        .ok_or_else(incompatible)?;

    let mut attrs = data.attrs().clone();
    attrs.insert("units".to_string(), to.symbol().to_string());
    let values = if scale == 1.0 && offset == 0.0 {
        data.to_float()
    } else {
        data.to_float().mapv(|v| v * scale + offset)
    };
    DataArray::float(data.dims().to_vec(), values)
        .map(|converted| converted.with_attrs(attrs))
        .ok_or_else(incompatible)
}
