//! Unit vocabulary and conversions.
//!
//! Unit strings are products and quotients of known symbols with optional
//! integer powers, e.g. `m`, `m**2`, `kg/m**3`, `N*m`, `m/s**2`, `1/s`.
//! Every symbol maps to an SI scale factor taken from `uom` definitions, plus a
//! [`Dimension`] used to decide whether two units are convertible.
//!
//! Temperature offsets (`degC`, `degF`) only apply when both sides of a
//! conversion are plain temperature units. Inside compound units a
//! temperature symbol is an interval (scale only).

use std::fmt;
use thiserror::Error;
use uom::si::f64 as si;

pub type UnitResult<T> = Result<T, UnitError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit '{unit}'")]
    UnknownUnit { unit: String },

    #[error("Malformed unit expression '{unit}': {reason}")]
    Malformed { unit: String, reason: &'static str },

    #[error("Cannot convert from '{from}' to '{to}' ({from_dim} vs {to_dim})")]
    IncompatibleUnits {
        from: String,
        to: String,
        from_dim: Dimension,
        to_dim: Dimension,
    },
}

/// Exponents of the base dimensions carried by a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
    pub temperature: i8,
    pub angle: i8,
}

impl Dimension {
    pub const NONE: Dimension = Dimension::new(0, 0, 0, 0, 0);
    pub const LENGTH: Dimension = Dimension::new(1, 0, 0, 0, 0);
    pub const MASS: Dimension = Dimension::new(0, 1, 0, 0, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1, 0, 0);
    pub const TEMPERATURE: Dimension = Dimension::new(0, 0, 0, 1, 0);
    pub const ANGLE: Dimension = Dimension::new(0, 0, 0, 0, 1);
    pub const FORCE: Dimension = Dimension::new(1, 1, -2, 0, 0);
    pub const PRESSURE: Dimension = Dimension::new(-1, 1, -2, 0, 0);
    pub const ENERGY: Dimension = Dimension::new(2, 1, -2, 0, 0);
    pub const POWER: Dimension = Dimension::new(2, 1, -3, 0, 0);
    pub const VOLUME: Dimension = Dimension::new(3, 0, 0, 0, 0);
    pub const VELOCITY: Dimension = Dimension::new(1, 0, -1, 0, 0);

    pub const fn new(length: i8, mass: i8, time: i8, temperature: i8, angle: i8) -> Self {
        Self {
            length,
            mass,
            time,
            temperature,
            angle,
        }
    }

    fn scaled_add(self, other: Dimension, power: i8) -> Self {
        Self {
            length: self.length + other.length * power,
            mass: self.mass + other.mass * power,
            time: self.time + other.time * power,
            temperature: self.temperature + other.temperature * power,
            angle: self.angle + other.angle * power,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let parts = [
            ("L", self.length),
            ("M", self.mass),
            ("T", self.time),
            ("Θ", self.temperature),
            ("A", self.angle),
        ];
        let mut first = true;
        for (symbol, exp) in parts {
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "{symbol}")?;
            } else {
                write!(f, "{symbol}^{exp}")?;
            }
        }
        Ok(())
    }
}

/// A parsed unit: `si_value = value * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub dimension: Dimension,
    pub scale: f64,
    pub offset: f64,
}

impl Unit {
    pub const DIMENSIONLESS: Unit = Unit {
        dimension: Dimension::NONE,
        scale: 1.0,
        offset: 0.0,
    };

    /// Parse a unit expression from the vocabulary.
    pub fn parse(text: &str) -> UnitResult<Unit> {
        let trimmed = text.trim();
        if matches!(trimmed, "" | "-" | "unitless") {
            return Ok(Unit::DIMENSIONLESS);
        }

        let normalized = trimmed.replace("**", "^");
        let mut unit = Unit::DIMENSIONLESS;
        let mut factors = 0usize;
        let mut single: Option<(BaseUnit, i8)> = None;
        let mut divide = false;
        let mut token = String::new();

        // Trailing '*' flushes the last factor.
        for ch in normalized.chars().chain(std::iter::once('*')) {
            match ch {
                '*' | '/' => {
                    if token.is_empty() {
                        return Err(UnitError::Malformed {
                            unit: text.to_string(),
                            reason: "empty factor",
                        });
                    }
                    let (base, power) = parse_factor(&token, text)?;
                    let power = if divide { -power } else { power };
                    unit.scale *= base.scale.powi(i32::from(power));
                    unit.dimension = unit.dimension.scaled_add(base.dimension, power);
                    factors += 1;
                    single = Some((base, power));
                    token.clear();
                    divide = ch == '/';
                }
                c if c.is_whitespace() => {}
                c => token.push(c),
            }
        }

        if factors == 1
            && let Some((base, 1)) = single
        {
            unit.offset = base.offset;
        }
        Ok(unit)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }
}

#[derive(Debug, Clone, Copy)]
struct BaseUnit {
    dimension: Dimension,
    scale: f64,
    offset: f64,
}

impl BaseUnit {
    const fn linear(dimension: Dimension, scale: f64) -> Self {
        Self {
            dimension,
            scale,
            offset: 0.0,
        }
    }
}

fn parse_factor(token: &str, text: &str) -> UnitResult<(BaseUnit, i8)> {
    let (symbol, power) = match token.split_once('^') {
        Some((symbol, exp)) => {
            let power = exp.parse::<i8>().map_err(|_| UnitError::Malformed {
                unit: text.to_string(),
                reason: "exponent must be a small integer",
            })?;
            (symbol, power)
        }
        None => (token, 1),
    };

    if symbol == "1" {
        return Ok((BaseUnit::linear(Dimension::NONE, 1.0), power));
    }

    let base = base_unit(symbol).ok_or_else(|| UnitError::UnknownUnit {
        unit: symbol.to_string(),
    })?;
    Ok((base, power))
}

fn temperature_unit(zero: f64, one: f64) -> BaseUnit {
    BaseUnit {
        dimension: Dimension::TEMPERATURE,
        scale: one - zero,
        offset: zero,
    }
}

fn base_unit(symbol: &str) -> Option<BaseUnit> {
    use uom::si::{
        angle, energy, force, length, mass, power, pressure, ratio, thermodynamic_temperature,
        time, velocity, volume,
    };

    let base = match symbol {
        "m" => BaseUnit::linear(Dimension::LENGTH, si::Length::new::<length::meter>(1.0).value),
        "km" => BaseUnit::linear(
            Dimension::LENGTH,
            si::Length::new::<length::kilometer>(1.0).value,
        ),
        "cm" => BaseUnit::linear(
            Dimension::LENGTH,
            si::Length::new::<length::centimeter>(1.0).value,
        ),
        "mm" => BaseUnit::linear(
            Dimension::LENGTH,
            si::Length::new::<length::millimeter>(1.0).value,
        ),
        "ft" => BaseUnit::linear(Dimension::LENGTH, si::Length::new::<length::foot>(1.0).value),
        "inch" => BaseUnit::linear(Dimension::LENGTH, si::Length::new::<length::inch>(1.0).value),
        "mi" => BaseUnit::linear(Dimension::LENGTH, si::Length::new::<length::mile>(1.0).value),
        "nmi" | "NM" => BaseUnit::linear(
            Dimension::LENGTH,
            si::Length::new::<length::nautical_mile>(1.0).value,
        ),
        "kg" => BaseUnit::linear(Dimension::MASS, si::Mass::new::<mass::kilogram>(1.0).value),
        "g" => BaseUnit::linear(Dimension::MASS, si::Mass::new::<mass::gram>(1.0).value),
        "t" => BaseUnit::linear(Dimension::MASS, si::Mass::new::<mass::ton>(1.0).value),
        "lb" => BaseUnit::linear(Dimension::MASS, si::Mass::new::<mass::pound>(1.0).value),
        "s" => BaseUnit::linear(Dimension::TIME, si::Time::new::<time::second>(1.0).value),
        "min" => BaseUnit::linear(Dimension::TIME, si::Time::new::<time::minute>(1.0).value),
        "h" => BaseUnit::linear(Dimension::TIME, si::Time::new::<time::hour>(1.0).value),
        "K" => BaseUnit::linear(
            Dimension::TEMPERATURE,
            si::ThermodynamicTemperature::new::<thermodynamic_temperature::kelvin>(1.0).value,
        ),
        "degC" => temperature_unit(
            si::ThermodynamicTemperature::new::<thermodynamic_temperature::degree_celsius>(0.0)
                .value,
            si::ThermodynamicTemperature::new::<thermodynamic_temperature::degree_celsius>(1.0)
                .value,
        ),
        "degF" => temperature_unit(
            si::ThermodynamicTemperature::new::<thermodynamic_temperature::degree_fahrenheit>(
                0.0,
            )
            .value,
            si::ThermodynamicTemperature::new::<thermodynamic_temperature::degree_fahrenheit>(
                1.0,
            )
            .value,
        ),
        "rad" => BaseUnit::linear(Dimension::ANGLE, si::Angle::new::<angle::radian>(1.0).value),
        "deg" => BaseUnit::linear(Dimension::ANGLE, si::Angle::new::<angle::degree>(1.0).value),
        "N" => BaseUnit::linear(Dimension::FORCE, si::Force::new::<force::newton>(1.0).value),
        "daN" => BaseUnit::linear(
            Dimension::FORCE,
            10.0 * si::Force::new::<force::newton>(1.0).value,
        ),
        "kN" => BaseUnit::linear(
            Dimension::FORCE,
            si::Force::new::<force::kilonewton>(1.0).value,
        ),
        "lbf" => BaseUnit::linear(
            Dimension::FORCE,
            si::Force::new::<force::pound_force>(1.0).value,
        ),
        "Pa" => BaseUnit::linear(
            Dimension::PRESSURE,
            si::Pressure::new::<pressure::pascal>(1.0).value,
        ),
        "hPa" => BaseUnit::linear(
            Dimension::PRESSURE,
            si::Pressure::new::<pressure::hectopascal>(1.0).value,
        ),
        "kPa" => BaseUnit::linear(
            Dimension::PRESSURE,
            si::Pressure::new::<pressure::kilopascal>(1.0).value,
        ),
        "bar" => BaseUnit::linear(
            Dimension::PRESSURE,
            si::Pressure::new::<pressure::bar>(1.0).value,
        ),
        "psi" => BaseUnit::linear(
            Dimension::PRESSURE,
            si::Pressure::new::<pressure::psi>(1.0).value,
        ),
        "J" => BaseUnit::linear(Dimension::ENERGY, si::Energy::new::<energy::joule>(1.0).value),
        "kJ" => BaseUnit::linear(
            Dimension::ENERGY,
            si::Energy::new::<energy::kilojoule>(1.0).value,
        ),
        "MJ" => BaseUnit::linear(
            Dimension::ENERGY,
            si::Energy::new::<energy::megajoule>(1.0).value,
        ),
        "W" => BaseUnit::linear(Dimension::POWER, si::Power::new::<power::watt>(1.0).value),
        "kW" => BaseUnit::linear(Dimension::POWER, si::Power::new::<power::kilowatt>(1.0).value),
        "MW" => BaseUnit::linear(Dimension::POWER, si::Power::new::<power::megawatt>(1.0).value),
        "hp" => BaseUnit::linear(
            Dimension::POWER,
            si::Power::new::<power::horsepower>(1.0).value,
        ),
        "L" => BaseUnit::linear(Dimension::VOLUME, si::Volume::new::<volume::liter>(1.0).value),
        "USgal" => BaseUnit::linear(
            Dimension::VOLUME,
            si::Volume::new::<volume::gallon>(1.0).value,
        ),
        "kn" => BaseUnit::linear(
            Dimension::VELOCITY,
            si::Velocity::new::<velocity::knot>(1.0).value,
        ),
        "percent" => BaseUnit::linear(
            Dimension::NONE,
            si::Ratio::new::<ratio::percent>(1.0).value,
        ),
        _ => return None,
    };
    Some(base)
}

/// Precomputed affine map from one unit to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    scale: f64,
    shift: f64,
}

impl UnitConverter {
    pub const IDENTITY: UnitConverter = UnitConverter {
        scale: 1.0,
        shift: 0.0,
    };

    pub fn between(from: &Unit, to: &Unit) -> Self {
        // out = ((v * from.scale + from.offset) - to.offset) / to.scale
        Self {
            scale: from.scale / to.scale,
            shift: (from.offset - to.offset) / to.scale,
        }
    }

    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.shift
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

fn parse_optional(units: Option<&str>) -> UnitResult<Unit> {
    match units {
        Some(text) => Unit::parse(text),
        None => Ok(Unit::DIMENSIONLESS),
    }
}

/// Build a converter between two optional unit strings.
///
/// `None` is treated as dimensionless.
pub fn converter(from: Option<&str>, to: Option<&str>) -> UnitResult<UnitConverter> {
    if from == to {
        return Ok(UnitConverter::IDENTITY);
    }
    let from_unit = parse_optional(from)?;
    let to_unit = parse_optional(to)?;
    if from_unit.dimension != to_unit.dimension {
        return Err(UnitError::IncompatibleUnits {
            from: from.unwrap_or("None").to_string(),
            to: to.unwrap_or("None").to_string(),
            from_dim: from_unit.dimension,
            to_dim: to_unit.dimension,
        });
    }
    Ok(UnitConverter::between(&from_unit, &to_unit))
}

/// Convert a single value between two optional unit strings.
pub fn convert(value: f64, from: Option<&str>, to: Option<&str>) -> UnitResult<f64> {
    Ok(converter(from, to)?.apply(value))
}
