//! Variable values: a scalar or a fixed-length array of [`Real`].
//!
//! `NaN` marks an element as unset. A value whose every element is `NaN`
//! carries no usable default.

use crate::numeric::{Real, Tolerances, nearly_equal};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Vector(usize),
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => write!(f, "scalar"),
            Shape::Vector(n) => write!(f, "({n},)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Real),
    Array(Vec<Real>),
}

impl Value {
    /// Unset scalar.
    pub fn unset() -> Self {
        Value::Scalar(Real::NAN)
    }

    /// Unset array of the given length.
    pub fn unset_array(len: usize) -> Self {
        Value::Array(vec![Real::NAN; len])
    }

    /// Unset value with the given shape.
    pub fn unset_like(shape: Shape) -> Self {
        match shape {
            Shape::Scalar => Value::unset(),
            Shape::Vector(n) => Value::unset_array(n),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Value::Scalar(_) => Shape::Scalar,
            Value::Array(v) => Shape::Vector(v.len()),
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn as_slice(&self) -> &[Real] {
        match self {
            Value::Scalar(v) => std::slice::from_ref(v),
            Value::Array(v) => v,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [Real] {
        match self {
            Value::Scalar(v) => std::slice::from_mut(v),
            Value::Array(v) => v,
        }
    }

    pub fn as_scalar(&self) -> Option<Real> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Array(_) => None,
        }
    }

    /// True when every element is the `NaN` sentinel (an empty array counts as unset).
    pub fn is_unset(&self) -> bool {
        self.as_slice().iter().all(|v| v.is_nan())
    }

    /// True when at least one element is `NaN`.
    pub fn has_unset(&self) -> bool {
        self.as_slice().iter().any(|v| v.is_nan())
    }

    pub fn map(&self, f: impl Fn(Real) -> Real) -> Value {
        match self {
            Value::Scalar(v) => Value::Scalar(f(*v)),
            Value::Array(v) => Value::Array(v.iter().map(|x| f(*x)).collect()),
        }
    }

    /// Element-wise comparison where two `NaN`s are considered equal.
    pub fn approx_eq(&self, other: &Value, tol: Tolerances) -> bool {
        self.shape() == other.shape()
            && self
                .as_slice()
                .iter()
                .zip(other.as_slice())
                .all(|(a, b)| (a.is_nan() && b.is_nan()) || nearly_equal(*a, *b, tol))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::unset()
    }
}

impl From<Real> for Value {
    fn from(v: Real) -> Self {
        Value::Scalar(v)
    }
}

impl From<Vec<Real>> for Value {
    fn from(v: Vec<Real>) -> Self {
        Value::Array(v)
    }
}

impl<const N: usize> From<[Real; N]> for Value {
    fn from(v: [Real; N]) -> Self {
        Value::Array(v.to_vec())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(v) => write!(f, "{v}"),
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    //! Unset elements are written as `null` so that both YAML and JSON can carry them.

    use super::{Real, Value};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    fn to_option(v: Real) -> Option<Real> {
        if v.is_nan() { None } else { Some(v) }
    }

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Value::Scalar(v) => to_option(*v).serialize(serializer),
                Value::Array(values) => {
                    let elems: Vec<Option<Real>> = values.iter().map(|v| to_option(*v)).collect();
                    elems.serialize(serializer)
                }
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawValue {
        Scalar(Option<Real>),
        Array(Vec<Option<Real>>),
    }

    impl<'de> Deserialize<'de> for Value {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            Ok(match RawValue::deserialize(deserializer)? {
                RawValue::Scalar(v) => Value::Scalar(v.unwrap_or(Real::NAN)),
                RawValue::Array(values) => {
                    Value::Array(values.into_iter().map(|v| v.unwrap_or(Real::NAN)).collect())
                }
            })
        }
    }
}
