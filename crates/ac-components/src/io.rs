//! Named input/output views handed to a discipline during `compute`.
//!
//! Values are expressed in the units the discipline declared; the system
//! converts to and from the canonical units of the variable store.

use std::collections::BTreeMap;

use ac_core::{Real, Value};

use crate::error::{ComponentError, ComponentResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    values: BTreeMap<String, Value>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> ComponentResult<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| ComponentError::MissingInput {
                name: name.to_string(),
            })
    }

    pub fn scalar(&self, name: &str) -> ComponentResult<Real> {
        self.get(name)?
            .as_scalar()
            .ok_or_else(|| ComponentError::WrongShape {
                name: name.to_string(),
                expected: "a scalar",
                actual: "an array",
            })
    }

    pub fn array(&self, name: &str) -> ComponentResult<&[Real]> {
        match self.get(name)? {
            Value::Array(v) => Ok(v),
            Value::Scalar(_) => Err(ComponentError::WrongShape {
                name: name.to_string(),
                expected: "an array",
                actual: "a scalar",
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Output slots, seeded with every declared output name.
///
/// Writing a name that was not declared is an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    values: BTreeMap<String, Value>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an output slot with its current value.
    pub fn declare(&mut self, name: impl Into<String>, current: Value) {
        self.values.insert(name.into(), current);
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ComponentResult<()> {
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| ComponentError::UnknownOutput {
                name: name.to_string(),
            })?;
        *slot = value.into();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<Real> {
        self.get(name).and_then(Value::as_scalar)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }
}
