//! Variable declarations.

use ac_core::{Real, Shape, Value};

/// Direction of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarRole {
    Input,
    Output,
}

/// One variable as declared by a component: name, role and metadata.
///
/// ```
/// use ac_graph::VariableSpec;
///
/// let area = VariableSpec::input("data:geometry:wing:area")
///     .units("m**2")
///     .description("wing reference area");
/// assert!(area.default.is_unset());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub name: String,
    pub role: VarRole,
    pub default: Value,
    pub units: Option<String>,
    pub description: Option<String>,
}

impl VariableSpec {
    /// Input with no usable default (mandatory unless connected).
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: VarRole::Input,
            default: Value::unset(),
            units: None,
            description: None,
        }
    }

    pub fn output(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: VarRole::Output,
            default: Value::unset(),
            units: None,
            description: None,
        }
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Declare an array variable of `len` unset elements.
    pub fn shape(mut self, len: usize) -> Self {
        self.default = Value::unset_array(len);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Same declaration under another name (used for aliasing and promotion).
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn shape_of(&self) -> Shape {
        self.default.shape()
    }

    pub fn is_input(&self) -> bool {
        self.role == VarRole::Input
    }

    pub fn is_output(&self) -> bool {
        self.role == VarRole::Output
    }
}

/// Name, default, units and description of a variable, as reported to users
/// and written to snapshot files.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    pub name: String,
    pub value: Value,
    pub units: Option<String>,
    pub description: Option<String>,
}

impl VariableDescriptor {
    pub fn scalar(name: impl Into<String>, value: Real, units: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: Value::Scalar(value),
            units: units.map(str::to_string),
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_metadata() {
        let spec = VariableSpec::output("data:weight:aircraft:MTOW")
            .units("kg")
            .default(70_000.0)
            .description("maximum take-off weight");
        assert!(spec.is_output());
        assert_eq!(spec.units.as_deref(), Some("kg"));
        assert_eq!(spec.default, Value::Scalar(70_000.0));
        assert_eq!(spec.shape_of(), Shape::Scalar);
    }

    #[test]
    fn shape_makes_unset_array() {
        let spec = VariableSpec::input("data:mission:segments").shape(4);
        assert_eq!(spec.shape_of(), Shape::Vector(4));
        assert!(spec.default.is_unset());
    }

    #[test]
    fn renamed_keeps_metadata() {
        let spec = VariableSpec::input("x").units("m").default(1.0);
        let alias = spec.renamed("data:x");
        assert_eq!(alias.name, "data:x");
        assert_eq!(alias.units, spec.units);
        assert_eq!(alias.default, spec.default);
    }
}
