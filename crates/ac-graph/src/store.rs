//! Flat variable metadata store.
//!
//! Holds name -> (value, units, description, declarers) for one assembled
//! system. Entries are kept in registration order and addressed either by
//! name or by a contiguous [`VarId`].
//!
//! Reconciliation rules when several components declare the same name:
//! - the output declaration (if any) fixes the canonical units, the default
//!   and the description;
//! - otherwise the first input fixes the units and the first default that is
//!   not entirely `NaN` wins (converted to the canonical units);
//! - the first non-empty description is kept;
//! - all declarations must agree on shape and have convertible units;
//! - a declaration without units takes whatever the others declare, and the
//!   first declared units become canonical.

use std::collections::HashMap;

use ac_core::{CompId, Shape, Unit, UnitConverter, UnitResult, Value, VarId, converter};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::variable::{VarRole, VariableDescriptor, VariableSpec};

/// A component declaring a variable, with the units it works in.
#[derive(Debug, Clone, PartialEq)]
pub struct Declarer {
    pub comp: CompId,
    pub component: String,
    pub units: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableEntry {
    pub id: VarId,
    pub name: String,
    /// Current value, in canonical units.
    pub value: Value,
    /// Reconciled declared default, in canonical units.
    pub default: Value,
    pub units: Option<String>,
    pub description: Option<String>,
    pub producer: Option<Declarer>,
    pub consumers: Vec<Declarer>,
}

impl VariableEntry {
    pub fn shape(&self) -> Shape {
        self.default.shape()
    }

    pub fn is_connected(&self) -> bool {
        self.producer.is_some()
    }

    /// Input that no component produces.
    pub fn is_unconnected_input(&self) -> bool {
        self.producer.is_none() && !self.consumers.is_empty()
    }

    pub fn descriptor(&self) -> VariableDescriptor {
        VariableDescriptor {
            name: self.name.clone(),
            value: self.value.clone(),
            units: self.units.clone(),
            description: self.description.clone(),
        }
    }

    fn default_descriptor(&self) -> VariableDescriptor {
        VariableDescriptor {
            value: self.default.clone(),
            ..self.descriptor()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    entries: Vec<VariableEntry>,
    by_name: HashMap<String, VarId>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register one declaration made by component `comp` (named `component`).
    pub fn register(
        &mut self,
        comp: CompId,
        component: &str,
        spec: &VariableSpec,
    ) -> GraphResult<VarId> {
        if let Some(units) = spec.units.as_deref() {
            Unit::parse(units).map_err(|source| GraphError::InvalidUnits {
                name: spec.name.clone(),
                component: component.to_string(),
                source,
            })?;
        }

        let declarer = Declarer {
            comp,
            component: component.to_string(),
            units: spec.units.clone(),
        };

        let existing = self.id(&spec.name);
        let Some(id) = existing else {
            let id = VarId::from_index(self.entries.len() as u32);
            let (producer, consumers) = match spec.role {
                VarRole::Output => (Some(declarer), Vec::new()),
                VarRole::Input => (None, vec![declarer]),
            };
            self.entries.push(VariableEntry {
                id,
                name: spec.name.clone(),
                value: spec.default.clone(),
                default: spec.default.clone(),
                units: spec.units.clone(),
                description: spec.description.clone(),
                producer,
                consumers,
            });
            self.by_name.insert(spec.name.clone(), id);
            return Ok(id);
        };

        let entry = &mut self.entries[id.slot()];
        if entry.shape() != spec.shape_of() {
            return Err(GraphError::ShapeConflict {
                name: spec.name.clone(),
                expected: entry.shape(),
                actual: spec.shape_of(),
            });
        }

        match spec.role {
            VarRole::Output => {
                if let Some(existing) = &entry.producer {
                    if existing.comp == comp {
                        return Ok(id);
                    }
                    return Err(GraphError::DuplicateOutput {
                        name: spec.name.clone(),
                        first: existing.component.clone(),
                        second: component.to_string(),
                    });
                }
                // The output takes over canonical units; consumer-side values are rescaled.
                let conv = declared_converter(entry.units.as_deref(), spec.units.as_deref())
                    .map_err(|_| {
                        GraphError::incompatible(
                            &spec.name,
                            entry.units.as_deref(),
                            spec.units.as_deref(),
                        )
                    })?;
                let default = if spec.default.is_unset() {
                    entry.default.map(|v| conv.apply(v))
                } else {
                    spec.default.clone()
                };
                entry.value = default.clone();
                entry.default = default;
                if spec.units.is_some() {
                    entry.units = spec.units.clone();
                } else if entry.units.is_some() {
                    debug!(name = %spec.name, component, "unitless output keeps consumer units");
                }
                if spec.description.is_some() {
                    entry.description = spec.description.clone();
                }
                entry.producer = Some(declarer);
            }
            VarRole::Input => {
                let conv = declared_converter(spec.units.as_deref(), entry.units.as_deref())
                    .map_err(|_| {
                        GraphError::incompatible(
                            &spec.name,
                            entry.units.as_deref(),
                            spec.units.as_deref(),
                        )
                    })?;
                if entry.producer.is_none()
                    && entry.default.is_unset()
                    && !spec.default.is_unset()
                {
                    let default = spec.default.map(|v| conv.apply(v));
                    entry.value = default.clone();
                    entry.default = default;
                }
                if entry.units.is_none() && spec.units.is_some() {
                    debug!(name = %spec.name, component, "units adopted from later declaration");
                    entry.units = spec.units.clone();
                }
                if entry.description.is_none() {
                    entry.description = spec.description.clone();
                }
                entry.consumers.push(declarer);
            }
        }
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> GraphResult<&VariableEntry> {
        self.id(name)
            .map(|id| &self.entries[id.slot()])
            .ok_or_else(|| GraphError::UnknownVariable {
                name: name.to_string(),
            })
    }

    pub fn entry(&self, id: VarId) -> &VariableEntry {
        &self.entries[id.slot()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableEntry> {
        self.entries.iter()
    }

    /// Current value in the canonical units.
    pub fn value(&self, id: VarId) -> &Value {
        &self.entries[id.slot()].value
    }

    /// Current value converted to `units` (`None` keeps canonical units).
    pub fn get_in(&self, name: &str, units: Option<&str>) -> GraphResult<Value> {
        let entry = self.get(name)?;
        let Some(requested) = units else {
            return Ok(entry.value.clone());
        };
        let conv = converter(entry.units.as_deref(), Some(requested))
            .map_err(|_| GraphError::incompatible(name, entry.units.as_deref(), Some(requested)))?;
        Ok(entry.value.map(|v| conv.apply(v)))
    }

    /// Value as seen by a consumer working in `units`.
    pub fn read_as(&self, id: VarId, units: Option<&str>) -> GraphResult<Value> {
        let entry = &self.entries[id.slot()];
        if units == entry.units.as_deref() {
            return Ok(entry.value.clone());
        }
        let conv = declared_converter(entry.units.as_deref(), units)
            .map_err(|_| GraphError::incompatible(&entry.name, entry.units.as_deref(), units))?;
        Ok(entry.value.map(|v| conv.apply(v)))
    }

    /// Overwrite a value, converting from `units` when given.
    pub fn set(&mut self, name: &str, value: Value, units: Option<&str>) -> GraphResult<()> {
        let id = self.id(name).ok_or_else(|| GraphError::UnknownVariable {
            name: name.to_string(),
        })?;
        let entry = &mut self.entries[id.slot()];
        if value.shape() != entry.shape() {
            return Err(GraphError::ShapeConflict {
                name: name.to_string(),
                expected: entry.shape(),
                actual: value.shape(),
            });
        }
        let value = match units {
            Some(requested) if Some(requested) != entry.units.as_deref() => {
                let conv = converter(Some(requested), entry.units.as_deref()).map_err(|_| {
                    GraphError::incompatible(name, entry.units.as_deref(), Some(requested))
                })?;
                value.map(|v| conv.apply(v))
            }
            _ => value,
        };
        entry.value = value;
        Ok(())
    }

    /// Write a value already expressed in the canonical units (solver path).
    pub fn write(&mut self, id: VarId, value: Value) -> GraphResult<()> {
        let entry = &mut self.entries[id.slot()];
        if value.shape() != entry.shape() {
            return Err(GraphError::ShapeConflict {
                name: entry.name.clone(),
                expected: entry.shape(),
                actual: value.shape(),
            });
        }
        entry.value = value;
        Ok(())
    }

    /// Write a value expressed in the producer's units.
    pub fn write_from(&mut self, id: VarId, value: Value, units: Option<&str>) -> GraphResult<()> {
        let entry = &self.entries[id.slot()];
        if units == entry.units.as_deref() {
            return self.write(id, value);
        }
        let conv = declared_converter(units, entry.units.as_deref())
            .map_err(|_| GraphError::incompatible(&entry.name, entry.units.as_deref(), units))?;
        self.write(id, value.map(|v| conv.apply(v)))
    }

    /// Descriptors (with declared defaults) of unconnected inputs, split by
    /// whether a usable default exists.
    pub(crate) fn unconnected(&self) -> (Vec<VariableDescriptor>, Vec<VariableDescriptor>) {
        let mut mandatory = Vec::new();
        let mut optional = Vec::new();
        for entry in self.entries.iter().filter(|e| e.is_unconnected_input()) {
            if entry.default.is_unset() {
                mandatory.push(entry.default_descriptor());
            } else {
                optional.push(entry.default_descriptor());
            }
        }
        (mandatory, optional)
    }

    /// Names of unconnected inputs whose current value is still entirely unset.
    pub fn missing_inputs(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_unconnected_input() && e.value.is_unset())
            .map(|e| e.name.clone())
            .collect()
    }
}

/// Converter between a declaration's units and the canonical ones; `None` on
/// one side only means "not stated" and passes values through.
fn declared_converter(from: Option<&str>, to: Option<&str>) -> UnitResult<UnitConverter> {
    match (from, to) {
        (Some(_), None) | (None, Some(_)) => Ok(UnitConverter::IDENTITY),
        _ => converter(from, to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(i: u32) -> CompId {
        CompId::from_index(i)
    }

    #[test]
    fn register_and_get() {
        let mut store = VariableStore::new();
        let id = store
            .register(
                comp(0),
                "geometry",
                &VariableSpec::output("data:geometry:wing:span")
                    .units("m")
                    .default(30.0),
            )
            .unwrap();
        let entry = store.get("data:geometry:wing:span").unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.value, Value::Scalar(30.0));
        assert!(entry.is_connected());
    }

    #[test]
    fn unknown_variable() {
        let store = VariableStore::new();
        assert!(matches!(
            store.get("nope"),
            Err(GraphError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn duplicate_output_is_rejected() {
        let mut store = VariableStore::new();
        store
            .register(comp(0), "a", &VariableSpec::output("x"))
            .unwrap();
        let err = store
            .register(comp(1), "b", &VariableSpec::output("x"))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateOutput {
                name: "x".into(),
                first: "a".into(),
                second: "b".into(),
            }
        );
    }

    #[test]
    fn output_after_input_takes_over_units() {
        let mut store = VariableStore::new();
        store
            .register(
                comp(0),
                "consumer",
                &VariableSpec::input("len").units("ft").default(10.0),
            )
            .unwrap();
        store
            .register(comp(1), "producer", &VariableSpec::output("len").units("m"))
            .unwrap();
        let entry = store.get("len").unwrap();
        assert_eq!(entry.units.as_deref(), Some("m"));
        assert!((entry.value.as_scalar().unwrap() - 3.048).abs() < 1e-12);

        // The consumer still reads feet.
        let seen = store.read_as(entry.id, Some("ft")).unwrap();
        assert!((seen.as_scalar().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn first_usable_input_default_wins() {
        let mut store = VariableStore::new();
        store
            .register(comp(0), "a", &VariableSpec::input("y").units("m"))
            .unwrap();
        store
            .register(
                comp(1),
                "b",
                &VariableSpec::input("y").units("km").default(2.0),
            )
            .unwrap();
        store
            .register(comp(2), "c", &VariableSpec::input("y").units("m").default(5.0))
            .unwrap();
        let entry = store.get("y").unwrap();
        assert_eq!(entry.default, Value::Scalar(2000.0));
        assert_eq!(entry.consumers.len(), 3);
    }

    #[test]
    fn incompatible_declarations() {
        let mut store = VariableStore::new();
        store
            .register(comp(0), "a", &VariableSpec::input("m").units("kg"))
            .unwrap();
        let err = store
            .register(comp(1), "b", &VariableSpec::input("m").units("s"))
            .unwrap_err();
        assert!(matches!(err, GraphError::IncompatibleUnits { .. }));
    }

    #[test]
    fn unitless_consumer_connects_to_producer_with_units() {
        let mut store = VariableStore::new();
        store
            .register(comp(0), "a", &VariableSpec::output("x").units("kg").default(5.0))
            .unwrap();
        let id = store.register(comp(1), "b", &VariableSpec::input("x")).unwrap();
        let entry = store.entry(id);
        assert_eq!(entry.units.as_deref(), Some("kg"));
        assert_eq!(store.read_as(id, None).unwrap(), Value::Scalar(5.0));

        store.write_from(id, Value::Scalar(7.0), None).unwrap();
        let grams = store.get_in("x", Some("g")).unwrap().as_scalar().unwrap();
        assert!((grams - 7000.0).abs() < 1e-9);
    }

    #[test]
    fn units_stated_later_become_canonical() {
        let mut store = VariableStore::new();
        store
            .register(comp(0), "a", &VariableSpec::input("y").default(2.0))
            .unwrap();
        store
            .register(comp(1), "b", &VariableSpec::input("y").units("m"))
            .unwrap();
        store.register(comp(2), "c", &VariableSpec::output("y")).unwrap();
        let entry = store.get("y").unwrap();
        assert_eq!(entry.units.as_deref(), Some("m"));
        assert_eq!(entry.default, Value::Scalar(2.0));
        assert!(entry.is_connected());
    }

    #[test]
    fn known_units_still_need_matching_dimensions() {
        let mut store = VariableStore::new();
        store
            .register(comp(0), "a", &VariableSpec::output("x").units("kg"))
            .unwrap();
        store.register(comp(1), "b", &VariableSpec::input("x")).unwrap();
        let err = store
            .register(comp(2), "c", &VariableSpec::input("x").units("s"))
            .unwrap_err();
        assert!(matches!(err, GraphError::IncompatibleUnits { .. }));
    }

    #[test]
    fn invalid_units_are_rejected() {
        let mut store = VariableStore::new();
        let err = store
            .register(comp(0), "a", &VariableSpec::input("x").units("parsec"))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidUnits { .. }));
    }

    #[test]
    fn shape_conflict() {
        let mut store = VariableStore::new();
        store
            .register(comp(0), "a", &VariableSpec::input("v").shape(3))
            .unwrap();
        let err = store
            .register(comp(1), "b", &VariableSpec::output("v"))
            .unwrap_err();
        assert!(matches!(err, GraphError::ShapeConflict { .. }));
    }

    #[test]
    fn set_converts_units() {
        let mut store = VariableStore::new();
        store
            .register(comp(0), "a", &VariableSpec::input("area").units("m**2"))
            .unwrap();
        store
            .set("area", Value::Scalar(1.0), Some("ft**2"))
            .unwrap();
        let v = store.get("area").unwrap().value.as_scalar().unwrap();
        assert!((v - 0.09290304).abs() < 1e-12);

        let in_ft2 = store.get_in("area", Some("ft**2")).unwrap();
        assert!((in_ft2.as_scalar().unwrap() - 1.0).abs() < 1e-12);

        let err = store.set("area", Value::Scalar(1.0), Some("kg")).unwrap_err();
        assert!(matches!(err, GraphError::IncompatibleUnits { .. }));

        let err = store
            .set("area", Value::from([1.0, 2.0]), None)
            .unwrap_err();
        assert!(matches!(err, GraphError::ShapeConflict { .. }));
    }

    #[test]
    fn missing_inputs_tracks_current_values() {
        let mut store = VariableStore::new();
        store
            .register(comp(0), "a", &VariableSpec::input("x"))
            .unwrap();
        store
            .register(comp(0), "a", &VariableSpec::input("y").default(0.0))
            .unwrap();
        assert_eq!(store.missing_inputs(), vec!["x".to_string()]);
        store.set("x", Value::Scalar(1.0), None).unwrap();
        assert!(store.missing_inputs().is_empty());
    }
}
