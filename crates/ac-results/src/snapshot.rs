//! Variable snapshot files.
//!
//! A snapshot is a flat list of `(name, value, units, description)` records
//! stored as YAML or JSON (chosen by extension):
//!
//! ```yaml
//! variables:
//!   - name: "data:geometry:wing:area"
//!     value: 124.6
//!     units: m**2
//! ```
//!
//! Unset (`NaN`) elements are written as `null`.

use std::collections::HashSet;
use std::path::Path;

use ac_core::Value;
use ac_graph::VariableDescriptor;
use ac_project::FileFormat;
use serde::{Deserialize, Serialize};

use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableRecord {
    pub name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VariableRecord {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            units: None,
            description: None,
        }
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

impl From<&VariableDescriptor> for VariableRecord {
    fn from(d: &VariableDescriptor) -> Self {
        Self {
            name: d.name.clone(),
            value: d.value.clone(),
            units: d.units.clone(),
            description: d.description.clone(),
        }
    }
}

impl From<VariableRecord> for VariableDescriptor {
    fn from(r: VariableRecord) -> Self {
        Self {
            name: r.name,
            value: r.value,
            units: r.units,
            description: r.description,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub variables: Vec<VariableRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records; names must be unique.
    pub fn from_records(variables: Vec<VariableRecord>) -> ResultsResult<Self> {
        let snapshot = Self { variables };
        snapshot.check_unique()?;
        Ok(snapshot)
    }

    fn check_unique(&self) -> ResultsResult<()> {
        let mut seen = HashSet::new();
        for record in &self.variables {
            if !seen.insert(record.name.as_str()) {
                return Err(ResultsError::DuplicateVariable {
                    name: record.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Insert a record, replacing any record with the same name in place.
    pub fn upsert(&mut self, record: VariableRecord) {
        match self.variables.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => self.variables.push(record),
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableRecord> {
        self.variables.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|r| r.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariableRecord> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn from_yaml_str(content: &str) -> ResultsResult<Self> {
        let snapshot: Snapshot = serde_yaml::from_str(content)?;
        snapshot.check_unique()?;
        Ok(snapshot)
    }

    pub fn from_json_str(content: &str) -> ResultsResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        snapshot.check_unique()?;
        Ok(snapshot)
    }

    pub fn to_yaml_string(&self) -> ResultsResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string(&self) -> ResultsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read(path: &Path) -> ResultsResult<Self> {
        let format = FileFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let snapshot = match format {
            FileFormat::Yaml => Self::from_yaml_str(&content)?,
            FileFormat::Json => Self::from_json_str(&content)?,
        };
        tracing::debug!(path = %path.display(), variables = snapshot.len(), "snapshot read");
        Ok(snapshot)
    }

    pub fn write(&self, path: &Path) -> ResultsResult<()> {
        let content = match FileFormat::from_path(path)? {
            FileFormat::Yaml => self.to_yaml_string()?,
            FileFormat::Json => self.to_json_string()?,
        };
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, content)?;
        tracing::debug!(path = %path.display(), variables = self.len(), "snapshot written");
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a VariableRecord;
    type IntoIter = std::slice::Iter<'a, VariableRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}
