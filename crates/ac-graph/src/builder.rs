//! Incremental connection-graph builder.

use ac_core::CompId;

use crate::connect::ConnectionGraph;
use crate::error::GraphResult;
use crate::variable::VariableSpec;

/// Declared I/O of one component, with names already resolved to the global
/// namespace (promotion and aliasing applied).
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentIo {
    pub id: CompId,
    pub name: String,
    pub variables: Vec<VariableSpec>,
}

impl ComponentIo {
    pub fn inputs(&self) -> impl Iterator<Item = &VariableSpec> {
        self.variables.iter().filter(|v| v.is_input())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &VariableSpec> {
        self.variables.iter().filter(|v| v.is_output())
    }
}

/// Builder for constructing a connection graph incrementally.
///
/// Use `add_component` for every leaf, in evaluation order, then call
/// `build()` to register all declarations and freeze the graph.
#[derive(Debug, Default)]
pub struct ConnectionBuilder {
    components: Vec<ComponentIo>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component with its declared variables and return its ID.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        variables: Vec<VariableSpec>,
    ) -> CompId {
        let id = CompId::from_index(self.components.len() as u32);
        self.components.push(ComponentIo {
            id,
            name: name.into(),
            variables,
        });
        id
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Register every declaration and build the dependency graph.
    ///
    /// Fails on duplicate outputs, unknown or incompatible units and shape conflicts.
    pub fn build(self) -> GraphResult<ConnectionGraph> {
        ConnectionGraph::from_components(self.components)
    }
}
