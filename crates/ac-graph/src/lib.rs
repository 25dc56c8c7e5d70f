//! ac-graph: variable store and connection resolver for aerocouple.
//!
//! Provides:
//! - Variable declarations (`VariableSpec`) and reported descriptors
//! - The flat variable metadata store with multi-declaration reconciliation
//! - Connection resolution: producers, unconnected inputs, dependency cycles
//!
//! # Example
//!
//! ```
//! use ac_graph::{ConnectionBuilder, VariableSpec};
//!
//! let mut builder = ConnectionBuilder::new();
//! builder.add_component("geometry", vec![
//!     VariableSpec::input("data:geometry:wing:area").units("m**2"),
//!     VariableSpec::output("data:geometry:wing:span").units("m"),
//! ]);
//! builder.add_component("weight", vec![
//!     VariableSpec::input("data:geometry:wing:span").units("ft"),
//! ]);
//! let graph = builder.build().unwrap();
//!
//! let report = graph.unconnected();
//! assert_eq!(report.mandatory.len(), 1);
//! assert_eq!(report.mandatory[0].name, "data:geometry:wing:area");
//! assert!(graph.cycles().is_empty());
//! ```

pub mod builder;
pub mod connect;
pub mod error;
pub mod store;
pub mod variable;

// Re-exports for ergonomics
pub use builder::{ComponentIo, ConnectionBuilder};
pub use connect::{Binding, ConnectionGraph, UnconnectedReport};
pub use error::{GraphError, GraphResult};
pub use store::{Declarer, VariableEntry, VariableStore};
pub use variable::{VarRole, VariableDescriptor, VariableSpec};
