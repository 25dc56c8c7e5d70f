//! ac-components: disciplines and the service registry for aerocouple.
//!
//! Provides:
//! - The `Discipline` trait (declared inputs/outputs plus a pure compute function)
//! - Named input/output views passed to `compute`
//! - The `ServiceRegistry`: implementations of a service resolved by name,
//!   with lazy, fault-isolated plugin discovery
//! - Reference disciplines (simple closed-form formulas) and the built-in plugin
//!
//! # Example
//!
//! ```
//! use ac_components::{Inputs, Outputs, ServiceRegistry};
//! use ac_core::Value;
//!
//! let mut registry = ServiceRegistry::with_builtins();
//! let wing = registry.resolve("geometry.wing", None, None).unwrap();
//!
//! let inputs = Inputs::new()
//!     .with("data:geometry:wing:area", 100.0)
//!     .with("data:geometry:wing:aspect_ratio", 9.0);
//! let mut outputs = Outputs::new();
//! for spec in wing.discipline.declare().into_iter().filter(|v| v.is_output()) {
//!     outputs.declare(spec.name, Value::unset());
//! }
//! wing.discipline.compute(&inputs, &mut outputs).unwrap();
//! assert_eq!(outputs.scalar("data:geometry:wing:span"), Some(30.0));
//! ```

pub mod aerodynamics;
pub mod builtin;
pub mod common;
pub mod error;
pub mod geometry;
pub mod io;
pub mod math;
pub mod mission;
pub mod propulsion;
pub mod registry;
pub mod traits;
pub mod weight;

// Re-exports
pub use aerodynamics::ParabolicPolar;
pub use builtin::{BUILTIN_PLUGIN, BuiltinPlugin, BuiltinProvider};
pub use error::{ComponentError, ComponentResult, RegistryError, RegistryResult};
pub use geometry::WingGeometry;
pub use io::{Inputs, Outputs};
pub use math::{Affine, Quadratic};
pub use mission::Breguet;
pub use propulsion::{FixedSfcEngine, RubberEngine};
pub use registry::{
    DisciplineFactory, OptionSpec, Plugin, PluginProvider, RegisterMode, ResolvedService,
    ServiceDescriptor, ServiceFilter, ServiceOptions, ServiceProperties, ServiceRegistry,
    Unavailable, global_registry, global_registry_mut, global_registry_ref,
    reset_global_registry,
};
pub use traits::{Discipline, ServiceImpl};
