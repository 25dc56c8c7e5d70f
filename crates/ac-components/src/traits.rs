//! Core traits for disciplines.

use crate::error::ComponentResult;
use crate::io::{Inputs, Outputs};
use crate::registry::{ServiceOptions, ServiceProperties};
use ac_graph::VariableSpec;

/// A disciplinary model: a set of declared inputs/outputs plus a pure compute
/// function.
///
/// Disciplines are immutable once constructed and shared between evaluation
/// contexts, so `compute` takes `&self` and implementations must be
/// `Send + Sync`.
pub trait Discipline: Send + Sync {
    /// Declared variables, using the discipline's own (local) names.
    ///
    /// Must return the same list on every call.
    fn declare(&self) -> Vec<VariableSpec>;

    /// Compute every declared output from the inputs.
    ///
    /// `inputs` holds every declared input in its declared units; `outputs` is
    /// seeded with every declared output.
    fn compute(&self, inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()>;
}

/// A discipline type that advertises itself as one implementation of a service.
///
/// Registered with [`ServiceRegistry::register_type`](crate::ServiceRegistry::register_type);
/// the type itself is the factory identity.
pub trait ServiceImpl: Discipline + Sized + 'static {
    const SERVICE_ID: &'static str;
    const IMPLEMENTATION_ID: &'static str;

    fn properties() -> ServiceProperties {
        ServiceProperties::default()
    }

    /// Build an instance from resolved options (schema defaults already merged).
    fn from_options(options: &ServiceOptions) -> ComponentResult<Self>;
}
