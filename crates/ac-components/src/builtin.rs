//! Built-in plugin registering the reference disciplines.

use crate::aerodynamics::ParabolicPolar;
use crate::error::RegistryResult;
use crate::geometry::WingGeometry;
use crate::math::{Affine, Quadratic};
use crate::mission::Breguet;
use crate::propulsion::{FixedSfcEngine, RubberEngine};
use crate::registry::{Plugin, PluginProvider, RegisterMode, ServiceRegistry};
use crate::weight::MtowFraction;

pub const BUILTIN_PLUGIN: &str = "aerocouple.builtin";

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPlugin;

impl Plugin for BuiltinPlugin {
    fn name(&self) -> &str {
        BUILTIN_PLUGIN
    }

    fn register(&self, registry: &mut ServiceRegistry) -> RegistryResult<()> {
        registry.register_type::<Affine>(RegisterMode::Strict)?;
        registry.register_type::<Quadratic>(RegisterMode::Strict)?;
        registry.register_type::<WingGeometry>(RegisterMode::Strict)?;
        registry.register_type::<ParabolicPolar>(RegisterMode::Strict)?;
        registry.register_type::<MtowFraction>(RegisterMode::Strict)?;
        registry.register_type::<RubberEngine>(RegisterMode::Strict)?;
        registry.register_type::<FixedSfcEngine>(RegisterMode::Strict)?;
        registry.register_type::<Breguet>(RegisterMode::Strict)?;
        Ok(())
    }
}

/// Provider yielding only [`BuiltinPlugin`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProvider;

impl PluginProvider for BuiltinProvider {
    fn plugins(&self) -> Vec<Box<dyn Plugin>> {
        vec![Box::new(BuiltinPlugin)]
    }
}
