//! Maximum take-off weight from empty-weight fraction.

use ac_graph::VariableSpec;

use crate::common::{check_finite, check_positive, option_f64};
use crate::error::{ComponentError, ComponentResult};
use crate::geometry::{SPAN, WING_AREA};
use crate::io::{Inputs, Outputs};
use crate::registry::{ServiceOptions, ServiceProperties};
use crate::traits::{Discipline, ServiceImpl};

pub const PAYLOAD: &str = "data:weight:payload";
pub const FUEL: &str = "data:weight:fuel";
pub const ENGINE_MASS: &str = "data:weight:propulsion:mass";
pub const WING_MASS: &str = "data:weight:airframe:wing:mass";
pub const OWE: &str = "data:weight:aircraft:OWE";
pub const MTOW: &str = "data:weight:aircraft:MTOW";

/// `MTOW = (payload + fuel + wing + engines) / (1 - empty_fraction)`.
///
/// The wing mass scales with area times span; `empty_fraction` covers the
/// rest of the structure and systems as a share of MTOW.
#[derive(Debug, Clone, PartialEq)]
pub struct MtowFraction {
    pub empty_fraction: f64,
    /// kg per m^3 of (area * span).
    pub wing_mass_factor: f64,
}

impl Discipline for MtowFraction {
    fn declare(&self) -> Vec<VariableSpec> {
        vec![
            VariableSpec::input(PAYLOAD)
                .units("kg")
                .description("design payload"),
            VariableSpec::input(FUEL)
                .units("kg")
                .default(0.0)
                .description("mission fuel"),
            VariableSpec::input(ENGINE_MASS).units("kg").default(0.0),
            VariableSpec::input(WING_AREA).units("m**2"),
            VariableSpec::input(SPAN).units("m"),
            VariableSpec::output(WING_MASS).units("kg"),
            VariableSpec::output(OWE)
                .units("kg")
                .description("operating weight empty"),
            VariableSpec::output(MTOW)
                .units("kg")
                .description("maximum take-off weight"),
        ]
    }

    fn compute(&self, inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
        let payload = check_positive(inputs.scalar(PAYLOAD)?, "payload")?;
        let fuel = check_finite(inputs.scalar(FUEL)?, "fuel mass")?;
        let engines = check_finite(inputs.scalar(ENGINE_MASS)?, "engine mass")?;
        let area = check_positive(inputs.scalar(WING_AREA)?, "wing area")?;
        let span = check_positive(inputs.scalar(SPAN)?, "wing span")?;
        if fuel < 0.0 || engines < 0.0 {
            return Err(ComponentError::NonPhysical {
                what: "negative mass",
            });
        }

        let wing = self.wing_mass_factor * area * span / 30.0;
        let mtow = (payload + fuel + wing + engines) / (1.0 - self.empty_fraction);
        outputs.set(WING_MASS, wing)?;
        outputs.set(OWE, mtow - payload - fuel)?;
        outputs.set(MTOW, mtow)
    }
}

impl ServiceImpl for MtowFraction {
    const SERVICE_ID: &'static str = "weight.mtow";
    const IMPLEMENTATION_ID: &'static str = "fraction";

    fn properties() -> ServiceProperties {
        ServiceProperties::new()
            .domain("weight")
            .description("MTOW from an empty-weight fraction plus wing and engine masses")
            .option("empty_fraction", 0.45, "structure and systems share of MTOW")
            .option("wing_mass_factor", 25.0, "wing mass per area*span/30")
    }

    fn from_options(options: &ServiceOptions) -> ComponentResult<Self> {
        let empty_fraction = option_f64(options, "empty_fraction", 0.45)?;
        if !(0.0..1.0).contains(&empty_fraction) {
            return Err(ComponentError::InvalidOption {
                key: "empty_fraction".into(),
                reason: "must be in [0, 1)",
            });
        }
        Ok(Self {
            empty_fraction,
            wing_mass_factor: option_f64(options, "wing_mass_factor", 25.0)?,
        })
    }
}
