//! Cruise fuel from the Breguet range equation.

use ac_graph::VariableSpec;

use crate::aerodynamics::LIFT_TO_DRAG;
use crate::common::{GRAVITY, check_positive, option_f64};
use crate::error::{ComponentError, ComponentResult};
use crate::io::{Inputs, Outputs};
use crate::propulsion::SFC;
use crate::registry::{ServiceOptions, ServiceProperties};
use crate::traits::{Discipline, ServiceImpl};
use crate::weight::{FUEL, MTOW};

pub const RANGE: &str = "data:mission:range";
pub const CRUISE_SPEED: &str = "data:mission:cruise_speed";

#[derive(Debug, Clone, PartialEq)]
pub struct Breguet {
    /// Extra fuel as a share of trip fuel.
    pub reserve_fraction: f64,
}

impl Discipline for Breguet {
    fn declare(&self) -> Vec<VariableSpec> {
        vec![
            VariableSpec::input(MTOW).units("kg"),
            VariableSpec::input(RANGE)
                .units("NM")
                .description("design range"),
            VariableSpec::input(CRUISE_SPEED)
                .units("kn")
                .default(450.0)
                .description("cruise true air speed"),
            VariableSpec::input(LIFT_TO_DRAG).default(16.0),
            VariableSpec::input(SFC).units("kg/N/s"),
            VariableSpec::output(FUEL).units("kg"),
        ]
    }

    fn compute(&self, inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
        let mtow = check_positive(inputs.scalar(MTOW)?, "MTOW")?;
        let range_nm = check_positive(inputs.scalar(RANGE)?, "range")?;
        let speed_kn = check_positive(inputs.scalar(CRUISE_SPEED)?, "cruise speed")?;
        let ld = check_positive(inputs.scalar(LIFT_TO_DRAG)?, "lift to drag")?;
        let sfc = check_positive(inputs.scalar(SFC)?, "sfc")?;

        // Formula in SI; the declared units are nautical miles and knots.
        let range = range_nm * 1852.0;
        let speed = speed_kn * 1852.0 / 3600.0;
        let trip_fraction = 1.0 - (-range * GRAVITY * sfc / (speed * ld)).exp();
        let fuel = mtow * trip_fraction * (1.0 + self.reserve_fraction);
        if fuel >= mtow {
            return Err(ComponentError::NonPhysical {
                what: "mission fuel exceeds MTOW",
            });
        }
        outputs.set(FUEL, fuel)
    }
}

impl ServiceImpl for Breguet {
    const SERVICE_ID: &'static str = "mission.breguet";
    const IMPLEMENTATION_ID: &'static str = "breguet";

    fn properties() -> ServiceProperties {
        ServiceProperties::new()
            .domain("mission")
            .description("cruise fuel from the Breguet range equation")
            .option("reserve_fraction", 0.05, "reserve fuel over trip fuel")
    }

    fn from_options(options: &ServiceOptions) -> ComponentResult<Self> {
        let reserve_fraction = option_f64(options, "reserve_fraction", 0.05)?;
        if reserve_fraction < 0.0 {
            return Err(ComponentError::InvalidOption {
                key: "reserve_fraction".into(),
                reason: "must be non-negative",
            });
        }
        Ok(Self { reserve_fraction })
    }
}
