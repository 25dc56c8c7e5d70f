//! Parabolic drag polar.

use std::f64::consts::PI;

use ac_graph::VariableSpec;

use crate::common::{check_positive, option_f64};
use crate::error::ComponentResult;
use crate::geometry::ASPECT_RATIO;
use crate::io::{Inputs, Outputs};
use crate::registry::{ServiceOptions, ServiceProperties};
use crate::traits::{Discipline, ServiceImpl};

pub const CD0: &str = "data:aerodynamics:cd0";
pub const INDUCED_FACTOR: &str = "data:aerodynamics:induced_drag_factor";
pub const LIFT_TO_DRAG: &str = "data:aerodynamics:l_d";

/// `CD = CD0 + k CL^2` with `k = 1 / (pi e AR)`; reports the maximum L/D.
#[derive(Debug, Clone, PartialEq)]
pub struct ParabolicPolar {
    pub oswald: f64,
}

impl Discipline for ParabolicPolar {
    fn declare(&self) -> Vec<VariableSpec> {
        vec![
            VariableSpec::input(ASPECT_RATIO).default(9.5),
            VariableSpec::input(CD0)
                .default(0.022)
                .description("zero-lift drag coefficient"),
            VariableSpec::output(INDUCED_FACTOR).description("induced drag factor k"),
            VariableSpec::output(LIFT_TO_DRAG).description("maximum lift-to-drag ratio"),
        ]
    }

    fn compute(&self, inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
        let ar = check_positive(inputs.scalar(ASPECT_RATIO)?, "aspect ratio")?;
        let cd0 = check_positive(inputs.scalar(CD0)?, "zero-lift drag")?;

        let k = 1.0 / (PI * self.oswald * ar);
        outputs.set(INDUCED_FACTOR, k)?;
        outputs.set(LIFT_TO_DRAG, 0.5 / (cd0 * k).sqrt())
    }
}

impl ServiceImpl for ParabolicPolar {
    const SERVICE_ID: &'static str = "aerodynamics.polar";
    const IMPLEMENTATION_ID: &'static str = "parabolic";

    fn properties() -> ServiceProperties {
        ServiceProperties::new()
            .domain("aerodynamics")
            .description("parabolic drag polar")
            .option("oswald", 0.8, "span efficiency factor")
    }

    fn from_options(options: &ServiceOptions) -> ComponentResult<Self> {
        Ok(Self {
            oswald: check_positive(option_f64(options, "oswald", 0.8)?, "oswald factor")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_core::Value;

    #[test]
    fn lift_to_drag_grows_with_aspect_ratio() {
        let polar = ParabolicPolar { oswald: 0.8 };
        let ld = |ar: f64| {
            let inputs = Inputs::new().with(ASPECT_RATIO, ar).with(CD0, 0.02);
            let mut outputs = Outputs::new();
            outputs.declare(INDUCED_FACTOR, Value::unset());
            outputs.declare(LIFT_TO_DRAG, Value::unset());
            polar.compute(&inputs, &mut outputs).unwrap();
            outputs.scalar(LIFT_TO_DRAG).unwrap()
        };
        assert!(ld(12.0) > ld(8.0));
        // k = 1/(pi*0.8*10) ~ 0.0398, L/D = 0.5/sqrt(0.02*k) ~ 17.7
        assert!((ld(10.0) - 17.72).abs() < 0.01);
    }
}
