//! Engine models: a thrust-scaled rubber engine and a fixed engine.

use ac_graph::VariableSpec;

use crate::common::{GRAVITY, check_positive, option_f64};
use crate::error::ComponentResult;
use crate::io::{Inputs, Outputs};
use crate::registry::{ServiceOptions, ServiceProperties};
use crate::traits::{Discipline, ServiceImpl};
use crate::weight::{ENGINE_MASS, MTOW};

pub const THRUST: &str = "data:propulsion:thrust";
pub const SFC: &str = "data:propulsion:sfc";

fn engine_outputs() -> [VariableSpec; 3] {
    [
        VariableSpec::output(THRUST)
            .units("N")
            .description("total take-off thrust"),
        VariableSpec::output(SFC)
            .units("kg/N/s")
            .description("cruise specific fuel consumption"),
        VariableSpec::output(ENGINE_MASS).units("kg"),
    ]
}

fn set_engine(
    outputs: &mut Outputs,
    thrust: f64,
    sfc: f64,
    engine_twr: f64,
) -> ComponentResult<()> {
    outputs.set(THRUST, thrust)?;
    outputs.set(SFC, sfc)?;
    outputs.set(ENGINE_MASS, thrust / (GRAVITY * engine_twr))
}

/// Thrust sized from MTOW with a fixed thrust-to-weight ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct RubberEngine {
    pub thrust_to_weight: f64,
    pub sfc: f64,
    /// Engine thrust over engine weight.
    pub engine_twr: f64,
}

impl Discipline for RubberEngine {
    fn declare(&self) -> Vec<VariableSpec> {
        let mut vars = vec![VariableSpec::input(MTOW).units("kg")];
        vars.extend(engine_outputs());
        vars
    }

    fn compute(&self, inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
        let mtow = check_positive(inputs.scalar(MTOW)?, "MTOW")?;
        let thrust = self.thrust_to_weight * mtow * GRAVITY;
        set_engine(outputs, thrust, self.sfc, self.engine_twr)
    }
}

impl ServiceImpl for RubberEngine {
    const SERVICE_ID: &'static str = "propulsion.engine";
    const IMPLEMENTATION_ID: &'static str = "rubber_engine";

    fn properties() -> ServiceProperties {
        ServiceProperties::new()
            .domain("propulsion")
            .description("engine scaled with MTOW")
            .default_impl()
            .tag("sizing", "scaled")
            .option("thrust_to_weight", 0.3, "aircraft thrust-to-weight ratio")
            .option("sfc", 1.6e-5, "specific fuel consumption, kg/N/s")
            .option("engine_twr", 5.0, "engine thrust-to-weight ratio")
    }

    fn from_options(options: &ServiceOptions) -> ComponentResult<Self> {
        Ok(Self {
            thrust_to_weight: check_positive(
                option_f64(options, "thrust_to_weight", 0.3)?,
                "thrust to weight",
            )?,
            sfc: check_positive(option_f64(options, "sfc", 1.6e-5)?, "sfc")?,
            engine_twr: check_positive(option_f64(options, "engine_twr", 5.0)?, "engine twr")?,
        })
    }
}

/// Engine with fixed thrust and consumption.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSfcEngine {
    pub thrust: f64,
    pub sfc: f64,
    pub engine_twr: f64,
}

impl Discipline for FixedSfcEngine {
    fn declare(&self) -> Vec<VariableSpec> {
        engine_outputs().into()
    }

    fn compute(&self, _inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
        set_engine(outputs, self.thrust, self.sfc, self.engine_twr)
    }
}

impl ServiceImpl for FixedSfcEngine {
    const SERVICE_ID: &'static str = "propulsion.engine";
    const IMPLEMENTATION_ID: &'static str = "fixed_sfc";

    fn properties() -> ServiceProperties {
        ServiceProperties::new()
            .domain("propulsion")
            .description("engine with fixed thrust and sfc")
            .tag("sizing", "fixed")
            .option("thrust", 240_000.0, "total thrust, N")
            .option("sfc", 1.7e-5, "specific fuel consumption, kg/N/s")
            .option("engine_twr", 5.0, "engine thrust-to-weight ratio")
    }

    fn from_options(options: &ServiceOptions) -> ComponentResult<Self> {
        Ok(Self {
            thrust: check_positive(option_f64(options, "thrust", 240_000.0)?, "thrust")?,
            sfc: check_positive(option_f64(options, "sfc", 1.7e-5)?, "sfc")?,
            engine_twr: check_positive(option_f64(options, "engine_twr", 5.0)?, "engine twr")?,
        })
    }
}
