//! Scalar test disciplines with configurable variable names.
//!
//! `Affine` (`math.linear` / `affine`) computes `y = gain * x + offset`;
//! `Quadratic` (`math.quadratic` / `parabola`) computes
//! `y = curvature * (x - center)^2 + offset`. Both are used to build coupled
//! loops and small optimization problems without any physics.

use ac_graph::VariableSpec;

use crate::common::{check_finite, option_f64, option_opt_f64, option_opt_str, option_str};
use crate::error::{ComponentError, ComponentResult};
use crate::io::{Inputs, Outputs};
use crate::registry::{ServiceOptions, ServiceProperties};
use crate::traits::{Discipline, ServiceImpl};

/// Names, units and default shared by the scalar test disciplines.
#[derive(Debug, Clone, PartialEq)]
struct Ports {
    input: String,
    output: String,
    units: Option<String>,
    initial: Option<f64>,
}

impl Ports {
    fn from_options(options: &ServiceOptions) -> ComponentResult<Self> {
        let ports = Self {
            input: option_str(options, "input", "x")?,
            output: option_str(options, "output", "y")?,
            units: option_opt_str(options, "units")?,
            initial: option_opt_f64(options, "initial")?,
        };
        if ports.input == ports.output {
            return Err(ComponentError::InvalidOption {
                key: "output".into(),
                reason: "must differ from input",
            });
        }
        Ok(ports)
    }

    fn declare(&self) -> Vec<VariableSpec> {
        let mut input = VariableSpec::input(&self.input);
        let mut output = VariableSpec::output(&self.output);
        if let Some(units) = &self.units {
            input = input.units(units);
            output = output.units(units);
        }
        if let Some(initial) = self.initial {
            input = input.default(initial);
        }
        vec![input, output]
    }
}

fn port_options(props: ServiceProperties) -> ServiceProperties {
    props
        .option("input", "x", "name of the input variable")
        .option("output", "y", "name of the output variable")
        .option("units", serde_json::Value::Null, "units of both variables")
        .option("initial", serde_json::Value::Null, "default of the input")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Affine {
    ports: Ports,
    pub gain: f64,
    pub offset: f64,
    /// Inputs below this value are rejected as non-physical.
    pub min_input: Option<f64>,
}

impl Discipline for Affine {
    fn declare(&self) -> Vec<VariableSpec> {
        self.ports.declare()
    }

    fn compute(&self, inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
        let x = check_finite(inputs.scalar(&self.ports.input)?, "affine input")?;
        if let Some(min) = self.min_input
            && x < min
        {
            return Err(ComponentError::NonPhysical {
                what: "affine input below allowed minimum",
            });
        }
        outputs.set(&self.ports.output, self.gain * x + self.offset)
    }
}

impl ServiceImpl for Affine {
    const SERVICE_ID: &'static str = "math.linear";
    const IMPLEMENTATION_ID: &'static str = "affine";

    fn properties() -> ServiceProperties {
        port_options(
            ServiceProperties::new()
                .domain("math")
                .description("y = gain * x + offset")
                .default_impl(),
        )
        .option("gain", 1.0, "slope")
        .option("offset", 0.0, "intercept")
        .option("min_input", serde_json::Value::Null, "smallest accepted input")
    }

    fn from_options(options: &ServiceOptions) -> ComponentResult<Self> {
        Ok(Self {
            ports: Ports::from_options(options)?,
            gain: option_f64(options, "gain", 1.0)?,
            offset: option_f64(options, "offset", 0.0)?,
            min_input: option_opt_f64(options, "min_input")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quadratic {
    ports: Ports,
    pub curvature: f64,
    pub center: f64,
    pub offset: f64,
}

impl Discipline for Quadratic {
    fn declare(&self) -> Vec<VariableSpec> {
        self.ports.declare()
    }

    fn compute(&self, inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
        let x = check_finite(inputs.scalar(&self.ports.input)?, "quadratic input")?;
        let d = x - self.center;
        outputs.set(&self.ports.output, self.curvature * d * d + self.offset)
    }
}

impl ServiceImpl for Quadratic {
    const SERVICE_ID: &'static str = "math.quadratic";
    const IMPLEMENTATION_ID: &'static str = "parabola";

    fn properties() -> ServiceProperties {
        port_options(
            ServiceProperties::new()
                .domain("math")
                .description("y = curvature * (x - center)^2 + offset"),
        )
        .option("curvature", 1.0, "second-order coefficient")
        .option("center", 0.0, "abscissa of the vertex")
        .option("offset", 0.0, "value at the vertex")
    }

    fn from_options(options: &ServiceOptions) -> ComponentResult<Self> {
        Ok(Self {
            ports: Ports::from_options(options)?,
            curvature: option_f64(options, "curvature", 1.0)?,
            center: option_f64(options, "center", 0.0)?,
            offset: option_f64(options, "offset", 0.0)?,
        })
    }
}
