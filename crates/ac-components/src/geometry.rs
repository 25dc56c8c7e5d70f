//! Wing planform geometry from area, aspect ratio and taper.

use ac_graph::VariableSpec;

use crate::common::{check_positive, option_f64};
use crate::error::{ComponentError, ComponentResult};
use crate::io::{Inputs, Outputs};
use crate::registry::{ServiceOptions, ServiceProperties};
use crate::traits::{Discipline, ServiceImpl};

pub const WING_AREA: &str = "data:geometry:wing:area";
pub const ASPECT_RATIO: &str = "data:geometry:wing:aspect_ratio";
pub const SPAN: &str = "data:geometry:wing:span";
pub const MEAN_CHORD: &str = "data:geometry:wing:mean_chord";
pub const ROOT_CHORD: &str = "data:geometry:wing:root_chord";

/// Straight-tapered wing.
#[derive(Debug, Clone, PartialEq)]
pub struct WingGeometry {
    /// Tip chord over root chord (0, 1].
    pub taper_ratio: f64,
}

impl Discipline for WingGeometry {
    fn declare(&self) -> Vec<VariableSpec> {
        vec![
            VariableSpec::input(WING_AREA)
                .units("m**2")
                .description("wing reference area"),
            VariableSpec::input(ASPECT_RATIO)
                .default(9.5)
                .description("wing aspect ratio"),
            VariableSpec::output(SPAN).units("m").description("wing span"),
            VariableSpec::output(MEAN_CHORD)
                .units("m")
                .description("wing mean geometric chord"),
            VariableSpec::output(ROOT_CHORD)
                .units("m")
                .description("wing root chord"),
        ]
    }

    fn compute(&self, inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
        let area = check_positive(inputs.scalar(WING_AREA)?, "wing area")?;
        let ar = check_positive(inputs.scalar(ASPECT_RATIO)?, "aspect ratio")?;

        let span = (ar * area).sqrt();
        outputs.set(SPAN, span)?;
        outputs.set(MEAN_CHORD, area / span)?;
        outputs.set(ROOT_CHORD, 2.0 * area / (span * (1.0 + self.taper_ratio)))
    }
}

impl ServiceImpl for WingGeometry {
    const SERVICE_ID: &'static str = "geometry.wing";
    const IMPLEMENTATION_ID: &'static str = "tapered";

    fn properties() -> ServiceProperties {
        ServiceProperties::new()
            .domain("geometry")
            .description("straight-tapered wing planform")
            .default_impl()
            .option("taper_ratio", 0.3, "tip chord over root chord")
    }

    fn from_options(options: &ServiceOptions) -> ComponentResult<Self> {
        let taper_ratio = option_f64(options, "taper_ratio", 0.3)?;
        if !(taper_ratio > 0.0 && taper_ratio <= 1.0) {
            return Err(ComponentError::InvalidOption {
                key: "taper_ratio".into(),
                reason: "must be in (0, 1]",
            });
        }
        Ok(Self { taper_ratio })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_core::Value;
    use serde_json::json;

    #[test]
    fn rectangular_wing() {
        let wing = WingGeometry { taper_ratio: 1.0 };
        let inputs = Inputs::new().with(WING_AREA, 100.0).with(ASPECT_RATIO, 4.0);
        let mut outputs = Outputs::new();
        for name in [SPAN, MEAN_CHORD, ROOT_CHORD] {
            outputs.declare(name, Value::unset());
        }
        wing.compute(&inputs, &mut outputs).unwrap();
        assert_eq!(outputs.scalar(SPAN), Some(20.0));
        assert_eq!(outputs.scalar(MEAN_CHORD), Some(5.0));
        assert_eq!(outputs.scalar(ROOT_CHORD), Some(5.0));
    }

    #[test]
    fn negative_area_is_non_physical() {
        let wing = WingGeometry { taper_ratio: 0.3 };
        let inputs = Inputs::new().with(WING_AREA, -1.0).with(ASPECT_RATIO, 9.0);
        let mut outputs = Outputs::new();
        assert!(wing.compute(&inputs, &mut outputs).is_err());
    }

    #[test]
    fn taper_ratio_is_validated() {
        let mut options = ServiceOptions::new();
        options.insert("taper_ratio".into(), json!(1.5));
        assert!(WingGeometry::from_options(&options).is_err());
    }
}
