use log::{info, warn};

use crate::{
    error::HardwareError,
    ports::Actuator,
    types::{ActuatorPosition, Sample, ThresholdSet},
};

/// Decision table: any channel below its minimum heats, otherwise any channel
/// above its maximum cools. Heat is checked first, so an inverted set that
/// satisfies both resolves to Heat.
pub fn decide(sample: &Sample, thresholds: &ThresholdSet) -> ActuatorPosition {
    let below = |value: Option<f32>, min: f32| value.is_some_and(|v| v < min);
    let above = |value: Option<f32>, max: f32| value.is_some_and(|v| v > max);

    if below(sample.temperature, thresholds.temp_min)
        || below(sample.humidity, thresholds.humidity_min)
    {
        ActuatorPosition::Heat
    } else if above(sample.temperature, thresholds.temp_max)
        || above(sample.humidity, thresholds.humidity_max)
    {
        ActuatorPosition::Cool
    } else {
        ActuatorPosition::Neutral
    }
}

pub struct ActuationController<A> {
    actuator: A,
}

impl<A: Actuator> ActuationController<A> {
    pub fn new(actuator: A) -> Self {
        Self { actuator }
    }

    pub fn actuate(
        &mut self,
        sample: &Sample,
        thresholds: &ThresholdSet,
    ) -> Result<ActuatorPosition, HardwareError> {
        let position = decide(sample, thresholds);
        self.command(position)?;
        Ok(position)
    }

    pub fn command(&mut self, position: ActuatorPosition) -> Result<(), HardwareError> {
        self.actuator.write_angle(position.angle()).inspect_err(|err| {
            warn!("actuator command {} failed: {err}", position.as_str());
        })?;
        info!("actuator -> {} ({}°)", position.as_str(), position.angle());
        Ok(())
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}
