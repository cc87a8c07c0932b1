use log::{debug, warn};

use crate::{ports::ClimateSensor, types::Sample};

/// Turns raw transducer reads into a [`Sample`]. A fault on either channel
/// fails the whole sample; retries are left to the scheduler.
pub struct SensorReader<S> {
    sensor: S,
}

impl<S: ClimateSensor> SensorReader<S> {
    pub fn new(sensor: S) -> Self {
        Self { sensor }
    }

    pub fn read(&mut self) -> Sample {
        let temperature = self.sensor.read_temperature().filter(|v| v.is_finite());
        let humidity = self.sensor.read_humidity().filter(|v| v.is_finite());

        match (temperature, humidity) {
            (Some(temperature), Some(humidity)) => {
                debug!("sensor read: {temperature:.1}°C, {humidity:.1}%");
                Sample::new(temperature, humidity)
            }
            _ => {
                warn!(
                    "sensor read failed (temperature ok: {}, humidity ok: {})",
                    temperature.is_some(),
                    humidity.is_some()
                );
                Sample::failed()
            }
        }
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}
