use log::{info, warn};

use crate::{
    ports::Indicator,
    types::{Sample, ThresholdSet},
};

/// Local anomaly policy: a present channel strictly outside its bounds.
/// Absent channels never contribute.
pub fn is_out_of_range(sample: &Sample, thresholds: &ThresholdSet) -> bool {
    let temp_out = sample
        .temperature
        .is_some_and(|t| t < thresholds.temp_min || t > thresholds.temp_max);
    let humidity_out = sample
        .humidity
        .is_some_and(|h| h < thresholds.humidity_min || h > thresholds.humidity_max);

    temp_out || humidity_out
}

/// Drives the alarm indicator from each sample.
pub struct AnomalyDetector<I> {
    indicator: I,
}

impl<I: Indicator> AnomalyDetector<I> {
    pub fn new(indicator: I) -> Self {
        Self { indicator }
    }

    /// Evaluates `sample` and writes the indicator. A failed read asserts the
    /// alarm regardless of bounds.
    pub fn check(&mut self, sample: &Sample, thresholds: &ThresholdSet) -> bool {
        let asserted = if sample.is_failed() {
            true
        } else {
            let out = is_out_of_range(sample, thresholds);
            if out {
                info!(
                    "local anomaly: temperature {:?} (bounds {:.1}..{:.1}), humidity {:?} (bounds {:.1}..{:.1})",
                    sample.temperature,
                    thresholds.temp_min,
                    thresholds.temp_max,
                    sample.humidity,
                    thresholds.humidity_min,
                    thresholds.humidity_max
                );
            }
            out
        };

        self.drive(asserted);
        asserted
    }

    pub fn drive(&mut self, on: bool) {
        if let Err(err) = self.indicator.set(on) {
            warn!("failed to drive alarm indicator {}: {err}", if on { "on" } else { "off" });
        }
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}
