use serde::{Deserialize, Deserializer, Serialize};

/// One sensing cycle's reading. `None` marks a failed physical read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
}

impl Sample {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature: Some(temperature),
            humidity: Some(humidity),
        }
    }

    pub fn failed() -> Self {
        Self {
            temperature: None,
            humidity: None,
        }
    }

    /// A failed read carries no channels at all.
    pub fn is_failed(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub temp_min: f32,
    pub temp_max: f32,
    pub humidity_min: f32,
    pub humidity_max: f32,
}

impl ThresholdSet {
    pub const DEFAULT_TEMP_MIN: f32 = 18.0;
    pub const DEFAULT_TEMP_MAX: f32 = 26.0;
    pub const DEFAULT_HUMIDITY_MIN: f32 = 30.0;
    pub const DEFAULT_HUMIDITY_MAX: f32 = 70.0;

    pub fn is_ordered(&self) -> bool {
        self.temp_min <= self.temp_max && self.humidity_min <= self.humidity_max
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            temp_min: Self::DEFAULT_TEMP_MIN,
            temp_max: Self::DEFAULT_TEMP_MAX,
            humidity_min: Self::DEFAULT_HUMIDITY_MIN,
            humidity_max: Self::DEFAULT_HUMIDITY_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
        }
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorPosition {
    #[default]
    Neutral,
    Heat,
    Cool,
}

impl ActuatorPosition {
    pub fn angle(self) -> u8 {
        match self {
            Self::Neutral => 0,
            Self::Heat => 90,
            Self::Cool => 180,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "NEUTRAL",
            Self::Heat => "HEAT",
            Self::Cool => "COOL",
        }
    }
}

/// Remote authority's judgment on one submitted reading. Missing and null
/// fields both read as their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ServerVerdict {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_anomaly: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub commands_executed: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub alerts_created: i64,
    pub reading_id: Option<i64>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_angles_match_positions() {
        assert_eq!(ActuatorPosition::Neutral.angle(), 0);
        assert_eq!(ActuatorPosition::Heat.angle(), 90);
        assert_eq!(ActuatorPosition::Cool.angle(), 180);
    }

    #[test]
    fn only_empty_sample_is_failed() {
        let partial = Sample {
            temperature: Some(21.0),
            humidity: None,
        };
        assert!(!partial.is_failed());
        assert!(Sample::failed().is_failed());
        assert!(!Sample::new(21.0, 40.0).is_failed());
    }

    #[test]
    fn inverted_set_is_not_ordered() {
        let thresholds = ThresholdSet {
            temp_min: 30.0,
            ..ThresholdSet::default()
        };
        assert!(!thresholds.is_ordered());
        assert!(ThresholdSet::default().is_ordered());
    }
}
