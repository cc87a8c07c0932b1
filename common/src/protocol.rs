//! JSON bodies exchanged with the remote authority.

use serde::{Deserialize, Serialize};

use crate::{
    error::RemoteError,
    types::{Sample, ServerVerdict, ThresholdSet},
};

/// Body of `GET /api/climate-thresholds/room/{id}`. Every bound is optional;
/// unknown fields (ids, timestamps) are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ThresholdResponse {
    #[serde(default)]
    pub min_temperature: Option<f32>,
    #[serde(default)]
    pub max_temperature: Option<f32>,
    #[serde(default)]
    pub min_humidity: Option<f32>,
    #[serde(default)]
    pub max_humidity: Option<f32>,
}

impl ThresholdResponse {
    /// Overlay the fetched bounds on `current`, field by field.
    pub fn merge_into(&self, current: ThresholdSet) -> ThresholdSet {
        ThresholdSet {
            temp_min: self.min_temperature.unwrap_or(current.temp_min),
            temp_max: self.max_temperature.unwrap_or(current.temp_max),
            humidity_min: self.min_humidity.unwrap_or(current.humidity_min),
            humidity_max: self.max_humidity.unwrap_or(current.humidity_max),
        }
    }
}

/// Body of `POST /api/sensors/{id}/readings/process`. Absent channels are
/// omitted, never sent as null.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f32>,
}

impl From<&Sample> for ReadingPayload {
    fn from(sample: &Sample) -> Self {
        Self {
            temperature: sample.temperature,
            humidity: sample.humidity,
        }
    }
}

pub fn encode_reading(sample: &Sample) -> Result<Vec<u8>, RemoteError> {
    Ok(serde_json::to_vec(&ReadingPayload::from(sample))?)
}

pub fn decode_thresholds(body: &[u8]) -> Result<ThresholdResponse, RemoteError> {
    Ok(serde_json::from_slice(body)?)
}

pub fn decode_verdict(body: &[u8]) -> Result<ServerVerdict, RemoteError> {
    Ok(serde_json::from_slice(body)?)
}
