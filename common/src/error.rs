use thiserror::Error;

/// Failure talking to the remote authority. Always absorbed by the caller.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("undecodable response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("inverted threshold range (temp {temp_min}..{temp_max}, humidity {humidity_min}..{humidity_max})")]
    InvalidThresholds {
        temp_min: f32,
        temp_max: f32,
        humidity_min: f32,
        humidity_max: f32,
    },
}

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("indicator write failed: {0}")]
    Indicator(String),
    #[error("actuator write failed: {0}")]
    Actuator(String),
    #[error("link error: {0}")]
    Link(String),
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("sensor read failed")]
    SensorFault,
    #[error("network unavailable")]
    NetworkUnavailable,
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("reconnect gave up after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },
}
