//! Hardware and transport seams.
//!
//! The node core only talks to the outside world through these traits. The
//! `climate-sensor` binary provides ESP-IDF and desktop implementations; unit
//! tests use recording mocks.

use std::time::Duration;

use crate::error::{HardwareError, RemoteError};

/// Monotonic millisecond counter plus the blocking delay used between ticks
/// and reconnect polls.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&mut self, ms: u64);
}

/// Temperature/humidity transducer. `None` (or NaN) signals a failed read.
pub trait ClimateSensor {
    fn read_temperature(&mut self) -> Option<f32>;
    fn read_humidity(&mut self) -> Option<f32>;
}

/// Binary alarm output.
pub trait Indicator {
    fn set(&mut self, on: bool) -> Result<(), HardwareError>;
}

/// Positional actuator accepting an angle in `0..=180`.
pub trait Actuator {
    fn write_angle(&mut self, degrees: u8) -> Result<(), HardwareError>;
}

/// Network association driver.
pub trait WifiLink {
    /// Kick off association without waiting for it to complete.
    fn begin(&mut self) -> Result<(), HardwareError>;
    fn is_associated(&mut self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Blocking request/response client for the remote authority.
pub trait HttpTransport {
    fn get(&mut self, url: &str, timeout: Duration) -> Result<HttpResponse, RemoteError>;

    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        timeout: Duration,
    ) -> Result<HttpResponse, RemoteError>;
}
