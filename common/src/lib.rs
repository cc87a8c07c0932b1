pub mod actuation;
pub mod anomaly;
pub mod config;
pub mod connectivity;
pub mod endpoints;
pub mod error;
pub mod node;
pub mod ports;
pub mod protocol;
pub mod reporting;
pub mod scheduler;
pub mod sensor;
pub mod thresholds;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use config::{BoardPins, NetworkConfig, NodeConfig, RuntimeConfig, TimingConfig, BOARD_PINS};
pub use endpoints::*;
pub use error::{HardwareError, NodeError, RemoteError};
pub use node::{ClimateNode, CycleOutcome, DeviceState, NodeParts, NodeStats};
pub use ports::{Actuator, ClimateSensor, Clock, HttpResponse, HttpTransport, Indicator, WifiLink};
pub use types::{ActuatorPosition, ConnectionState, Sample, ServerVerdict, ThresholdSet};
