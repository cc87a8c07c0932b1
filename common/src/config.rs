use serde::{Deserialize, Serialize};

use crate::types::ThresholdSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub base_url: String,
    pub sensor_id: u32,
    pub room_id: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://climatemonitoring.redsky-323ad50b.northeurope.azurecontainerapps.io"
                .to_string(),
            sensor_id: 20,
            room_id: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub threshold_sync_interval_ms: u64,
    pub report_interval_ms: u64,
    pub tick_quantum_ms: u64,
    pub request_timeout_ms: u64,
    pub reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            threshold_sync_interval_ms: 10_000,
            report_interval_ms: 10_000,
            tick_quantum_ms: 100,
            request_timeout_ms: 5_000,
            reconnect_attempts: 20,
            reconnect_delay_ms: 500,
        }
    }
}

/// GPIO numbers of the board wiring. Fixed at build time, not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPins {
    pub dht: i32,
    pub alarm_led: i32,
    pub servo: i32,
}

pub const BOARD_PINS: BoardPins = BoardPins {
    dht: 15,
    alarm_led: 2,
    servo: 4,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: "Wokwi-GUEST".to_string(),
            wifi_pass: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub thresholds: ThresholdSet,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.timing.sanitize();
        self.node.base_url = self.node.base_url.trim().trim_end_matches('/').to_string();
        if self.node.base_url.is_empty() {
            self.node.base_url = NodeConfig::default().base_url;
        }
        if !self.thresholds.is_ordered() {
            self.thresholds = ThresholdSet::default();
        }
    }
}

impl TimingConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();

        if self.threshold_sync_interval_ms == 0 {
            self.threshold_sync_interval_ms = defaults.threshold_sync_interval_ms;
        }
        if self.report_interval_ms == 0 {
            self.report_interval_ms = defaults.report_interval_ms;
        }
        self.tick_quantum_ms = self.tick_quantum_ms.clamp(10, 1_000);
        self.request_timeout_ms = self.request_timeout_ms.clamp(500, 60_000);
        self.reconnect_attempts = self.reconnect_attempts.clamp(1, 100);
        self.reconnect_delay_ms = self.reconnect_delay_ms.clamp(50, 10_000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_restores_zero_intervals() {
        let mut config = RuntimeConfig::default();
        config.timing.report_interval_ms = 0;
        config.timing.threshold_sync_interval_ms = 0;
        config.timing.reconnect_attempts = 0;
        config.sanitize();

        assert_eq!(config.timing.report_interval_ms, 10_000);
        assert_eq!(config.timing.threshold_sync_interval_ms, 10_000);
        assert_eq!(config.timing.reconnect_attempts, 1);
    }

    #[test]
    fn sanitize_strips_trailing_slash() {
        let mut config = RuntimeConfig::default();
        config.node.base_url = " http://localhost:8000/ ".to_string();
        config.sanitize();

        assert_eq!(config.node.base_url, "http://localhost:8000");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"node":{"base_url":"http://x","sensor_id":3,"room_id":4}}"#)
                .unwrap();

        assert_eq!(config.node.sensor_id, 3);
        assert_eq!(config.timing.tick_quantum_ms, 100);
        assert_eq!(config.thresholds, ThresholdSet::default());
    }

    #[test]
    fn pin_section_is_not_part_of_runtime_config() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"pins":{"dht_pin":5,"alarm_led_pin":6,"servo_pin":7}}"#)
                .unwrap();
        let written = serde_json::to_value(&config).unwrap();

        assert!(written.get("pins").is_none());
        assert_eq!(BOARD_PINS.dht, 15);
        assert_eq!(BOARD_PINS.alarm_led, 2);
        assert_eq!(BOARD_PINS.servo, 4);
    }
}
