use core::convert::TryInto;
use std::time::Duration;

use anyhow::{anyhow, Context};
use dht_sensor::dht22;
use embedded_svc::{
    http::{client::Client as HttpClient, Method, Status},
    io::{Read, Write},
    wifi::{AuthMethod, ClientConfiguration, Configuration},
};
use esp_idf_hal::{
    delay::Ets,
    gpio::{AnyIOPin, AnyOutputPin, IOPin, InputOutput, Output, OutputPin, PinDriver, Pull},
    ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution},
    units::Hertz,
};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{modem::Modem, prelude::Peripherals},
    http::client::{Configuration as HttpClientConfiguration, EspHttpConnection},
    log::EspLogger,
    nvs::EspDefaultNvsPartition,
    wifi::EspWifi,
};
use log::{info, warn};

use climate_common::{
    config::NetworkConfig, Actuator, ClimateNode, ClimateSensor, HardwareError, HttpResponse,
    HttpTransport, Indicator, NodeParts, RemoteError, RuntimeConfig, WifiLink, BOARD_PINS,
    CONTENT_TYPE_JSON,
};

use crate::clock::SystemClock;

const MAX_HTTP_BODY: usize = 4096;

const SERVO_PERIOD_US: u64 = 20_000;
const SERVO_MIN_PULSE_US: u64 = 500;
const SERVO_MAX_PULSE_US: u64 = 2_500;

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let mut runtime = RuntimeConfig::default();
    apply_build_overrides(&mut runtime);
    runtime.sanitize();

    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let Peripherals {
        modem, pins, ledc, ..
    } = Peripherals::take()?;

    info!(
        "pins: DHT22 on GPIO{}, alarm LED on GPIO{}, servo on GPIO{}",
        BOARD_PINS.dht, BOARD_PINS.alarm_led, BOARD_PINS.servo
    );

    let sensor = Dht22Sensor::new(pins.gpio15.downgrade()).context("failed to init DHT22")?;
    let indicator = LedIndicator::new(pins.gpio2.downgrade_output())
        .context("failed to init alarm LED")?;

    let servo_timer = LedcTimerDriver::new(
        ledc.timer0,
        &TimerConfig {
            frequency: Hertz(50),
            resolution: Resolution::Bits14,
            ..Default::default()
        },
    )
    .context("failed to init servo timer")?;
    let servo_channel = LedcDriver::new(ledc.channel0, servo_timer, pins.gpio4)
        .context("failed to init servo channel")?;
    let actuator = ServoActuator::new(servo_channel)?;

    let link = StationLink::new(modem, sys_loop, nvs_partition, &runtime.network)
        .context("wifi startup failed")?;

    let mut node = ClimateNode::new(
        &runtime,
        NodeParts {
            sensor,
            actuator,
            indicator,
            link,
            transport: EspTransport,
            clock: SystemClock,
        },
    );

    node.start();
    node.run()
}

fn apply_build_overrides(runtime: &mut RuntimeConfig) {
    if let Some(ssid) = option_env!("WIFI_SSID") {
        runtime.network.wifi_ssid = ssid.to_string();
    }
    if let Some(pass) = option_env!("WIFI_PASS") {
        runtime.network.wifi_pass = pass.to_string();
    }
    if let Some(base_url) = option_env!("CLIMATE_BASE_URL") {
        runtime.node.base_url = base_url.to_string();
    }
}

/// DHT22 reports both channels in one transaction; humidity is held until
/// the paired `read_humidity` call.
struct Dht22Sensor {
    pin: PinDriver<'static, AnyIOPin, InputOutput>,
    delay: Ets,
    pending_humidity: Option<f32>,
}

impl Dht22Sensor {
    fn new(pin: AnyIOPin) -> anyhow::Result<Self> {
        let mut pin = PinDriver::input_output_od(pin)?;
        pin.set_pull(Pull::Up)?;
        pin.set_high()?;

        Ok(Self {
            pin,
            delay: Ets,
            pending_humidity: None,
        })
    }
}

impl ClimateSensor for Dht22Sensor {
    fn read_temperature(&mut self) -> Option<f32> {
        self.pending_humidity = None;

        if let Err(err) = self.pin.set_high() {
            warn!("failed to release DHT22 line before read: {err:?}");
            return None;
        }

        match dht22::blocking::read(&mut self.delay, &mut self.pin) {
            Ok(reading) => {
                info!(
                    "[DHT22] {:.1}°C {:.1}%",
                    reading.temperature, reading.relative_humidity
                );
                self.pending_humidity = Some(reading.relative_humidity);
                Some(reading.temperature)
            }
            Err(err) => {
                warn!("DHT22 read failed: {err:?}");
                None
            }
        }
    }

    fn read_humidity(&mut self) -> Option<f32> {
        self.pending_humidity.take()
    }
}

struct LedIndicator {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl LedIndicator {
    fn new(pin: AnyOutputPin) -> anyhow::Result<Self> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin })
    }
}

impl Indicator for LedIndicator {
    fn set(&mut self, on: bool) -> Result<(), HardwareError> {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|err| HardwareError::Indicator(format!("{err:?}")))
    }
}

/// Hobby servo on LEDC: 50 Hz, 0.5 ms pulse at 0°, 2.5 ms at 180°.
struct ServoActuator {
    channel: LedcDriver<'static>,
    max_duty: u64,
}

impl ServoActuator {
    fn new(mut channel: LedcDriver<'static>) -> anyhow::Result<Self> {
        let max_duty = channel.get_max_duty() as u64;
        channel.enable()?;
        Ok(Self { channel, max_duty })
    }

    fn duty_for(&self, degrees: u8) -> u32 {
        let degrees = u64::from(degrees.min(180));
        let pulse_us =
            SERVO_MIN_PULSE_US + (SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US) * degrees / 180;
        (self.max_duty * pulse_us / SERVO_PERIOD_US) as u32
    }
}

impl Actuator for ServoActuator {
    fn write_angle(&mut self, degrees: u8) -> Result<(), HardwareError> {
        let duty = self.duty_for(degrees);
        self.channel
            .set_duty(duty)
            .map_err(|err| HardwareError::Actuator(format!("{err:?}")))
    }
}

/// Station-mode WiFi; `begin` only issues the connect, association is polled.
struct StationLink {
    wifi: EspWifi<'static>,
    ssid: String,
}

impl StationLink {
    fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs_partition: EspDefaultNvsPartition,
        network: &NetworkConfig,
    ) -> anyhow::Result<Self> {
        let mut wifi = EspWifi::new(modem, sys_loop, Some(nvs_partition))?;

        let auth_method = if network.wifi_pass.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: network
                .wifi_ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("wifi ssid too long"))?,
            password: network
                .wifi_pass
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("wifi password too long"))?,
            auth_method,
            ..Default::default()
        }))?;
        wifi.start()?;

        Ok(Self {
            wifi,
            ssid: network.wifi_ssid.clone(),
        })
    }
}

impl WifiLink for StationLink {
    fn begin(&mut self) -> Result<(), HardwareError> {
        info!("wifi connecting to `{}`", self.ssid);
        let _ = self.wifi.disconnect();
        self.wifi
            .connect()
            .map_err(|err| HardwareError::Link(format!("{err:?}")))
    }

    fn is_associated(&mut self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }
}

/// One `EspHttpConnection` per request so each carries its own timeout.
struct EspTransport;

impl EspTransport {
    fn exchange(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
        timeout: Duration,
    ) -> anyhow::Result<HttpResponse> {
        let http_conf = HttpClientConfiguration {
            timeout: Some(timeout),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let mut client = HttpClient::wrap(EspHttpConnection::new(&http_conf)?);
        let mut request = client.request(method, url, headers)?;
        if !body.is_empty() {
            request.write_all(body).map_err(|e| anyhow!("{e:?}"))?;
            request.flush().map_err(|e| anyhow!("{e:?}"))?;
        }
        let mut response = request.submit().map_err(|e| anyhow!("{e:?}"))?;

        let status = response.status();
        let mut body = Vec::new();
        let mut chunk = [0_u8; 512];
        loop {
            let read = response.read(&mut chunk).map_err(|e| anyhow!("{e:?}"))?;
            if read == 0 {
                break;
            }
            if body.len() + read > MAX_HTTP_BODY {
                return Err(anyhow!("response body exceeds {MAX_HTTP_BODY} bytes"));
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Ok(HttpResponse { status, body })
    }
}

impl HttpTransport for EspTransport {
    fn get(&mut self, url: &str, timeout: Duration) -> Result<HttpResponse, RemoteError> {
        self.exchange(Method::Get, url, &[], &[], timeout)
            .map_err(|err| RemoteError::Transport(format!("{err:#}")))
    }

    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        timeout: Duration,
    ) -> Result<HttpResponse, RemoteError> {
        let content_length = body.len().to_string();
        let headers = [
            ("content-type", CONTENT_TYPE_JSON),
            ("content-length", content_length.as_str()),
        ];
        self.exchange(Method::Post, url, &headers, body, timeout)
            .map_err(|err| RemoteError::Transport(format!("{err:#}")))
    }
}
