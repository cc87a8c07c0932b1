use std::{
    io::ErrorKind,
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    path::Path,
    time::{Duration, Instant},
};

use anyhow::Context;
use reqwest::{blocking::Client, header::CONTENT_TYPE, Url};
use tracing::{info, warn};

use climate_common::{
    Actuator, ClimateNode, ClimateSensor, HardwareError, HttpResponse, HttpTransport, Indicator,
    NodeParts, RemoteError, RuntimeConfig, WifiLink, CONTENT_TYPE_JSON,
};

use crate::clock::SystemClock;

const LINK_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const LINK_RECHECK_INTERVAL: Duration = Duration::from_secs(30);

pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut runtime = match std::env::var("CLIMATE_CONFIG") {
        Ok(path) => load_runtime_config(Path::new(&path))
            .with_context(|| format!("failed to load runtime config from {path}"))?,
        Err(_) => RuntimeConfig::default(),
    };
    apply_env_overrides(&mut runtime);
    runtime.sanitize();

    info!(
        "simulated climate node: sensor {} in room {} -> {}",
        runtime.node.sensor_id, runtime.node.room_id, runtime.node.base_url
    );

    let transport = ReqwestTransport::new().context("failed to build http client")?;
    let link = ProbeLink::new(&runtime.node.base_url, LINK_RECHECK_INTERVAL)?;

    let mut node = ClimateNode::new(
        &runtime,
        NodeParts {
            sensor: SimulatedSensor::default(),
            actuator: LogActuator::default(),
            indicator: LogIndicator::default(),
            link,
            transport,
            clock: SystemClock,
        },
    );

    node.start();
    node.run()
}

fn load_runtime_config(path: &Path) -> anyhow::Result<RuntimeConfig> {
    match std::fs::read(path) {
        Ok(raw) => Ok(serde_json::from_slice::<RuntimeConfig>(&raw)?),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("{} not found; using defaults", path.display());
            Ok(RuntimeConfig::default())
        }
        Err(err) => Err(err.into()),
    }
}

fn apply_env_overrides(runtime: &mut RuntimeConfig) {
    if let Ok(base_url) = std::env::var("CLIMATE_BASE_URL") {
        runtime.node.base_url = base_url;
    }
    if let Some(sensor_id) = std::env::var("CLIMATE_SENSOR_ID")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
    {
        runtime.node.sensor_id = sensor_id;
    }
    if let Some(room_id) = std::env::var("CLIMATE_ROOM_ID")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
    {
        runtime.node.room_id = room_id;
    }
}

/// Blocking HTTP client; the node loop is single-threaded.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("climate-sensor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn finish(
        response: reqwest::Result<reqwest::blocking::Response>,
    ) -> Result<HttpResponse, RemoteError> {
        let response = response.map_err(|err| RemoteError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&mut self, url: &str, timeout: Duration) -> Result<HttpResponse, RemoteError> {
        Self::finish(self.client.get(url).timeout(timeout).send())
    }

    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        timeout: Duration,
    ) -> Result<HttpResponse, RemoteError> {
        Self::finish(
            self.client
                .post(url)
                .timeout(timeout)
                .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
                .body(body.to_vec())
                .send(),
        )
    }
}

/// Stands in for WiFi association: the link is up while the authority's
/// host accepts TCP connections. While associated the last result is reused
/// for `recheck`; after `begin` every poll probes until one succeeds.
pub struct ProbeLink {
    host: String,
    port: u16,
    recheck: Duration,
    associating: bool,
    last_probe: Option<(Instant, bool)>,
}

impl ProbeLink {
    pub fn new(base_url: &str, recheck: Duration) -> anyhow::Result<Self> {
        let url = Url::parse(base_url).with_context(|| format!("invalid base url `{base_url}`"))?;
        let host = url
            .host_str()
            .with_context(|| format!("base url `{base_url}` has no host"))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);
        Ok(Self {
            host,
            port,
            recheck,
            associating: false,
            last_probe: None,
        })
    }

    fn resolve(&self) -> Option<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
    }

    fn probe(&mut self) -> bool {
        let up = self
            .resolve()
            .is_some_and(|addr| TcpStream::connect_timeout(&addr, LINK_PROBE_TIMEOUT).is_ok());
        self.last_probe = Some((Instant::now(), up));
        if up {
            self.associating = false;
        }
        up
    }
}

impl WifiLink for ProbeLink {
    fn begin(&mut self) -> Result<(), HardwareError> {
        info!("probing {}:{}", self.host, self.port);
        self.associating = true;
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        match self.last_probe {
            Some((at, up)) if !self.associating && at.elapsed() < self.recheck => up,
            _ => self.probe(),
        }
    }
}

/// Slow drift through and beyond the default comfort band, with a dropped
/// read now and then.
#[derive(Debug, Default)]
pub struct SimulatedSensor {
    tick: u32,
}

impl SimulatedSensor {
    const DROPOUT_EVERY: u32 = 17;

    fn dropped(&self) -> bool {
        self.tick % Self::DROPOUT_EVERY == 0
    }
}

impl ClimateSensor for SimulatedSensor {
    fn read_temperature(&mut self) -> Option<f32> {
        self.tick = self.tick.wrapping_add(1);
        if self.dropped() {
            return None;
        }
        Some(22.0 + 7.0 * (self.tick as f32 / 12.0).sin())
    }

    fn read_humidity(&mut self) -> Option<f32> {
        if self.dropped() {
            return None;
        }
        Some(50.0 + 25.0 * (self.tick as f32 / 9.0).sin())
    }
}

#[derive(Debug, Default)]
pub struct LogIndicator {
    on: bool,
}

impl Indicator for LogIndicator {
    fn set(&mut self, on: bool) -> Result<(), HardwareError> {
        if on != self.on {
            info!("alarm LED {}", if on { "ON" } else { "OFF" });
        }
        self.on = on;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct LogActuator {
    angle: Option<u8>,
}

impl Actuator for LogActuator {
    fn write_angle(&mut self, degrees: u8) -> Result<(), HardwareError> {
        if self.angle != Some(degrees) {
            info!("servo -> {degrees}°");
        }
        self.angle = Some(degrees);
        Ok(())
    }
}
