//! Recording test doubles for the port traits.

use std::{cell::Cell, collections::VecDeque, rc::Rc, time::Duration};

use crate::{
    error::{HardwareError, RemoteError},
    ports::{Actuator, ClimateSensor, Clock, HttpResponse, HttpTransport, Indicator, WifiLink},
};

/// Manual clock; clones share the same counter so a transport can simulate
/// blocking I/O by advancing it.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<u64>>,
    pub sleeps: Vec<u64>,
}

impl MockClock {
    pub fn at(now_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
            sleeps: Vec::new(),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.sleeps.push(ms);
        self.advance(ms);
    }
}

#[derive(Debug, Default)]
pub struct MockSensor {
    pub readings: VecDeque<(Option<f32>, Option<f32>)>,
    pub fallback: (Option<f32>, Option<f32>),
    current: Option<(Option<f32>, Option<f32>)>,
    pub reads: u32,
}

impl MockSensor {
    pub fn steady(temperature: f32, humidity: f32) -> Self {
        Self {
            fallback: (Some(temperature), Some(humidity)),
            ..Self::default()
        }
    }

    pub fn push(&mut self, temperature: Option<f32>, humidity: Option<f32>) {
        self.readings.push_back((temperature, humidity));
    }
}

impl ClimateSensor for MockSensor {
    fn read_temperature(&mut self) -> Option<f32> {
        self.reads += 1;
        let reading = self.readings.pop_front().unwrap_or(self.fallback);
        self.current = Some(reading);
        reading.0
    }

    fn read_humidity(&mut self) -> Option<f32> {
        self.current.take().unwrap_or(self.fallback).1
    }
}

#[derive(Debug, Default)]
pub struct MockIndicator {
    pub history: Vec<bool>,
    pub fail: bool,
}

impl MockIndicator {
    pub fn is_on(&self) -> bool {
        self.history.last().copied().unwrap_or(false)
    }
}

impl Indicator for MockIndicator {
    fn set(&mut self, on: bool) -> Result<(), HardwareError> {
        if self.fail {
            return Err(HardwareError::Indicator("gpio stuck".into()));
        }
        self.history.push(on);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockActuator {
    pub angles: Vec<u8>,
    pub fail: bool,
}

impl Actuator for MockActuator {
    fn write_angle(&mut self, degrees: u8) -> Result<(), HardwareError> {
        if self.fail {
            return Err(HardwareError::Actuator("pwm unavailable".into()));
        }
        self.angles.push(degrees);
        Ok(())
    }
}

/// Link that comes up after `polls_until_up` status polls following `begin`.
#[derive(Debug, Default)]
pub struct MockLink {
    pub associated: bool,
    pub polls_until_up: Option<u32>,
    pub begins: u32,
    pub polls: u32,
    pending: Option<u32>,
}

impl MockLink {
    pub fn up() -> Self {
        Self {
            associated: true,
            ..Self::default()
        }
    }

    pub fn down() -> Self {
        Self::default()
    }

    pub fn up_after(polls: u32) -> Self {
        Self {
            polls_until_up: Some(polls),
            ..Self::default()
        }
    }
}

impl WifiLink for MockLink {
    fn begin(&mut self) -> Result<(), HardwareError> {
        self.begins += 1;
        self.pending = self.polls_until_up;
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        self.polls += 1;
        if let Some(remaining) = self.pending.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.associated = true;
                self.pending = None;
            }
        }
        self.associated
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

pub type Reply = Result<HttpResponse, RemoteError>;

#[derive(Debug, Default)]
pub struct MockTransport {
    pub get_replies: VecDeque<Reply>,
    pub post_replies: VecDeque<Reply>,
    pub requests: Vec<RecordedRequest>,
    pub clock: Option<MockClock>,
    pub latency_ms: u64,
}

impl MockTransport {
    pub fn ok(body: &str) -> Reply {
        Ok(HttpResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn status(status: u16) -> Reply {
        Ok(HttpResponse {
            status,
            body: br#"{"detail":"error"}"#.to_vec(),
        })
    }

    pub fn posts(&self) -> Vec<&RecordedRequest> {
        self.requests.iter().filter(|r| r.method == "POST").collect()
    }

    pub fn gets(&self) -> Vec<&RecordedRequest> {
        self.requests.iter().filter(|r| r.method == "GET").collect()
    }

    fn block(&self) {
        if let Some(clock) = &self.clock {
            clock.advance(self.latency_ms);
        }
    }
}

impl HttpTransport for MockTransport {
    fn get(&mut self, url: &str, timeout: Duration) -> Result<HttpResponse, RemoteError> {
        self.requests.push(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            body: Vec::new(),
            timeout,
        });
        self.block();
        self.get_replies
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Transport("no reply queued".into())))
    }

    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        timeout: Duration,
    ) -> Result<HttpResponse, RemoteError> {
        self.requests.push(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            body: body.to_vec(),
            timeout,
        });
        self.block();
        self.post_replies
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Transport("no reply queued".into())))
    }
}
