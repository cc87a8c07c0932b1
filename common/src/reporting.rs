use std::time::Duration;

use log::{info, warn};

use crate::{
    endpoints::readings_process_url,
    error::RemoteError,
    ports::HttpTransport,
    protocol::{decode_verdict, encode_reading},
    types::{Sample, ServerVerdict},
};

/// Posts readings to the authority and parses its verdict.
pub struct ReportingClient {
    url: String,
    timeout: Duration,
}

impl ReportingClient {
    pub fn new(base_url: &str, sensor_id: u32, timeout: Duration) -> Self {
        Self {
            url: readings_process_url(base_url, sensor_id),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `None` means no verdict this cycle; the failure is logged here.
    pub fn report<T: HttpTransport>(
        &self,
        transport: &mut T,
        sample: &Sample,
    ) -> Option<ServerVerdict> {
        match self.submit(transport, sample) {
            Ok(verdict) => {
                info!(
                    "verdict: success={} anomaly={} commands={} alerts={} reading={:?}",
                    verdict.success,
                    verdict.is_anomaly,
                    verdict.commands_executed,
                    verdict.alerts_created,
                    verdict.reading_id
                );
                Some(verdict)
            }
            Err(err) => {
                warn!("reading report failed: {err}");
                None
            }
        }
    }

    pub fn submit<T: HttpTransport>(
        &self,
        transport: &mut T,
        sample: &Sample,
    ) -> Result<ServerVerdict, RemoteError> {
        let body = encode_reading(sample)?;
        let response = transport.post_json(&self.url, &body, self.timeout)?;
        if !response.is_ok() {
            return Err(RemoteError::Status(response.status));
        }
        decode_verdict(&response.body)
    }
}
