//! Operating bounds and their synchronization from the remote authority.

use std::time::Duration;

use log::{debug, info, warn};

use crate::{
    endpoints::thresholds_url,
    error::{NodeError, RemoteError},
    ports::HttpTransport,
    protocol::decode_thresholds,
    types::{ConnectionState, ThresholdSet},
};

/// Holds the current bounds. Accepts whatever it is given; validation is the
/// syncer's job.
#[derive(Debug, Clone, Default)]
pub struct ThresholdStore {
    current: ThresholdSet,
}

impl ThresholdStore {
    pub fn new(initial: ThresholdSet) -> Self {
        Self { current: initial }
    }

    pub fn get(&self) -> ThresholdSet {
        self.current
    }

    pub fn set(&mut self, thresholds: ThresholdSet) {
        self.current = thresholds;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// Not connected; nothing attempted.
    Skipped,
    Applied(ThresholdSet),
    /// Fetch failed or was rejected; prior bounds kept.
    Kept,
}

pub struct ThresholdSync {
    url: String,
    timeout: Duration,
}

impl ThresholdSync {
    pub fn new(base_url: &str, room_id: u32, timeout: Duration) -> Self {
        Self {
            url: thresholds_url(base_url, room_id),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sync<T: HttpTransport>(
        &self,
        transport: &mut T,
        connection: ConnectionState,
        store: &mut ThresholdStore,
    ) -> SyncOutcome {
        match self.fetch(transport, connection, store.get()) {
            Ok(updated) => {
                if updated != store.get() {
                    info!(
                        "thresholds updated: temperature {:.1}..{:.1}, humidity {:.1}..{:.1}",
                        updated.temp_min,
                        updated.temp_max,
                        updated.humidity_min,
                        updated.humidity_max
                    );
                }
                store.set(updated);
                SyncOutcome::Applied(updated)
            }
            Err(NodeError::NetworkUnavailable) => {
                debug!("threshold sync skipped: not connected");
                SyncOutcome::Skipped
            }
            Err(err) => {
                warn!("threshold sync failed, keeping current bounds: {err}");
                SyncOutcome::Kept
            }
        }
    }

    fn fetch<T: HttpTransport>(
        &self,
        transport: &mut T,
        connection: ConnectionState,
        current: ThresholdSet,
    ) -> Result<ThresholdSet, NodeError> {
        if !connection.is_connected() {
            return Err(NodeError::NetworkUnavailable);
        }

        let response = transport.get(&self.url, self.timeout)?;
        if !response.is_ok() {
            return Err(RemoteError::Status(response.status).into());
        }

        let merged = decode_thresholds(&response.body)?.merge_into(current);
        if !merged.is_ordered() {
            return Err(RemoteError::InvalidThresholds {
                temp_min: merged.temp_min,
                temp_max: merged.temp_max,
                humidity_min: merged.humidity_min,
                humidity_max: merged.humidity_max,
            }
            .into());
        }

        Ok(merged)
    }
}
