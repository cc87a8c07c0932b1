use log::{info, warn};

use crate::{
    error::NodeError,
    ports::{Clock, WifiLink},
    types::ConnectionState,
};

/// Owns the network link and is the only writer of [`ConnectionState`].
pub struct ConnectivityManager<L> {
    link: L,
    attempts: u32,
    delay_ms: u64,
}

impl<L: WifiLink> ConnectivityManager<L> {
    pub fn new(link: L, attempts: u32, delay_ms: u64) -> Self {
        Self {
            link,
            attempts,
            delay_ms,
        }
    }

    /// Re-reads association from the link into `state`.
    pub fn status(&mut self, state: &mut ConnectionState) -> ConnectionState {
        let observed = if self.link.is_associated() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };

        if *state != observed {
            info!("connection {} -> {}", state.as_str(), observed.as_str());
        }
        *state = observed;
        observed
    }

    /// Starts association and polls it up to the configured number of
    /// attempts, a fixed delay apart. Returns once connected or exhausted.
    pub fn reconnect<C: Clock>(
        &mut self,
        state: &mut ConnectionState,
        clock: &mut C,
    ) -> Result<(), NodeError> {
        *state = ConnectionState::Connecting;
        info!("connecting to network ({} attempts max)", self.attempts);

        if let Err(err) = self.link.begin() {
            warn!("failed to start association: {err}");
        }

        for attempt in 1..=self.attempts {
            clock.sleep_ms(self.delay_ms);
            if self.link.is_associated() {
                info!("network connected after {attempt} attempt(s)");
                *state = ConnectionState::Connected;
                return Ok(());
            }
        }

        *state = ConnectionState::Disconnected;
        Err(NodeError::ReconnectExhausted {
            attempts: self.attempts,
        })
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClock, MockLink};

    #[test]
    fn status_tracks_link() {
        let mut manager = ConnectivityManager::new(MockLink::up(), 20, 500);
        let mut state = ConnectionState::Disconnected;

        assert_eq!(manager.status(&mut state), ConnectionState::Connected);
        assert_eq!(state, ConnectionState::Connected);
    }

    #[test]
    fn reconnect_gives_up_after_bounded_attempts() {
        let mut manager = ConnectivityManager::new(MockLink::down(), 20, 500);
        let mut clock = MockClock::at(0);
        let mut state = ConnectionState::Disconnected;

        let result = manager.reconnect(&mut state, &mut clock);

        assert!(matches!(
            result,
            Err(NodeError::ReconnectExhausted { attempts: 20 })
        ));
        assert_eq!(state, ConnectionState::Disconnected);
        assert_eq!(manager.link().begins, 1);
        assert_eq!(manager.link().polls, 20);
        assert_eq!(clock.sleeps, vec![500; 20]);
        assert_eq!(clock.now_ms(), 10_000);
    }

    #[test]
    fn reconnect_stops_polling_once_associated() {
        let mut manager = ConnectivityManager::new(MockLink::up_after(3), 20, 500);
        let mut clock = MockClock::at(0);
        let mut state = ConnectionState::Disconnected;

        manager.reconnect(&mut state, &mut clock).unwrap();

        assert_eq!(state, ConnectionState::Connected);
        assert_eq!(manager.link().polls, 3);
        assert_eq!(clock.sleeps, vec![500; 3]);
    }

    #[test]
    fn repeated_reconnects_do_not_back_off() {
        let mut manager = ConnectivityManager::new(MockLink::down(), 4, 500);
        let mut clock = MockClock::at(0);
        let mut state = ConnectionState::Disconnected;

        let _ = manager.reconnect(&mut state, &mut clock);
        let _ = manager.reconnect(&mut state, &mut clock);

        assert_eq!(clock.sleeps, vec![500; 8]);
        assert_eq!(manager.link().begins, 2);
    }
}
