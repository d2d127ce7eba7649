//! Sonos speaker discovery.
//!
//! Discovery only has to find a first speaker: once one answers, the zone
//! topology it reports names every other player. SSDP multicast is enough for
//! that.

mod ssdp;

use std::time::Duration;

use thiserror::Error;

pub use ssdp::discover_speakers;

/// Errors that can occur during discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Failed to create or bind the UDP socket.
    #[error("failed to bind UDP socket: {0}")]
    SocketBind(#[source] std::io::Error),

    /// Failed to send the SSDP M-SEARCH.
    #[error("failed to send SSDP search: {0}")]
    SendSearch(#[source] std::io::Error),
}

/// Convenient Result alias for speaker discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Configuration for SSDP discovery.
#[derive(Debug, Clone)]
pub struct SsdpConfig {
    /// Number of M-SEARCH packets to send.
    pub send_count: u32,
    /// Delay between M-SEARCH packets.
    pub retry_delay: Duration,
    /// Total time to listen for responses.
    pub discovery_timeout: Duration,
    /// MX value (max response delay in seconds).
    pub mx_value: u64,
}

impl Default for SsdpConfig {
    fn default() -> Self {
        Self {
            send_count: 3,
            retry_delay: Duration::from_millis(800),
            discovery_timeout: Duration::from_secs(3),
            mx_value: 1,
        }
    }
}

impl SsdpConfig {
    /// Default settings with a custom listening window.
    pub fn with_timeout(discovery_timeout: Duration) -> Self {
        Self {
            discovery_timeout,
            ..Self::default()
        }
    }
}
