//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the Sonos UPnP implementation and the music
//! services it fronts; changing them breaks interoperability with the speakers.

// ─────────────────────────────────────────────────────────────────────────────
// HTTP/SOAP
// ─────────────────────────────────────────────────────────────────────────────

/// Port every Sonos speaker serves its UPnP control endpoints on.
pub const SONOS_PORT: u16 = 1400;

/// Timeout for SOAP HTTP requests (seconds).
///
/// 10 seconds is reasonable for LAN operations.
pub const SOAP_TIMEOUT_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// SSDP
// ─────────────────────────────────────────────────────────────────────────────

/// SSDP multicast group.
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250";

/// SSDP port.
pub const SSDP_PORT: u16 = 1900;

/// Search target answered by every Sonos player.
pub const SONOS_SEARCH_TARGET: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

/// Multicast TTL for M-SEARCH packets.
pub const SSDP_MULTICAST_TTL: u32 = 4;

// ─────────────────────────────────────────────────────────────────────────────
// URI schemes
// ─────────────────────────────────────────────────────────────────────────────

/// Prefix of the transport URI that makes a player follow a coordinator.
pub const RINCON_GROUP_PREFIX: &str = "x-rincon:";

/// Prefix of the transport URI that plays another player's line-in.
pub const RINCON_STREAM_PREFIX: &str = "x-rincon-stream:";

/// Prefix of the transport URI that plays a player's own queue.
pub const RINCON_QUEUE_PREFIX: &str = "x-rincon-queue:";

/// Prefix Sonos uses for container favorites (albums, playlists) that must be
/// enqueued rather than set as the transport URI.
pub const CONTAINER_URI_PREFIX: &str = "x-rincon-cpcontainer:";

/// Prefix of saved Sonos playlists.
pub const SAVED_QUEUE_URI_PREFIX: &str = "file:///jffs/settings/savedqueues.rsq";

// ─────────────────────────────────────────────────────────────────────────────
// TuneIn
// ─────────────────────────────────────────────────────────────────────────────

/// Sonos service id of TuneIn radio.
pub const TUNEIN_SERVICE_ID: u32 = 254;

/// Metadata descriptor of the TuneIn service.
pub const TUNEIN_DESCRIPTOR: &str = "SA_RINCON65031_";

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Service identifier reported by the health endpoint.
pub const SERVICE_ID: &str = "sofabridge";

/// Application name used in log lines and the health endpoint.
pub const APP_NAME: &str = "SofaBridge";

/// Fixed volume applied to every room of a freshly reconciled group.
pub const BASELINE_GROUP_VOLUME: i32 = 10;

/// Default number of queue entries returned by queue browsing.
pub const DEFAULT_QUEUE_LIMIT: u32 = 500;
