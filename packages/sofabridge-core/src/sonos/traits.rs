//! Trait abstractions for Sonos operations.
//!
//! Services depend on these traits rather than on the SOAP client, so the
//! reconciler and controllers can be driven by in-memory doubles in tests.
//!
//! Two layers live here:
//! - collaborator seams used by the services (`PlayerDirectory`,
//!   `CommandGateway`, `MediaLibrary`)
//! - low-level speaker reads used by the concrete directory (`SonosTopology`,
//!   `SonosStatus`, `SonosDiscovery`)

use async_trait::async_trait;

use crate::error::{DiscoveryResult, SoapResult, ZoneError, ZoneResult};
use crate::sonos::types::{
    BrowseContainer, Command, LibraryItem, PlaybackState, PlayerHandle, ZoneGroup,
    ZoneTopologySnapshot,
};

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator Seams
// ─────────────────────────────────────────────────────────────────────────────

/// Source of live topology and room resolution.
///
/// Nothing here is cached between calls; each call reflects the household as
/// it is now.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Reads every zone with per-player and per-zone state.
    ///
    /// Fails with `DirectoryUnavailable` when no speaker can be reached.
    async fn list_zones(&self) -> ZoneResult<ZoneTopologySnapshot>;

    /// Resolves a room to a player handle, or `NotFound`.
    async fn resolve(&self, room: &str) -> ZoneResult<PlayerHandle> {
        let snapshot = self.list_zones().await?;
        snapshot
            .player(room)
            .map(|p| p.handle())
            .ok_or_else(|| ZoneError::NotFound(room.to_string()))
    }

    /// Resolves a room to the coordinator of the zone it belongs to.
    async fn resolve_coordinator(&self, room: &str) -> ZoneResult<PlayerHandle> {
        let snapshot = self.list_zones().await?;
        snapshot
            .zone_of(room)
            .map(|z| z.coordinator.handle())
            .ok_or_else(|| ZoneError::NotFound(room.to_string()))
    }

    /// Any reachable player, for household-wide operations such as browsing
    /// favorites.
    async fn any_player(&self) -> ZoneResult<PlayerHandle> {
        let snapshot = self.list_zones().await?;
        snapshot
            .any_player()
            .map(|p| p.handle())
            .ok_or_else(|| ZoneError::DirectoryUnavailable("no players in topology".into()))
    }
}

/// Executes one logical command against one physical player.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Sends `command` to `player`. Never retries.
    async fn send(&self, player: &PlayerHandle, command: Command) -> SoapResult<()>;
}

/// Read access to the ContentDirectory of a player.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Lists up to `limit` items of a container.
    async fn browse(
        &self,
        player: &PlayerHandle,
        container: BrowseContainer,
        limit: u32,
    ) -> SoapResult<Vec<LibraryItem>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Speaker Reads
// ─────────────────────────────────────────────────────────────────────────────

/// Zone group topology.
#[async_trait]
pub trait SonosTopology: Send + Sync {
    /// Fetches the current zone groups from any speaker on the network.
    async fn get_zone_groups(&self, ip: &str) -> SoapResult<Vec<ZoneGroup>>;
}

/// Per-player and per-group state reads.
#[async_trait]
pub trait SonosStatus: Send + Sync {
    async fn get_transport_state(&self, ip: &str) -> SoapResult<PlaybackState>;

    async fn get_volume(&self, ip: &str) -> SoapResult<u8>;

    async fn get_mute(&self, ip: &str) -> SoapResult<bool>;

    /// Group volume, read from the coordinator.
    async fn get_group_volume(&self, coordinator_ip: &str) -> SoapResult<u8>;

    async fn get_group_mute(&self, coordinator_ip: &str) -> SoapResult<bool>;

    /// Current track number of the coordinator's queue.
    async fn get_track_number(&self, coordinator_ip: &str) -> SoapResult<u32>;
}

/// Network discovery.
#[async_trait]
pub trait SonosDiscovery: Send + Sync {
    /// Returns the IP addresses of Sonos speakers answering SSDP.
    async fn discover_speakers(&self) -> DiscoveryResult<Vec<String>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Combined Traits (for trait objects)
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the concrete directory needs from a speaker client.
pub trait SonosDirectoryClient: SonosTopology + SonosStatus + SonosDiscovery {}

impl<T: SonosTopology + SonosStatus + SonosDiscovery> SonosDirectoryClient for T {}

/// The full client: reads, commands and library access.
pub trait SonosClient: SonosDirectoryClient + CommandGateway + MediaLibrary {}

impl<T: SonosDirectoryClient + CommandGateway + MediaLibrary> SonosClient for T {}
