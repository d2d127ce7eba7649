//! Concrete Sonos client over SOAP.
//!
//! `SonosClientImpl` implements every trait in [`super::traits`] by delegating
//! to the per-service command modules. It is the production `CommandGateway`.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{DiscoveryResult, SoapResult};
use crate::sonos::discovery::{self, SsdpConfig};
use crate::sonos::traits::{
    CommandGateway, MediaLibrary, SonosDiscovery, SonosStatus, SonosTopology,
};
use crate::sonos::types::{
    BrowseContainer, Command, LibraryItem, PlaybackState, PlayerHandle, ZoneGroup,
};
use crate::sonos::{content, grouping, playback, volume, zone_groups};

/// SOAP-backed Sonos client.
#[derive(Clone)]
pub struct SonosClientImpl {
    /// HTTP client for Sonos communication.
    client: Client,
    ssdp_config: SsdpConfig,
}

impl std::fmt::Debug for SonosClientImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonosClientImpl")
            .field("client", &"Client")
            .field("ssdp_config", &self.ssdp_config)
            .finish()
    }
}

impl SonosClientImpl {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_ssdp_config(client, SsdpConfig::default())
    }

    #[must_use]
    pub fn with_ssdp_config(client: Client, ssdp_config: SsdpConfig) -> Self {
        Self {
            client,
            ssdp_config,
        }
    }
}

#[async_trait]
impl CommandGateway for SonosClientImpl {
    async fn send(&self, player: &PlayerHandle, command: Command) -> SoapResult<()> {
        let c = &self.client;
        let ip = player.ip.as_str();
        log::debug!(
            "[Sonos] {} -> {} ({})",
            command.name(),
            player.room_name,
            ip
        );

        match command {
            Command::Play => playback::play(c, ip).await,
            Command::Pause => playback::pause(c, ip).await,
            Command::Next => playback::next(c, ip).await,
            Command::Previous => playback::previous(c, ip).await,
            Command::Mute => volume::set_speaker_mute(c, ip, true).await,
            Command::Unmute => volume::set_speaker_mute(c, ip, false).await,
            Command::SetVolume(v) => volume::set_speaker_volume(c, ip, v).await,
            Command::SetGroupVolume(v) => volume::set_group_volume(c, ip, v).await,
            Command::SetGroupMute(m) => volume::set_group_mute(c, ip, m).await,
            Command::Join(coordinator) => {
                grouping::join_group(c, ip, coordinator.as_str()).await
            }
            Command::Leave => grouping::leave_group(c, ip).await,
            Command::SetAvTransport { uri, metadata } => {
                playback::set_av_transport_uri(c, ip, &uri, metadata.as_deref()).await
            }
            Command::AddToQueue {
                uri,
                metadata,
                position,
                as_next,
            } => {
                playback::add_uri_to_queue(
                    c,
                    ip,
                    &uri,
                    metadata.as_deref(),
                    position.unwrap_or(0),
                    as_next,
                )
                .await
            }
            Command::ClearQueue => playback::remove_all_tracks_from_queue(c, ip).await,
            Command::SeekTrack(n) => playback::seek_track(c, ip, n).await,
            Command::SeekTime(s) => playback::seek_time(c, ip, s).await,
            Command::Sleep(s) => playback::configure_sleep_timer(c, ip, s).await,
            Command::SetPlayMode(mode) => playback::set_play_mode(c, ip, mode).await,
            Command::SetCrossfade(on) => playback::set_crossfade(c, ip, on).await,
            Command::SetBass(level) => volume::set_bass(c, ip, level).await,
            Command::SetTreble(level) => volume::set_treble(c, ip, level).await,
            Command::SetLoudness(on) => volume::set_loudness(c, ip, on).await,
            Command::RefreshShareIndex => content::refresh_share_index(c, ip).await,
        }
    }
}

#[async_trait]
impl MediaLibrary for SonosClientImpl {
    async fn browse(
        &self,
        player: &PlayerHandle,
        container: BrowseContainer,
        limit: u32,
    ) -> SoapResult<Vec<LibraryItem>> {
        content::browse(&self.client, &player.ip, container, limit).await
    }
}

#[async_trait]
impl SonosTopology for SonosClientImpl {
    async fn get_zone_groups(&self, ip: &str) -> SoapResult<Vec<ZoneGroup>> {
        zone_groups::get_zone_groups(&self.client, ip).await
    }
}

#[async_trait]
impl SonosStatus for SonosClientImpl {
    async fn get_transport_state(&self, ip: &str) -> SoapResult<PlaybackState> {
        playback::get_transport_state(&self.client, ip).await
    }

    async fn get_volume(&self, ip: &str) -> SoapResult<u8> {
        volume::get_speaker_volume(&self.client, ip).await
    }

    async fn get_mute(&self, ip: &str) -> SoapResult<bool> {
        volume::get_speaker_mute(&self.client, ip).await
    }

    async fn get_group_volume(&self, coordinator_ip: &str) -> SoapResult<u8> {
        volume::get_group_volume(&self.client, coordinator_ip).await
    }

    async fn get_group_mute(&self, coordinator_ip: &str) -> SoapResult<bool> {
        volume::get_group_mute(&self.client, coordinator_ip).await
    }

    async fn get_track_number(&self, coordinator_ip: &str) -> SoapResult<u32> {
        playback::get_track_number(&self.client, coordinator_ip).await
    }
}

#[async_trait]
impl SonosDiscovery for SonosClientImpl {
    async fn discover_speakers(&self) -> DiscoveryResult<Vec<String>> {
        discovery::discover_speakers(&self.ssdp_config).await
    }
}
