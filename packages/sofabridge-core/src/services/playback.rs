//! Playback and volume control for single rooms and zones.
//!
//! Every operation resolves the room through the directory first, so an
//! unknown room is always `NotFound` and never reaches a device. Transport
//! commands go to the zone's coordinator; player volume, mute and
//! equalizer go to the room's own player.
//!
//! Read-then-act operations (`playpause`, relative volume, `toggle_mute`) act
//! on the state observed in one fresh snapshot. Another controller changing
//! the player in between is not detected.

use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::{ZoneError, ZoneResult};
use crate::protocol_constants::RINCON_STREAM_PREFIX;
use crate::sonos::traits::{CommandGateway, PlayerDirectory};
use crate::sonos::types::{
    Command, PlayModeRequest, PlayerHandle, PlayerSnapshot, RoomName, ZoneSnapshot,
    ZoneTopologySnapshot,
};

/// Transport keywords of `player_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Play,
    Pause,
    PlayPause,
}

impl FromStr for PlayerAction {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "playpause" => Ok(Self::PlayPause),
            _ => Err(ZoneError::InvalidRequest(format!("unknown action '{}'", s))),
        }
    }
}

/// How `zone_action` interprets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeMode {
    Absolute,
    /// Signed delta added to the current group volume.
    Relative,
}

/// Optional equalizer settings, applied bass, treble, loudness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EqualizerSettings {
    pub bass: Option<i8>,
    pub treble: Option<i8>,
    pub loudness: Option<bool>,
}

impl EqualizerSettings {
    pub fn is_empty(&self) -> bool {
        self.bass.is_none() && self.treble.is_none() && self.loudness.is_none()
    }
}

/// A room's player as seen in one snapshot, with its zone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub player: PlayerSnapshot,
    pub coordinator: RoomName,
    pub group_volume: Option<u8>,
    pub group_muted: Option<bool>,
    pub track_no: Option<u32>,
}

pub struct PlaybackController {
    directory: Arc<dyn PlayerDirectory>,
    gateway: Arc<dyn CommandGateway>,
}

impl PlaybackController {
    pub fn new(directory: Arc<dyn PlayerDirectory>, gateway: Arc<dyn CommandGateway>) -> Self {
        Self { directory, gateway }
    }

    async fn send(&self, player: &PlayerHandle, command: Command) -> ZoneResult<()> {
        log::debug!("[Playback] {} -> {}", command.name(), player.room_name);
        self.gateway.send(player, command).await.map_err(|e| {
            let err = ZoneError::from(e);
            err.log("Playback");
            err
        })
    }

    async fn send_to_coordinator(&self, room: &str, command: Command) -> ZoneResult<()> {
        let coordinator = self.directory.resolve_coordinator(room).await?;
        self.send(&coordinator, command).await
    }

    async fn send_to_player(&self, room: &str, command: Command) -> ZoneResult<()> {
        let player = self.directory.resolve(room).await?;
        self.send(&player, command).await
    }

    fn zone_of<'a>(snapshot: &'a ZoneTopologySnapshot, room: &str) -> ZoneResult<&'a ZoneSnapshot> {
        snapshot
            .zone_of(room)
            .ok_or_else(|| ZoneError::NotFound(room.to_string()))
    }

    fn player_of<'a>(
        snapshot: &'a ZoneTopologySnapshot,
        room: &str,
    ) -> ZoneResult<&'a PlayerSnapshot> {
        snapshot
            .player(room)
            .ok_or_else(|| ZoneError::NotFound(room.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────────────────

    /// Play, pause or toggle on the room's coordinator.
    ///
    /// Returns `Some(paused)` for `PlayPause`: `true` when the zone was
    /// playing and has been paused.
    pub async fn player_action(&self, room: &str, action: PlayerAction) -> ZoneResult<Option<bool>> {
        match action {
            PlayerAction::Play => self.send_to_coordinator(room, Command::Play).await.map(|_| None),
            PlayerAction::Pause => self.send_to_coordinator(room, Command::Pause).await.map(|_| None),
            PlayerAction::PlayPause => {
                let snapshot = self.directory.list_zones().await?;
                let coordinator = &Self::zone_of(&snapshot, room)?.coordinator;
                let pause = coordinator
                    .playback_state
                    .ok_or_else(|| ZoneError::state_unread("transport state", room))?
                    .is_playing();
                let command = if pause { Command::Pause } else { Command::Play };
                self.send(&coordinator.handle(), command).await?;
                Ok(Some(pause))
            }
        }
    }

    pub async fn next(&self, room: &str) -> ZoneResult<()> {
        self.send_to_coordinator(room, Command::Next).await
    }

    pub async fn previous(&self, room: &str) -> ZoneResult<()> {
        self.send_to_coordinator(room, Command::Previous).await
    }

    /// Pauses every zone whose coordinator is playing. Zones are paused
    /// concurrently and a failure in one does not stop the others; the
    /// number of successfully paused zones is returned.
    pub async fn pause_all(&self) -> ZoneResult<usize> {
        let snapshot = self.directory.list_zones().await?;
        let playing: Vec<PlayerHandle> = snapshot
            .zones
            .iter()
            .filter(|z| z.coordinator.playback_state.is_some_and(|s| s.is_playing()))
            .map(|z| z.coordinator.handle())
            .collect();

        let results = join_all(playing.iter().map(|p| self.send(p, Command::Pause))).await;
        let paused = results.iter().filter(|r| r.is_ok()).count();
        log::info!("[Playback] Paused {} of {} playing zone(s)", paused, playing.len());
        Ok(paused)
    }

    pub async fn seek(&self, room: &str, track: Option<u32>, elapsed_secs: Option<u32>) -> ZoneResult<()> {
        if track.is_none() && elapsed_secs.is_none() {
            return Err(ZoneError::InvalidRequest(
                "seek needs a track number or an elapsed time".into(),
            ));
        }
        let coordinator = self.directory.resolve_coordinator(room).await?;
        if let Some(track) = track {
            self.send(&coordinator, Command::SeekTrack(track)).await?;
        }
        if let Some(secs) = elapsed_secs {
            self.send(&coordinator, Command::SeekTime(secs)).await?;
        }
        Ok(())
    }

    /// Sets the sleep timer from `"off"` or a number of seconds.
    pub async fn sleep(&self, room: &str, value: &str) -> ZoneResult<Option<u32>> {
        let timer = match value.trim() {
            v if v.eq_ignore_ascii_case("off") => None,
            v => Some(v.parse::<u32>().map_err(|_| {
                ZoneError::InvalidRequest(format!("invalid sleep timer '{}'", value))
            })?),
        };
        self.send_to_coordinator(room, Command::Sleep(timer)).await?;
        Ok(timer)
    }

    /// Plays the line-in of `source_room` (default: the room itself) on the
    /// room's zone.
    pub async fn line_in(&self, room: &str, source_room: Option<&str>) -> ZoneResult<()> {
        let coordinator = self.directory.resolve_coordinator(room).await?;
        let source = self.directory.resolve(source_room.unwrap_or(room)).await?;
        let uri = format!("{}{}", RINCON_STREAM_PREFIX, source.id);
        self.send(&coordinator, Command::SetAvTransport { uri, metadata: None })
            .await
    }

    pub async fn play_mode(&self, room: &str, mode: &str) -> ZoneResult<()> {
        let request: PlayModeRequest = mode
            .parse()
            .map_err(|e| ZoneError::InvalidRequest(format!("play mode: {}", e)))?;
        let command = match request {
            PlayModeRequest::Mode(mode) => Command::SetPlayMode(mode),
            PlayModeRequest::Crossfade => Command::SetCrossfade(true),
        };
        self.send_to_coordinator(room, command).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Volume
    // ─────────────────────────────────────────────────────────────────────────

    /// Sets or shifts the group volume of the room's zone. The value is sent
    /// as computed; the gateway clamps it to the device range.
    pub async fn zone_action(&self, room: &str, value: i32, mode: VolumeMode) -> ZoneResult<i32> {
        let (coordinator, target) = match mode {
            VolumeMode::Absolute => (self.directory.resolve_coordinator(room).await?, value),
            VolumeMode::Relative => {
                let snapshot = self.directory.list_zones().await?;
                let zone = Self::zone_of(&snapshot, room)?;
                let current = zone
                    .group_volume
                    .ok_or_else(|| ZoneError::state_unread("group volume", room))?;
                (zone.coordinator.handle(), i32::from(current) + value)
            }
        };
        self.send(&coordinator, Command::SetGroupVolume(target)).await?;
        Ok(target)
    }

    pub async fn group_volume(&self, room: &str) -> ZoneResult<u8> {
        let snapshot = self.directory.list_zones().await?;
        Self::zone_of(&snapshot, room)?
            .group_volume
            .ok_or_else(|| ZoneError::state_unread("group volume", room))
    }

    pub async fn set_group_volume(&self, room: &str, volume: i32) -> ZoneResult<i32> {
        self.zone_action(room, volume, VolumeMode::Absolute).await
    }

    /// Player volume of one room.
    pub async fn set_volume(&self, room: &str, volume: i32) -> ZoneResult<()> {
        self.send_to_player(room, Command::SetVolume(volume)).await
    }

    /// Shifts the player volume of one room by `delta`.
    pub async fn adjust_volume(&self, room: &str, delta: i32) -> ZoneResult<i32> {
        let snapshot = self.directory.list_zones().await?;
        let player = Self::player_of(&snapshot, room)?;
        let current = player
            .volume
            .ok_or_else(|| ZoneError::state_unread("volume", room))?;
        let target = i32::from(current) + delta;
        self.send(&player.handle(), Command::SetVolume(target)).await?;
        Ok(target)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mute
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn mute(&self, room: &str) -> ZoneResult<()> {
        self.send_to_player(room, Command::Mute).await
    }

    pub async fn unmute(&self, room: &str) -> ZoneResult<()> {
        self.send_to_player(room, Command::Unmute).await
    }

    /// Flips the player's mute. Returns the new mute state.
    pub async fn toggle_mute(&self, room: &str) -> ZoneResult<bool> {
        let snapshot = self.directory.list_zones().await?;
        let player = Self::player_of(&snapshot, room)?;
        let muted = player
            .muted
            .ok_or_else(|| ZoneError::state_unread("mute state", room))?;
        let (command, muted) = if muted {
            (Command::Unmute, false)
        } else {
            (Command::Mute, true)
        };
        self.send(&player.handle(), command).await?;
        Ok(muted)
    }

    pub async fn group_mute(&self, room: &str) -> ZoneResult<()> {
        self.send_to_coordinator(room, Command::SetGroupMute(true)).await
    }

    pub async fn group_unmute(&self, room: &str) -> ZoneResult<()> {
        self.send_to_coordinator(room, Command::SetGroupMute(false)).await
    }

    /// Applies equalizer settings to the room's player in order, stopping at
    /// the first failure.
    pub async fn equalizer(&self, room: &str, settings: &EqualizerSettings) -> ZoneResult<()> {
        if settings.is_empty() {
            return Err(ZoneError::InvalidRequest(
                "equalizer needs bass, treble or loudness".into(),
            ));
        }
        let player = self.directory.resolve(room).await?;
        if let Some(bass) = settings.bass {
            self.send(&player, Command::SetBass(bass)).await?;
        }
        if let Some(treble) = settings.treble {
            self.send(&player, Command::SetTreble(treble)).await?;
        }
        if let Some(loudness) = settings.loudness {
            self.send(&player, Command::SetLoudness(loudness)).await?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn zones(&self) -> ZoneResult<ZoneTopologySnapshot> {
        self.directory.list_zones().await
    }

    /// All room names, zone by zone.
    pub async fn players(&self) -> ZoneResult<Vec<RoomName>> {
        Ok(self.directory.list_zones().await?.room_names())
    }

    pub async fn state(&self, room: &str) -> ZoneResult<RoomState> {
        let snapshot = self.directory.list_zones().await?;
        let zone = Self::zone_of(&snapshot, room)?;
        let player = Self::player_of(&snapshot, room)?;
        Ok(RoomState {
            player: player.clone(),
            coordinator: zone.coordinator.room_name.clone(),
            group_volume: zone.group_volume,
            group_muted: zone.group_muted,
            track_no: zone.track_no,
        })
    }
}
