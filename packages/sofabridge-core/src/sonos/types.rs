//! Domain types for players, zones and the commands sent to them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Stable device identifier (`RINCON_xxx`). Survives reboots and is never
/// reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Human-assigned room label. The only identifier the HTTP surface accepts.
pub type RoomName = String;

/// Everything needed to address one physical player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHandle {
    pub id: PlayerId,
    pub room_name: RoomName,
    pub ip: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Playback State
// ─────────────────────────────────────────────────────────────────────────────

/// Transport state as reported by `GetTransportInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackState {
    Playing,
    PausedPlayback,
    Stopped,
    Transitioning,
    #[default]
    Unknown,
}

impl PlaybackState {
    /// Maps a UPnP `CurrentTransportState` value. Anything unrecognised is
    /// `Unknown`.
    pub fn from_transport_state(state: &str) -> Self {
        match state.trim() {
            "PLAYING" => Self::Playing,
            "PAUSED_PLAYBACK" => Self::PausedPlayback,
            "STOPPED" => Self::Stopped,
            "TRANSITIONING" => Self::Transitioning,
            _ => Self::Unknown,
        }
    }

    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshots
// ─────────────────────────────────────────────────────────────────────────────

/// One player as observed at snapshot time.
///
/// State fields are `None` when the device did not answer the read; they
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub room_name: RoomName,
    pub ip: String,
    pub volume: Option<u8>,
    pub muted: Option<bool>,
    pub playback_state: Option<PlaybackState>,
    /// Equal to `id` iff this player is a coordinator.
    pub coordinator_id: PlayerId,
}

impl PlayerSnapshot {
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            id: self.id.clone(),
            room_name: self.room_name.clone(),
            ip: self.ip.clone(),
        }
    }
}

/// A coordinator and the players following it.
///
/// `members` lists every player of the zone, the coordinator included, in the
/// order the device reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSnapshot {
    pub id: String,
    pub coordinator: PlayerSnapshot,
    pub members: Vec<PlayerSnapshot>,
    /// `None` when the coordinator did not answer the read, as below.
    pub group_volume: Option<u8>,
    pub group_muted: Option<bool>,
    /// Current track number in the coordinator's queue.
    pub track_no: Option<u32>,
}

impl ZoneSnapshot {
    pub fn contains_room(&self, room: &str) -> bool {
        self.members.iter().any(|m| m.room_name == room)
    }

    /// Distinct room names, coordinator first.
    pub fn room_names(&self) -> Vec<&str> {
        let mut names = vec![self.coordinator.room_name.as_str()];
        for member in &self.members {
            if !names.contains(&member.room_name.as_str()) {
                names.push(&member.room_name);
            }
        }
        names
    }
}

/// Every zone in the household at one instant. Read fresh for each
/// operation and dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneTopologySnapshot {
    pub zones: Vec<ZoneSnapshot>,
}

impl ZoneTopologySnapshot {
    pub fn new(zones: Vec<ZoneSnapshot>) -> Self {
        Self { zones }
    }

    /// Zone whose coordinator sits in `room`.
    pub fn zone_led_by(&self, room: &str) -> Option<&ZoneSnapshot> {
        self.zones
            .iter()
            .find(|z| z.coordinator.room_name == room)
    }

    /// Zone that `room` belongs to, as coordinator or member.
    pub fn zone_of(&self, room: &str) -> Option<&ZoneSnapshot> {
        self.zones.iter().find(|z| z.contains_room(room))
    }

    /// Player in `room`. For bonded rooms (stereo pairs, home theater) the
    /// zone's coordinator is preferred, then the first listed player.
    pub fn player(&self, room: &str) -> Option<&PlayerSnapshot> {
        let zone = self.zone_of(room)?;
        if zone.coordinator.room_name == room {
            return Some(&zone.coordinator);
        }
        zone.members.iter().find(|m| m.room_name == room)
    }

    /// All room names, zone by zone.
    pub fn room_names(&self) -> Vec<RoomName> {
        let mut names: Vec<RoomName> = Vec::new();
        for zone in &self.zones {
            for name in zone.room_names() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// First coordinator in the snapshot, for household-wide reads.
    pub fn any_player(&self) -> Option<&PlayerSnapshot> {
        self.zones.first().map(|z| &z.coordinator)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Desired Grouping
// ─────────────────────────────────────────────────────────────────────────────

/// Target grouping for one reconciliation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredGrouping {
    pub coordinator_room: RoomName,
    pub member_rooms: Vec<RoomName>,
}

impl DesiredGrouping {
    /// Builds a grouping, dropping duplicate member rooms while keeping the
    /// caller's order.
    pub fn new<I, S>(coordinator_room: impl Into<String>, member_rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rooms: Vec<RoomName> = Vec::new();
        for room in member_rooms {
            let room = room.into();
            if !rooms.contains(&room) {
                rooms.push(room);
            }
        }
        Self {
            coordinator_room: coordinator_room.into(),
            member_rooms: rooms,
        }
    }

    /// A grouping of one room or none is not a group.
    pub fn is_applicable(&self) -> bool {
        self.member_rooms.len() > 1
    }

    pub fn contains(&self, room: &str) -> bool {
        self.member_rooms.iter().any(|r| r == room)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// UPnP play modes accepted by `SetPlayMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    Normal,
    RepeatAll,
    RepeatOne,
    ShuffleNoRepeat,
    ShuffleRepeatOne,
}

impl PlayMode {
    pub fn as_upnp(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::RepeatAll => "REPEAT_ALL",
            Self::RepeatOne => "REPEAT_ONE",
            Self::ShuffleNoRepeat => "SHUFFLE_NOREPEAT",
            Self::ShuffleRepeatOne => "SHUFFLE_REPEAT_ONE",
        }
    }
}

/// A logical command against one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Next,
    Previous,
    Mute,
    Unmute,
    /// Player volume. Values outside 0..=100 are clamped by the gateway.
    SetVolume(i32),
    /// Group volume, sent to a coordinator. Clamped like `SetVolume`.
    SetGroupVolume(i32),
    SetGroupMute(bool),
    /// Follow the given coordinator.
    Join(PlayerId),
    /// Leave the current group and become a standalone coordinator.
    Leave,
    SetAvTransport {
        uri: String,
        metadata: Option<String>,
    },
    AddToQueue {
        uri: String,
        metadata: Option<String>,
        /// 1-based queue position; `None` appends.
        position: Option<u32>,
        as_next: bool,
    },
    ClearQueue,
    SeekTrack(u32),
    SeekTime(u32),
    /// Sleep timer in seconds; `None` cancels it.
    Sleep(Option<u32>),
    SetPlayMode(PlayMode),
    SetCrossfade(bool),
    SetBass(i8),
    SetTreble(i8),
    SetLoudness(bool),
    RefreshShareIndex,
}

impl Command {
    /// Short name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Pause => "Pause",
            Self::Next => "Next",
            Self::Previous => "Previous",
            Self::Mute => "Mute",
            Self::Unmute => "Unmute",
            Self::SetVolume(_) => "SetVolume",
            Self::SetGroupVolume(_) => "SetGroupVolume",
            Self::SetGroupMute(_) => "SetGroupMute",
            Self::Join(_) => "Join",
            Self::Leave => "Leave",
            Self::SetAvTransport { .. } => "SetAvTransport",
            Self::AddToQueue { .. } => "AddToQueue",
            Self::ClearQueue => "ClearQueue",
            Self::SeekTrack(_) => "SeekTrack",
            Self::SeekTime(_) => "SeekTime",
            Self::Sleep(_) => "Sleep",
            Self::SetPlayMode(_) => "SetPlayMode",
            Self::SetCrossfade(_) => "SetCrossfade",
            Self::SetBass(_) => "SetBass",
            Self::SetTreble(_) => "SetTreble",
            Self::SetLoudness(_) => "SetLoudness",
            Self::RefreshShareIndex => "RefreshShareIndex",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw Topology
// ─────────────────────────────────────────────────────────────────────────────

/// A zone group as parsed from `ZoneGroupState`, before any state reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneGroup {
    pub id: String,
    pub coordinator_uuid: String,
    pub coordinator_ip: String,
    pub members: Vec<ZoneGroupMember>,
}

impl ZoneGroup {
    pub fn coordinator(&self) -> Option<&ZoneGroupMember> {
        self.members.iter().find(|m| m.uuid == self.coordinator_uuid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneGroupMember {
    pub uuid: String,
    pub ip: String,
    pub zone_name: String,
}

impl ZoneGroupMember {
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            id: PlayerId::new(self.uuid.clone()),
            room_name: self.zone_name.clone(),
            ip: self.ip.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Content Directory
// ─────────────────────────────────────────────────────────────────────────────

/// ContentDirectory containers the service browses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseContainer {
    Favorites,
    Playlists,
    Queue,
}

impl BrowseContainer {
    pub fn object_id(self) -> &'static str {
        match self {
            Self::Favorites => "FV:2",
            Self::Playlists => "SQ:",
            Self::Queue => "Q:0",
        }
    }
}

/// One entry of a browsed container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub title: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_art_uri: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Error returned when a user-supplied keyword is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKeyword(pub String);

impl fmt::Display for UnknownKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

/// Play-mode keywords of the HTTP surface. `crossfade` is not a UPnP play
/// mode; it toggles crossfade on instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayModeRequest {
    Mode(PlayMode),
    Crossfade,
}

impl FromStr for PlayModeRequest {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.to_ascii_lowercase().as_str() {
            "normal" => PlayMode::Normal,
            "repeat_all" => PlayMode::RepeatAll,
            "repeat_one" => PlayMode::RepeatOne,
            "shuffle" | "shuffle_norepeat" => PlayMode::ShuffleNoRepeat,
            "shuffle_repeat_one" => PlayMode::ShuffleRepeatOne,
            "crossfade" => return Ok(Self::Crossfade),
            _ => return Err(UnknownKeyword(s.to_string())),
        };
        Ok(Self::Mode(mode))
    }
}
